//! FIFO 포지션 원장 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 참조 시나리오 실행
//! ledger demo
//!
//! # 체결 CSV 재생, 115.00으로 미실현 손익 평가
//! ledger replay --fills data/fills.csv --instrument AAPL --mark 115.00
//!
//! # JSON 출력
//! ledger replay --fills data/fills.csv --json
//!
//! # 상품 목록 보기
//! ledger instruments --file data/instruments.csv
//! ```

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ledger_cli::commands::{demo, instruments, replay};
use ledger_core::{init_logging, init_logging_from_env, AppConfig, Price};
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "ledger")]
#[command(about = "FIFO position ledger - 체결 단위 로트 매칭과 손익 계산", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (기본: config/default.toml, 없으면 기본값 사용)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 참조 시나리오 실행
    Demo,

    /// 체결 CSV 파일 재생
    Replay {
        /// 체결 CSV 경로 (side,quantity,price[,timestamp])
        #[arg(short, long)]
        fills: String,

        /// 상품 ID
        #[arg(short, long, default_value = "AAPL")]
        instrument: String,

        /// 미실현 손익 평가 가격
        #[arg(short, long)]
        mark: Option<Price>,

        /// JSON 형식 출력
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// 상품 목록 보기
    Instruments {
        /// 상품 CSV 경로 (기본: 설정의 instruments.path)
        #[arg(short, long)]
        file: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => AppConfig::load(path),
        None => AppConfig::load_default(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            // 설정을 읽지 못해도 오류는 RUST_LOG/LOG_FORMAT 기준으로 기록
            init_logging_from_env()
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    init_logging(config.logging.to_log_config())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    debug!(path = ?cli.config, "Configuration loaded");

    let mut stdout = io::stdout().lock();

    let result = match cli.command {
        Commands::Demo => demo::run_demo(&config, &mut stdout).map(|_| ()),

        Commands::Replay {
            fills,
            instrument,
            mark,
            json,
        } => {
            let replay_config = replay::ReplayConfig {
                fills_path: fills,
                instrument,
                mark,
                json,
            };
            replay::run_replay(&replay_config, &config.ledger, &mut stdout).map(|_| ())
        }

        Commands::Instruments { file } => instruments::run_instruments(
            file.as_deref(),
            &config.instruments.path,
            &mut stdout,
        )
        .map(|_| ()),
    };

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }

    result
}

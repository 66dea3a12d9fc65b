//! 상품 참조 데이터 조회 기능.

use std::io::Write;

use anyhow::{Context, Result};
use ledger_core::{InstrumentRepository, LedgerError};
use tracing::{info, warn};

/// 설정 파일이 없을 때 사용하는 내장 상품 목록.
pub const BUILTIN_INSTRUMENTS: &str = "\
id,symbol,assetClass,currency,tickSize
AAPL,AAPL,Equity,USD,0.01
MSFT,MSFT,Equity,USD,0.01
ESZ5,ES,Future,USD,0.25
";

/// 설정된 경로에서 상품을 로드합니다.
///
/// 파일을 읽을 수 없으면 내장 목록으로 대체합니다. 파일은 있지만 내용이 잘못된
/// 경우에는 에러를 반환합니다.
pub fn load_instruments(path: &str) -> Result<InstrumentRepository> {
    let mut repo = InstrumentRepository::new();

    match repo.load_csv_file(path) {
        Ok(_) => {}
        Err(LedgerError::Io(e)) => {
            warn!(path, error = %e, "Instrument file unavailable, using built-in instruments");
            repo.load_csv_str(BUILTIN_INSTRUMENTS)
                .context("Failed to load built-in instruments")?;
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load instruments from {}", path));
        }
    }

    Ok(repo)
}

/// 상품 파일을 대체 없이 로드합니다 (`--file`로 명시한 경우).
pub fn load_instruments_strict(path: &str) -> Result<InstrumentRepository> {
    let mut repo = InstrumentRepository::new();
    repo.load_csv_file(path)
        .with_context(|| format!("Failed to load instruments from {}", path))?;
    Ok(repo)
}

/// 상품 목록을 표 형식으로 출력합니다.
pub fn print_instruments<W: Write>(repo: &InstrumentRepository, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "{:<10} {:<10} {:<10} {:<8} {:>10}",
        "ID", "SYMBOL", "CLASS", "CCY", "TICK"
    )?;
    writeln!(out, "{}", "-".repeat(52))?;

    for instrument in repo.iter_sorted() {
        writeln!(
            out,
            "{:<10} {:<10} {:<10} {:<8} {:>10}",
            instrument.id,
            instrument.symbol,
            instrument.asset_class,
            instrument.currency,
            instrument.tick_size
        )?;
    }

    writeln!(out, "\n총 {}개 상품", repo.len())?;
    Ok(())
}

/// `instruments` 명령 실행.
pub fn run_instruments<W: Write>(
    file: Option<&str>,
    configured_path: &str,
    out: &mut W,
) -> Result<usize> {
    let repo = match file {
        Some(path) => load_instruments_strict(path)?,
        None => load_instruments(configured_path)?,
    };

    info!(count = repo.len(), "Listing instruments");
    print_instruments(&repo, out)?;
    Ok(repo.len())
}

//! 설정 관리.
//!
//! 이 모듈은 원장 애플리케이션 설정을 정의하고 관리합니다.
//! 기본값 → TOML 파일(선택) → `LEDGER__*` 환경 변수 순서로 덮어씁니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::{DEFAULT_DUST_TOLERANCE, MAX_DUST_TOLERANCE};
use crate::error::{LedgerError, LedgerResult};
use crate::logging::{LogConfig, LogFormat};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 원장 설정
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// 상품 참조 데이터 설정
    #[serde(default)]
    pub instruments: InstrumentsConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 원장 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// 실현/미실현 손익의 회계 통화
    #[serde(default = "default_currency")]
    pub currency: String,
    /// 이 값 이하로 남은 로트는 소진된 것으로 간주
    #[serde(default = "default_dust_tolerance")]
    pub dust_tolerance: Decimal,
}

fn default_currency() -> String {
    "USD".to_string()
}
fn default_dust_tolerance() -> Decimal {
    DEFAULT_DUST_TOLERANCE
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            dust_tolerance: default_dust_tolerance(),
        }
    }
}

impl LedgerConfig {
    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.currency.trim().is_empty() {
            return Err(LedgerError::Config("ledger.currency must not be empty".to_string()));
        }
        if self.dust_tolerance < Decimal::ZERO || self.dust_tolerance > MAX_DUST_TOLERANCE {
            return Err(LedgerError::Config(format!(
                "ledger.dust_tolerance must be within 0..={}, got {}",
                MAX_DUST_TOLERANCE, self.dust_tolerance
            )));
        }
        Ok(())
    }
}

/// 상품 참조 데이터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstrumentsConfig {
    /// 상품 CSV 파일 경로
    #[serde(default = "default_instruments_path")]
    pub path: String,
}

fn default_instruments_path() -> String {
    "data/instruments.csv".to_string()
}

impl Default for InstrumentsConfig {
    fn default() -> Self {
        Self {
            path: default_instruments_path(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 로깅 초기화용 설정으로 변환합니다. 알 수 없는 형식은 pretty로 처리합니다.
    pub fn to_log_config(&self) -> LogConfig {
        let format = self.format.parse().unwrap_or(LogFormat::Pretty);
        LogConfig::new(self.level.clone()).with_format(format)
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다. 파일이 없으면 기본값을 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("LEDGER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.ledger.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> LedgerResult<Self> {
        Self::load("config/default.toml")
    }
}

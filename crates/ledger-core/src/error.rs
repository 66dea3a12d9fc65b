//! 포지션 원장의 에러 타입.
//!
//! 이 모듈은 원장 코어와 참조 데이터/시세 협력 모듈에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 원장 에러.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 0 이하의 체결 수량
    #[error("잘못된 수량: {0}")]
    InvalidQuantity(String),

    /// 유한하지 않은 체결 가격
    #[error("잘못된 가격: {0}")]
    InvalidPrice(String),

    /// 잘못된 형식의 데이터 (CSV 행, 숫자 파싱 등)
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 체결 적용 중 Decimal 범위를 넘는 계산
    #[error("산술 오버플로: {0}")]
    Overflow(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 파일 입출력 에러
    #[error("입출력 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// 원장 작업을 위한 Result 타입.
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// 체결 적용 시점에 로컬로 감지되는 입력 오류인지 확인합니다.
    ///
    /// 입력 오류로 거부된 체결은 원장 상태를 전혀 변경하지 않습니다.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidQuantity(_)
                | LedgerError::InvalidPrice(_)
                | LedgerError::Overflow(_)
        )
    }
}

impl From<config::ConfigError> for LedgerError {
    fn from(err: config::ConfigError) -> Self {
        LedgerError::Config(err.to_string())
    }
}

impl From<rust_decimal::Error> for LedgerError {
    fn from(err: rust_decimal::Error) -> Self {
        LedgerError::Data(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        let qty_err = LedgerError::InvalidQuantity("0".to_string());
        assert!(qty_err.is_input_error());

        let px_err = LedgerError::InvalidPrice("NaN".to_string());
        assert!(px_err.is_input_error());

        let overflow = LedgerError::Overflow("1e28 * 10".to_string());
        assert!(overflow.is_input_error());

        let data_err = LedgerError::Data("bad row".to_string());
        assert!(!data_err.is_input_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LedgerError = io.into();
        assert!(matches!(err, LedgerError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }
}

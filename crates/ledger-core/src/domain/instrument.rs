//! 상품 참조 데이터.
//!
//! 이 모듈은 상품 메타데이터와 CSV 텍스트에서 로드되는 조회 테이블을 정의합니다:
//! - `Instrument` - 상품 (주식, 선물, 외환, 암호화폐 등)
//! - `InstrumentRepository` - 상품 ID 기준 조회 테이블
//!
//! 원장은 상품을 불투명한 식별자 문자열로만 사용합니다.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::tabular;
use crate::types::Price;

/// CSV 헤더에 필요한 최소 컬럼: `id,symbol,assetClass,currency,tickSize`.
const INSTRUMENT_COLUMNS: usize = 5;

/// 호가 단위 라운딩 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundMethod {
    /// 일반 반올림 (기본)
    #[default]
    Round,
    /// 내림
    Floor,
    /// 올림
    Ceil,
}

/// 금융 상품.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// 상품 ID (예: AAPL)
    pub id: String,
    /// 표시용 심볼
    pub symbol: String,
    /// 자산군 (Equity, Futures 등)
    pub asset_class: String,
    /// 거래 통화
    pub currency: String,
    /// 최소 가격 단위
    pub tick_size: Decimal,
}

impl Instrument {
    /// 기본 호가 단위(0.01)로 새 상품을 생성합니다.
    pub fn new(
        id: impl Into<String>,
        asset_class: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            symbol: id.clone(),
            id,
            asset_class: asset_class.into(),
            currency: currency.into(),
            tick_size: dec!(0.01),
        }
    }

    /// 호가 단위를 설정합니다.
    pub fn with_tick_size(mut self, tick_size: Decimal) -> Self {
        self.tick_size = tick_size;
        self
    }

    /// 가격을 호가 단위로 라운딩합니다. 호가 단위가 0이면 그대로 반환합니다.
    pub fn round_to_tick(&self, price: Price, method: RoundMethod) -> Price {
        if self.tick_size.is_zero() {
            return price;
        }

        let ticks = price / self.tick_size;
        let rounded_ticks = match method {
            RoundMethod::Round => ticks.round(),
            RoundMethod::Floor => ticks.floor(),
            RoundMethod::Ceil => ticks.ceil(),
        };

        rounded_ticks * self.tick_size
    }

    /// 가격이 호가 단위에 맞는지 검증합니다.
    pub fn is_valid_price(&self, price: Price) -> bool {
        self.tick_size.is_zero() || (price % self.tick_size).is_zero()
    }

    fn from_row(cols: &[&str]) -> LedgerResult<Self> {
        let tick_size: Decimal = cols[4]
            .parse()
            .map_err(|_| LedgerError::Data(format!("invalid tickSize: {}", cols[4])))?;

        Ok(Self {
            id: cols[0].to_string(),
            symbol: cols[1].to_string(),
            asset_class: cols[2].to_string(),
            currency: cols[3].to_string(),
            tick_size,
        })
    }
}

/// 상품 ID 기준 조회 테이블.
#[derive(Debug, Clone, Default)]
pub struct InstrumentRepository {
    instruments: HashMap<String, Instrument>,
}

impl InstrumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 상품을 추가하거나 같은 ID의 기존 상품을 교체합니다.
    pub fn add(&mut self, instrument: Instrument) {
        self.instruments.insert(instrument.id.clone(), instrument);
    }

    pub fn get(&self, id: &str) -> Option<&Instrument> {
        self.instruments.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.instruments.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// ID 순으로 정렬된 상품 목록.
    pub fn iter_sorted(&self) -> Vec<&Instrument> {
        let mut all: Vec<_> = self.instruments.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// CSV 텍스트에서 상품을 로드하고 로드된 행 수를 반환합니다.
    ///
    /// - 헤더 필수 (`id,symbol,assetClass,currency,tickSize`), 빈 입력은 0을 반환
    /// - 빈 줄과 `#` 주석 줄은 건너뜀
    /// - 컬럼이 부족한 행이나 잘못된 tickSize는 에러
    ///
    /// 에러가 발생하면 그 이전 행까지는 이미 추가된 상태입니다.
    pub fn load_csv_str(&mut self, content: &str) -> LedgerResult<usize> {
        let Some(header) = tabular::header(content) else {
            return Ok(0);
        };
        if header.len() < INSTRUMENT_COLUMNS {
            return Err(LedgerError::Data(
                "instrument CSV needs header 'id,symbol,assetClass,currency,tickSize'".to_string(),
            ));
        }

        let mut loaded = 0;
        for (line_no, line) in tabular::data_lines(content) {
            let cols = tabular::split_line(line);
            if cols.len() < INSTRUMENT_COLUMNS {
                return Err(LedgerError::Data(format!(
                    "bad instrument row at line {}: {}",
                    line_no, line
                )));
            }

            let instrument = Instrument::from_row(&cols)?;
            debug!(id = %instrument.id, tick_size = %instrument.tick_size, "Instrument loaded");
            self.add(instrument);
            loaded += 1;
        }

        Ok(loaded)
    }

    /// CSV 파일에서 상품을 로드합니다.
    pub fn load_csv_file<P: AsRef<Path>>(&mut self, path: P) -> LedgerResult<usize> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let loaded = self.load_csv_str(&content)?;
        info!(
            path = %path.as_ref().display(),
            loaded,
            "Instruments loaded from file"
        );
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "id,symbol,assetClass,currency,tickSize\n\
        AAPL,AAPL,Equity,USD,0.01\n\
        # futures\n\
        \n\
        ESZ5, ESZ5 ,Futures,USD,0.25\n";

    #[test]
    fn test_load_csv_str() {
        let mut repo = InstrumentRepository::new();
        assert_eq!(repo.load_csv_str(SAMPLE).unwrap(), 2);
        assert_eq!(repo.len(), 2);

        let es = repo.get("ESZ5").unwrap();
        assert_eq!(es.symbol, "ESZ5");
        assert_eq!(es.asset_class, "Futures");
        assert_eq!(es.tick_size, dec!(0.25));
        assert!(repo.contains("AAPL"));
        assert!(repo.get("MSFT").is_none());
    }

    #[test]
    fn test_empty_input_is_quiet() {
        let mut repo = InstrumentRepository::new();
        assert_eq!(repo.load_csv_str("").unwrap(), 0);
        assert!(repo.is_empty());
    }

    #[test]
    fn test_short_header_rejected() {
        let mut repo = InstrumentRepository::new();
        let err = repo.load_csv_str("id,symbol\nAAPL,AAPL\n").unwrap_err();
        assert!(matches!(err, LedgerError::Data(_)));
    }

    #[test]
    fn test_bad_rows_rejected() {
        let mut repo = InstrumentRepository::new();
        let header = "id,symbol,assetClass,currency,tickSize\n";

        let err = repo
            .load_csv_str(&format!("{}AAPL,AAPL,Equity\n", header))
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = repo
            .load_csv_str(&format!("{}AAPL,AAPL,Equity,USD,abc\n", header))
            .unwrap_err();
        assert!(err.to_string().contains("tickSize"));
    }

    #[test]
    fn test_add_replaces() {
        let mut repo = InstrumentRepository::new();
        repo.add(Instrument::new("AAPL", "Equity", "USD"));
        repo.add(Instrument::new("AAPL", "Equity", "EUR"));
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get("AAPL").unwrap().currency, "EUR");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut repo = InstrumentRepository::new();
        let err = repo.load_csv_file("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
    }

    #[test]
    fn test_round_to_tick() {
        let es = Instrument::new("ESZ5", "Futures", "USD").with_tick_size(dec!(0.25));
        assert_eq!(es.round_to_tick(dec!(4501.13), RoundMethod::Round), dec!(4501.25));
        assert_eq!(es.round_to_tick(dec!(4501.13), RoundMethod::Floor), dec!(4501.00));
        assert_eq!(es.round_to_tick(dec!(4501.01), RoundMethod::Ceil), dec!(4501.25));
        assert!(es.is_valid_price(dec!(4501.50)));
        assert!(!es.is_valid_price(dec!(4501.10)));

        let free = Instrument::new("X", "Crypto", "USD").with_tick_size(Decimal::ZERO);
        assert_eq!(free.round_to_tick(dec!(1.2345), RoundMethod::Round), dec!(1.2345));
    }
}

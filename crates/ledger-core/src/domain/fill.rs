//! 체결 타입.
//!
//! 이 모듈은 원장에 적용되는 체결 관련 타입을 정의합니다:
//! - `Side` - 체결 방향 (매수/매도)
//! - `Fill` - 원장에 적용할 단일 체결
//! - `parse_fills_csv` - `side,quantity,price[,timestamp]` 형식의 체결 CSV 파싱

use crate::error::{LedgerError, LedgerResult};
use crate::tabular;
use crate::types::{DecimalExt, Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 체결 방향 (매수 또는 매도).
///
/// 로트에서는 Buy가 롱 로트, Sell이 숏 로트를 의미합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// 부호 있는 수량 계산을 위한 부호를 반환합니다 (Buy = 1, Sell = -1).
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "b" | "long" => Ok(Side::Buy),
            "sell" | "s" | "short" => Ok(Side::Sell),
            other => Err(LedgerError::Data(format!("Unknown side: {}", other))),
        }
    }
}

/// 원장에 적용할 체결.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// 체결 방향
    pub side: Side,
    /// 체결 수량 (양수여야 함)
    pub quantity: Quantity,
    /// 체결 가격 (부호 제약 없음)
    pub price: Price,
    /// 체결 시각 (회계 계산에는 사용되지 않음)
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    /// 새 체결을 생성합니다.
    pub fn new(side: Side, quantity: Quantity, price: Price, timestamp: DateTime<Utc>) -> Self {
        Self {
            side,
            quantity,
            price,
            timestamp,
        }
    }

    /// 매수 체결을 생성합니다. 타임스탬프는 현재 시각입니다.
    pub fn buy(quantity: Quantity, price: Price) -> Self {
        Self::new(Side::Buy, quantity, price, Utc::now())
    }

    /// 매도 체결을 생성합니다. 타임스탬프는 현재 시각입니다.
    pub fn sell(quantity: Quantity, price: Price) -> Self {
        Self::new(Side::Sell, quantity, price, Utc::now())
    }

    /// 부동소수점 입력으로부터 체결을 생성합니다.
    ///
    /// NaN 또는 무한대 가격/수량은 `Decimal`로 표현할 수 없으므로 거부됩니다.
    pub fn from_f64(
        side: Side,
        quantity: f64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        if !price.is_finite() {
            return Err(LedgerError::InvalidPrice(format!(
                "price must be finite, got {}",
                price
            )));
        }
        if !quantity.is_finite() {
            return Err(LedgerError::InvalidQuantity(format!(
                "quantity must be finite, got {}",
                quantity
            )));
        }

        let price = Decimal::try_from(price)
            .map_err(|e| LedgerError::InvalidPrice(format!("{}: {}", price, e)))?;
        let quantity = Decimal::try_from(quantity)
            .map_err(|e| LedgerError::InvalidQuantity(format!("{}: {}", quantity, e)))?;

        let fill = Self::new(side, quantity, price, timestamp);
        fill.validate()?;
        Ok(fill)
    }

    /// 체결 입력을 검증합니다.
    ///
    /// 수량은 엄격히 양수여야 합니다. 가격 부호와 호가 단위는 검증하지 않습니다.
    pub fn validate(&self) -> LedgerResult<()> {
        if !self.quantity.is_strictly_positive() {
            return Err(LedgerError::InvalidQuantity(format!(
                "fill quantity must be > 0, got {}",
                self.quantity
            )));
        }
        Ok(())
    }

    /// 부호 있는 체결 수량을 반환합니다.
    pub fn signed_quantity(&self) -> Decimal {
        self.side.sign() * self.quantity
    }
}

/// 체결 CSV 텍스트를 파싱합니다.
///
/// 헤더 필수, 컬럼은 `side,quantity,price[,timestamp]`입니다. 타임스탬프는 RFC 3339
/// 형식이며 생략하면 현재 시각을 사용합니다. 수량의 부호는 여기서 검증하지 않고
/// 원장 적용 시점에 검증합니다.
pub fn parse_fills_csv(content: &str) -> LedgerResult<Vec<Fill>> {
    let mut fills = Vec::new();

    for (line_no, line) in tabular::data_lines(content) {
        let cols = tabular::split_line(line);
        if cols.len() < 3 {
            return Err(LedgerError::Data(format!(
                "bad fill row at line {}: {}",
                line_no, line
            )));
        }

        let side: Side = cols[0].parse()?;
        let quantity: Quantity = cols[1].parse().map_err(|_| {
            LedgerError::InvalidQuantity(format!("line {}: {}", line_no, cols[1]))
        })?;
        let price: Price = cols[2]
            .parse()
            .map_err(|_| LedgerError::InvalidPrice(format!("line {}: {}", line_no, cols[2])))?;
        let timestamp = match cols.get(3).filter(|s| !s.is_empty()) {
            Some(ts) => DateTime::parse_from_rfc3339(ts)
                .map_err(|e| LedgerError::Data(format!("line {}: {}: {}", line_no, ts, e)))?
                .with_timezone(&Utc),
            None => Utc::now(),
        };

        fills.push(Fill::new(side, quantity, price, timestamp));
    }

    Ok(fills)
}

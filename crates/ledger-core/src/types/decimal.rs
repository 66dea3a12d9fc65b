//! 정밀한 금융 계산을 위한 Decimal 유틸리티.
//!
//! 이 모듈은 원장 계산에 필요한 가격, 수량, 금액 타입과 출력 유틸리티를 제공합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 체결 및 로트 수량을 위한 타입.
pub type Quantity = Decimal;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 0보다 큰지 확인합니다.
    ///
    /// `Decimal`의 deprecated 고유 메서드 `is_positive`는 부호 비트만 보므로 0도
    /// 양수로 취급합니다. 이름이 겹치면 고유 메서드가 우선하므로 별도 이름을 씁니다.
    fn is_strictly_positive(&self) -> bool;

    /// 0보다 작은지 확인합니다.
    fn is_strictly_negative(&self) -> bool;

    /// 허용 오차 이하의 크기인지 확인합니다.
    fn is_dust(&self, tolerance: Decimal) -> bool;

    /// 지정된 소수점 자릿수로 반올림합니다.
    fn round_dp_half_up(&self, dp: u32) -> Decimal;
}

impl DecimalExt for Decimal {
    fn is_strictly_positive(&self) -> bool {
        *self > Decimal::ZERO
    }

    fn is_strictly_negative(&self) -> bool {
        *self < Decimal::ZERO
    }

    fn is_dust(&self, tolerance: Decimal) -> bool {
        *self <= tolerance
    }

    fn round_dp_half_up(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    }
}

/// 통화가 포함된 금액.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// 금액
    pub amount: Decimal,
    /// 통화
    pub currency: String,
}

impl Money {
    /// 새 금액을 생성합니다.
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into().to_uppercase(),
        }
    }

    /// 0 금액을 생성합니다.
    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// USD 금액을 생성합니다.
    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, "USD")
    }

    /// 금액이 0인지 확인합니다.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// 같은 통화로 금액을 더합니다. 통화 변환은 하지 않습니다.
    ///
    /// 오버플로가 나면 금액은 그대로 두고 에러를 반환합니다.
    pub fn checked_add_amount(&mut self, amount: Decimal) -> LedgerResult<()> {
        self.amount = self.amount.checked_add(amount).ok_or_else(|| {
            LedgerError::Overflow(format!("{} {} + {}", self.currency, self.amount, amount))
        })?;
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount.round_dp_half_up(2))
    }
}

/// 가격을 소수점 6자리 고정 표기로 변환합니다.
pub fn format_price(price: Price) -> String {
    format!("{:.6}", price.round_dp_half_up(6))
}

/// 수량을 소수점 6자리 고정 표기로 변환합니다.
pub fn format_quantity(quantity: Quantity) -> String {
    format!("{:.6}", quantity.round_dp_half_up(6))
}

//! 오픈 로트.

use crate::domain::Side;
use crate::types::{DecimalExt, Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 한 방향의 현재 오픈 재고 기록.
///
/// 로트는 원장이 단독으로 소유하며, 반대 방향 체결에 의해 FIFO 순서로 소진됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    /// 로트 방향 (Buy = 롱, Sell = 숏)
    pub side: Side,
    /// 남은 오픈 수량 (음수 불가)
    remaining_quantity: Quantity,
    /// 진입 가격 (로트 수명 동안 불변)
    entry_price: Price,
    /// 로트 오픈 시각
    opened_at: DateTime<Utc>,
}

impl Lot {
    pub(crate) fn open(
        side: Side,
        quantity: Quantity,
        entry_price: Price,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            side,
            remaining_quantity: quantity,
            entry_price,
            opened_at,
        }
    }

    /// 남은 수량을 반환합니다.
    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    /// 진입 가격을 반환합니다.
    pub fn entry_price(&self) -> Price {
        self.entry_price
    }

    /// 로트 오픈 시각을 반환합니다.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// 부호 있는 남은 수량 (롱 양수, 숏 음수).
    pub fn signed_quantity(&self) -> Decimal {
        self.side.sign() * self.remaining_quantity
    }

    /// 허용 오차 이하로 소진되었는지 확인합니다.
    pub fn is_exhausted(&self, tolerance: Decimal) -> bool {
        self.remaining_quantity.is_dust(tolerance)
    }

    /// 최대 `quantity`만큼 소진하고 실제로 소진된 수량을 반환합니다.
    pub(crate) fn consume(&mut self, quantity: Quantity) -> Quantity {
        let matched = quantity.min(self.remaining_quantity);
        self.remaining_quantity -= matched;
        matched
    }
}

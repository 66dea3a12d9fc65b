//! 손익 및 명목 가치 계산 공통 로직.
//!
//! 원장 코어와 CLI 출력에서 공유하는 순수 계산 함수를 제공합니다.

use rust_decimal::Decimal;

use super::fill::Side;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{Money, Price, Quantity};

fn overflow(what: &str, a: Decimal, b: Decimal) -> LedgerError {
    LedgerError::Overflow(format!("{}: {} and {}", what, a, b))
}

/// 로트 청산 시 실현 손익 계산.
///
/// `lot_side`는 청산되는 로트의 방향입니다. 결과가 `Decimal` 범위를 넘으면
/// `LedgerError::Overflow`를 반환합니다.
///
/// # Examples
///
/// ```
/// use ledger_core::{realized_pnl, Side};
/// use rust_decimal_macros::dec;
///
/// // 롱 로트: 100에 진입 → 120에 매도로 청산, 수량 10
/// assert_eq!(realized_pnl(Side::Buy, dec!(100), dec!(120), dec!(10)).unwrap(), dec!(200));
///
/// // 숏 로트: 119에 진입 → 112에 매수로 청산, 수량 3
/// assert_eq!(realized_pnl(Side::Sell, dec!(119), dec!(112), dec!(3)).unwrap(), dec!(21));
/// ```
pub fn realized_pnl(
    lot_side: Side,
    entry_price: Price,
    exit_price: Price,
    quantity: Quantity,
) -> LedgerResult<Decimal> {
    let diff = match lot_side {
        // 롱 로트: (청산가 - 진입가) × 수량
        Side::Buy => exit_price.checked_sub(entry_price),
        // 숏 로트: (진입가 - 청산가) × 수량
        Side::Sell => entry_price.checked_sub(exit_price),
    }
    .ok_or_else(|| overflow("price difference", entry_price, exit_price))?;

    diff.checked_mul(quantity)
        .ok_or_else(|| overflow("pnl", diff, quantity))
}

/// 방향별 평가 손익 계산 (이익은 양수, 손실은 음수).
///
/// # Arguments
///
/// * `side` - 포지션 방향 (Buy=롱, Sell=숏)
/// * `entry` - 진입 가격
/// * `mark` - 평가 가격
/// * `quantity` - 수량
/// * `currency` - 결과 통화
pub fn directional_pnl(
    side: Side,
    entry: Price,
    mark: Price,
    quantity: Quantity,
    currency: &str,
) -> LedgerResult<Money> {
    Ok(Money::new(realized_pnl(side, entry, mark, quantity)?, currency))
}

/// 명목 가치 계산 (가격 × 수량).
pub fn notional(price: Price, quantity: Quantity, currency: &str) -> LedgerResult<Money> {
    let amount = price
        .checked_mul(quantity)
        .ok_or_else(|| overflow("notional", price, quantity))?;
    Ok(Money::new(amount, currency))
}

/// 가중평균 가격 계산.
///
/// `(가격, 수량)` 쌍에서 Σ(가격×수량) / Σ수량을 반환합니다. 총 수량이 0이면 0입니다.
pub fn weighted_average<I>(entries: I) -> LedgerResult<Decimal>
where
    I: IntoIterator<Item = (Price, Quantity)>,
{
    let mut total_cost = Decimal::ZERO;
    let mut total_qty = Decimal::ZERO;

    for (p, q) in entries {
        let cost = p.checked_mul(q).ok_or_else(|| overflow("cost", p, q))?;
        total_cost = total_cost
            .checked_add(cost)
            .ok_or_else(|| overflow("total cost", total_cost, cost))?;
        total_qty = total_qty
            .checked_add(q)
            .ok_or_else(|| overflow("total quantity", total_qty, q))?;
    }

    if total_qty > Decimal::ZERO {
        total_cost
            .checked_div(total_qty)
            .ok_or_else(|| overflow("average", total_cost, total_qty))
    } else {
        Ok(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_realized_pnl_long() {
        let pnl = realized_pnl(Side::Buy, dec!(110), dec!(105), dec!(5)).unwrap();
        assert_eq!(pnl, dec!(-25));
    }

    #[test]
    fn test_realized_pnl_short() {
        let pnl = realized_pnl(Side::Sell, dec!(110), dec!(100), dec!(10)).unwrap();
        assert_eq!(pnl, dec!(100));
    }

    #[test]
    fn test_directional_pnl() {
        let long = directional_pnl(Side::Buy, dec!(100), dec!(189.73), dec!(10), "USD").unwrap();
        assert_eq!(long, Money::usd(dec!(897.30)));

        let short = directional_pnl(Side::Sell, dec!(100), dec!(189.73), dec!(10), "usd").unwrap();
        assert_eq!(short, Money::usd(dec!(-897.30)));
    }

    #[test]
    fn test_notional() {
        let n = notional(dec!(189.73), dec!(10), "USD").unwrap();
        assert_eq!(n.amount, dec!(1897.30));
        assert_eq!(n.currency, "USD");
    }

    #[test]
    fn test_weighted_average() {
        let avg = weighted_average(vec![(dec!(100), dec!(10)), (dec!(110), dec!(5))]).unwrap();
        // (100*10 + 110*5) / 15 = 103.333...
        let expected = dec!(1550) / dec!(15);
        assert!((avg - expected).abs() < dec!(0.0001));

        assert_eq!(weighted_average(Vec::new()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = Decimal::MAX;
        assert!(matches!(
            realized_pnl(Side::Buy, dec!(0), huge, dec!(10)),
            Err(LedgerError::Overflow(_))
        ));
        assert!(matches!(
            realized_pnl(Side::Sell, huge, dec!(-1), dec!(1)),
            Err(LedgerError::Overflow(_))
        ));
        assert!(notional(huge, dec!(2), "USD").is_err());
        assert!(weighted_average(vec![(huge, dec!(1)), (huge, dec!(1))]).is_err());
    }
}

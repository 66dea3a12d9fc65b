//! FIFO 포지션 원장.
//!
//! 이 모듈은 단일 상품의 포지션 원장 관련 타입을 정의합니다:
//! - `Position` - 오픈 로트 큐, 실현 손익, 파생 요약 필드를 소유하는 원장
//! - `FillReport` / `LotMatch` - 체결 적용 결과
//! - `PositionSummary` - 출력용 포지션 스냅샷
//!
//! 체결은 항상 반대 방향의 가장 오래된 로트부터 청산합니다. 동률은 가격이 아닌
//! 큐 순서로만 결정됩니다. 순수량과 평균 진입가는 체결마다 로트 큐 전체에서
//! 다시 계산되며 직접 수정되지 않습니다.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::domain::calculations::{realized_pnl, weighted_average};
use crate::domain::{Fill, Lot, Side};
use crate::error::{LedgerError, LedgerResult};
use crate::types::{DecimalExt, Money, Price, Quantity};

/// 부동소수점 입력에서 유입된 잔량을 흡수하기 위한 기본 허용 오차 (1e-12).
pub const DEFAULT_DUST_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 12);

/// 설정 가능한 허용 오차 상한 (1e-6).
pub const MAX_DUST_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionDirection {
    /// 순매수
    Long,
    /// 순매도
    Short,
    /// 무포지션
    Flat,
}

impl std::fmt::Display for PositionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionDirection::Long => write!(f, "LONG"),
            PositionDirection::Short => write!(f, "SHORT"),
            PositionDirection::Flat => write!(f, "FLAT"),
        }
    }
}

/// 체결 하나가 로트 하나를 청산한 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotMatch {
    /// 청산된 로트의 방향
    pub lot_side: Side,
    /// 청산된 로트의 진입 가격
    pub entry_price: Price,
    /// 청산 수량
    pub quantity: Quantity,
    /// 이 청산으로 실현된 손익
    pub realized_pnl: Decimal,
}

/// 체결 적용 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    /// 체결 방향
    pub side: Side,
    /// 오래된 순서대로 청산된 로트 목록
    pub matches: Vec<LotMatch>,
    /// 총 청산 수량
    pub closed_quantity: Quantity,
    /// 이 체결로 실현된 손익
    pub realized_pnl: Money,
    /// 남은 수량으로 새로 연 로트
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_lot: Option<Lot>,
}

impl FillReport {
    fn new(side: Side, currency: &str) -> Self {
        Self {
            side,
            matches: Vec::new(),
            closed_quantity: Decimal::ZERO,
            realized_pnl: Money::zero(currency),
            opened_lot: None,
        }
    }

    fn record(&mut self, m: LotMatch) -> LedgerResult<()> {
        // 청산 수량 합계는 체결 수량을 넘지 않음
        self.closed_quantity += m.quantity;
        self.realized_pnl.checked_add_amount(m.realized_pnl)?;
        self.matches.push(m);
        Ok(())
    }
}

/// 출력용 포지션 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    /// 상품 식별자
    pub instrument: String,
    /// 회계 통화
    pub currency: String,
    /// 포지션 방향
    pub direction: PositionDirection,
    /// 부호 있는 순수량
    pub net_quantity: Decimal,
    /// 오픈 방향의 평균 진입가
    pub average_entry_price: Price,
    /// 누적 실현 손익
    pub realized_pnl: Money,
    /// 오픈 로트 개수
    pub open_lots: usize,
}

/// 로트 큐에서 `(순수량, 평균 진입가)`를 계산합니다.
///
/// 허용 오차 이하로 남은 로트는 무시합니다. 평균 진입가는 순수량의 부호와 같은
/// 방향의 로트로만 계산하며, 무포지션이면 0입니다.
pub fn summarize<'a, I>(lots: I, tolerance: Decimal) -> LedgerResult<(Decimal, Price)>
where
    I: IntoIterator<Item = &'a Lot>,
    I::IntoIter: Clone,
{
    let lots = lots.into_iter().filter(move |l| !l.is_exhausted(tolerance));

    let mut long_qty = Decimal::ZERO;
    let mut short_qty = Decimal::ZERO;
    for lot in lots.clone() {
        let total = match lot.side {
            Side::Buy => &mut long_qty,
            Side::Sell => &mut short_qty,
        };
        *total = total.checked_add(lot.remaining_quantity()).ok_or_else(|| {
            LedgerError::Overflow(format!("open {} quantity exceeds range", lot.side))
        })?;
    }

    // 두 합계 모두 0 이상이므로 차이는 범위 안에 있음
    let net = long_qty - short_qty;
    let open_side = if net.is_strictly_positive() {
        Side::Buy
    } else if net.is_strictly_negative() {
        Side::Sell
    } else {
        return Ok((Decimal::ZERO, Decimal::ZERO));
    };

    let avg = weighted_average(
        lots.filter(|l| l.side == open_side)
            .map(|l| (l.entry_price(), l.remaining_quantity())),
    )?;
    Ok((net, avg))
}

fn evict_exhausted_front(lots: &mut VecDeque<Lot>, tolerance: Decimal) {
    while lots.front().is_some_and(|l| l.is_exhausted(tolerance)) {
        lots.pop_front();
    }
}

/// 커밋 전에 계산된 체결 적용 결과.
struct PlannedFill {
    lots: VecDeque<Lot>,
    realized_pnl: Money,
    net_quantity: Decimal,
    average_entry_price: Price,
    report: FillReport,
}

/// 단일 (상품, 통화) 쌍에 대한 FIFO 포지션 원장.
///
/// 상태 변경은 `&mut self`를 통해서만 일어나므로 여러 스레드에서 같은 원장을
/// 쓰려면 외부 동기화(예: `Mutex<Position>`)가 필요합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    instrument: String,
    currency: String,
    net_quantity: Decimal,
    average_entry_price: Price,
    realized_pnl: Money,
    lots: VecDeque<Lot>,
    dust_tolerance: Decimal,
}

impl Position {
    /// 빈 원장을 생성합니다.
    pub fn new(instrument: impl Into<String>, currency: impl Into<String>) -> Self {
        let realized_pnl = Money::zero(currency);
        Self {
            instrument: instrument.into(),
            currency: realized_pnl.currency.clone(),
            net_quantity: Decimal::ZERO,
            average_entry_price: Decimal::ZERO,
            realized_pnl,
            lots: VecDeque::new(),
            dust_tolerance: DEFAULT_DUST_TOLERANCE,
        }
    }

    /// 원장 설정으로부터 빈 원장을 생성합니다.
    pub fn from_config(instrument: impl Into<String>, config: &LedgerConfig) -> Self {
        Self::new(instrument, config.currency.as_str()).with_dust_tolerance(config.dust_tolerance)
    }

    /// 소진 판단 허용 오차를 설정합니다. `0..=MAX_DUST_TOLERANCE` 범위로 제한됩니다.
    pub fn with_dust_tolerance(mut self, tolerance: Decimal) -> Self {
        let applied = tolerance.clamp(Decimal::ZERO, MAX_DUST_TOLERANCE);
        if applied != tolerance {
            warn!(
                instrument = %self.instrument,
                requested = %tolerance,
                applied = %applied,
                "Dust tolerance clamped"
            );
        }
        self.dust_tolerance = applied;
        self
    }

    /// 상품 식별자.
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// 회계 통화.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// 부호 있는 순수량 (롱 양수, 숏 음수, 무포지션 0).
    pub fn net_quantity(&self) -> Decimal {
        self.net_quantity
    }

    /// 오픈 방향의 평균 진입가 (무포지션이면 0).
    pub fn average_entry_price(&self) -> Price {
        self.average_entry_price
    }

    /// 누적 실현 손익.
    pub fn realized_pnl(&self) -> &Money {
        &self.realized_pnl
    }

    /// 오래된 순서의 오픈 로트 큐.
    pub fn lots(&self) -> &VecDeque<Lot> {
        &self.lots
    }

    /// 소진 판단 허용 오차.
    pub fn dust_tolerance(&self) -> Decimal {
        self.dust_tolerance
    }

    /// 순수량 부호로 본 포지션 방향.
    pub fn direction(&self) -> PositionDirection {
        if self.net_quantity.is_strictly_positive() {
            PositionDirection::Long
        } else if self.net_quantity.is_strictly_negative() {
            PositionDirection::Short
        } else {
            PositionDirection::Flat
        }
    }

    /// 순수량이 0인지 확인합니다.
    pub fn is_flat(&self) -> bool {
        self.net_quantity.is_zero()
    }

    /// 체결을 적용합니다.
    ///
    /// 잘못된 체결은 어떤 상태도 변경하기 전에 거부됩니다.
    pub fn on_fill(
        &mut self,
        side: Side,
        quantity: Quantity,
        price: Price,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<FillReport> {
        self.apply_fill(&Fill::new(side, quantity, price, timestamp))
    }

    /// 체결을 적용하고 청산/오픈 결과를 반환합니다.
    ///
    /// 1. 반대 방향의 가장 오래된 로트부터 청산하며 손익을 실현합니다.
    /// 2. 허용 오차보다 큰 남은 수량은 체결 방향의 새 로트로 큐 뒤에 추가합니다.
    /// 3. 순수량과 평균 진입가를 로트 큐에서 다시 계산합니다.
    ///
    /// 모든 계산은 로트 큐 사본에서 수행되고 성공했을 때만 반영됩니다. 수량이 0
    /// 이하이거나 허용 오차 이하인 체결, 계산이 `Decimal` 범위를 넘는 체결은
    /// 원장을 변경하지 않고 거부됩니다.
    pub fn apply_fill(&mut self, fill: &Fill) -> LedgerResult<FillReport> {
        let planned = match self.plan_fill(fill) {
            Ok(planned) => planned,
            Err(err) => {
                warn!(
                    instrument = %self.instrument,
                    side = %fill.side,
                    quantity = %fill.quantity,
                    price = %fill.price,
                    error = %err,
                    "Fill rejected"
                );
                return Err(err);
            }
        };

        self.lots = planned.lots;
        self.realized_pnl = planned.realized_pnl;
        self.net_quantity = planned.net_quantity;
        self.average_entry_price = planned.average_entry_price;
        let report = planned.report;

        for m in &report.matches {
            debug!(
                instrument = %self.instrument,
                lot_side = %m.lot_side,
                entry_price = %m.entry_price,
                exit_price = %fill.price,
                quantity = %m.quantity,
                pnl = %m.realized_pnl,
                "Lot matched"
            );
        }

        info!(
            instrument = %self.instrument,
            side = %fill.side,
            quantity = %fill.quantity,
            price = %fill.price,
            closed = %report.closed_quantity,
            realized = %report.realized_pnl.amount,
            net_quantity = %self.net_quantity,
            "Fill applied"
        );

        Ok(report)
    }

    fn plan_fill(&self, fill: &Fill) -> LedgerResult<PlannedFill> {
        fill.validate()?;

        let tolerance = self.dust_tolerance;
        if fill.quantity.is_dust(tolerance) {
            return Err(LedgerError::InvalidQuantity(format!(
                "fill quantity {} is at or below dust tolerance {}",
                fill.quantity, tolerance
            )));
        }

        let closing_side = fill.side.opposite();
        let mut lots = self.lots.clone();
        let mut realized = self.realized_pnl.clone();
        let mut report = FillReport::new(fill.side, &self.currency);
        let mut incoming = fill.quantity;

        while incoming.is_strictly_positive() {
            evict_exhausted_front(&mut lots, tolerance);

            let Some(lot) = lots
                .iter_mut()
                .find(|l| l.side == closing_side && !l.is_exhausted(tolerance))
            else {
                break;
            };

            let entry_price = lot.entry_price();
            let matched = lot.consume(incoming);
            incoming -= matched;

            let pnl = realized_pnl(closing_side, entry_price, fill.price, matched)?;
            realized.checked_add_amount(pnl)?;
            report.record(LotMatch {
                lot_side: closing_side,
                entry_price,
                quantity: matched,
                realized_pnl: pnl,
            })?;
        }
        evict_exhausted_front(&mut lots, tolerance);

        if !incoming.is_dust(tolerance) {
            let lot = Lot::open(fill.side, incoming, fill.price, fill.timestamp);
            lots.push_back(lot.clone());
            report.opened_lot = Some(lot);
        } else if incoming.is_strictly_positive() {
            debug!(
                instrument = %self.instrument,
                remainder = %incoming,
                "Remainder below dust tolerance not opened"
            );
        }

        let (net_quantity, average_entry_price) = summarize(&lots, tolerance)?;

        Ok(PlannedFill {
            lots,
            realized_pnl: realized,
            net_quantity,
            average_entry_price,
            report,
        })
    }

    /// 현재 오픈 포지션을 `mark` 가격으로 평가한 손익 (상태 변경 없음).
    ///
    /// 결과가 `Decimal` 범위를 넘으면 `LedgerError::Overflow`를 반환합니다.
    pub fn unrealized_pnl(&self, mark: Price) -> LedgerResult<Money> {
        let q = self.net_quantity.abs();
        let pnl = match self.direction() {
            PositionDirection::Flat => Decimal::ZERO,
            PositionDirection::Long => realized_pnl(Side::Buy, self.average_entry_price, mark, q)?,
            PositionDirection::Short => {
                realized_pnl(Side::Sell, self.average_entry_price, mark, q)?
            }
        };
        Ok(Money::new(pnl, self.currency.as_str()))
    }

    /// 출력용 스냅샷을 생성합니다.
    pub fn summary(&self) -> PositionSummary {
        PositionSummary {
            instrument: self.instrument.clone(),
            currency: self.currency.clone(),
            direction: self.direction(),
            net_quantity: self.net_quantity,
            average_entry_price: self.average_entry_price,
            realized_pnl: self.realized_pnl.clone(),
            open_lots: self.lots.len(),
        }
    }

    /// 원장을 생성 직후 상태로 되돌립니다. 상품, 통화, 허용 오차는 유지됩니다.
    pub fn reset(&mut self) {
        self.lots.clear();
        self.realized_pnl = Money::zero(self.currency.as_str());
        self.net_quantity = Decimal::ZERO;
        self.average_entry_price = Decimal::ZERO;
        debug!(instrument = %self.instrument, "Position reset");
    }
}

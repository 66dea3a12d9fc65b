//! 참조 시나리오 데모.
//!
//! 내장(또는 설정된) 상품 목록에서 AAPL을 찾고, 시세 몇 건을 피드로 흘려보낸 뒤
//! 체결 여섯 건을 순서대로 적용하며 매 단계의 포지션을 출력합니다.

use std::io::Write;

use anyhow::{Context, Result};
use ledger_core::{
    directional_pnl, format_price, format_quantity, ledger_span, mid, notional, AppConfig, Fill,
    FillReport, LedgerResult, MarketDataFeed, Money, Position, Price, Quantity, Quote,
    RoundMethod, Side,
};
use rust_decimal::Decimal;
use tracing::info;

use super::instruments::load_instruments;

const DEMO_INSTRUMENT: &str = "AAPL";

/// 데모에서 적용할 체결 (방향, 수량, 가격).
fn demo_fills() -> Vec<(Side, Quantity, Price)> {
    vec![
        (Side::Buy, Decimal::from(10), Decimal::from(100)),
        (Side::Buy, Decimal::from(10), Decimal::from(110)),
        (Side::Sell, Decimal::from(15), Decimal::from(120)),
        (Side::Sell, Decimal::from(5), Decimal::from(105)),
        (Side::Sell, Decimal::from(8), Decimal::from(119)),
        (Side::Buy, Decimal::from(3), Decimal::from(112)),
    ]
}

/// 데모 시세 (bid, ask, last). 센트 단위 정수.
fn demo_quotes() -> Vec<Quote> {
    [(11190, 11210, 11200), (11240, 11260, 11250), (11295, 11305, 11300)]
        .into_iter()
        .map(|(bid, ask, last)| {
            Quote::new(
                DEMO_INSTRUMENT,
                Decimal::new(bid, 2),
                Decimal::new(ask, 2),
                Decimal::new(last, 2),
            )
            .with_sizes(Decimal::from(100), Decimal::from(100))
        })
        .collect()
}

/// 손익 계산 결과를 출력용 문자열로. 오버플로는 오류 메시지 그대로 표시.
fn display_money(value: LedgerResult<Money>) -> String {
    value.map_or_else(|e| e.to_string(), |m| m.to_string())
}

fn write_position<W: Write>(out: &mut W, pos: &Position, mark: Price) -> Result<()> {
    writeln!(
        out,
        "    net={} avg={} realized={} unrealized@{}={} lots={}",
        format_quantity(pos.net_quantity()),
        format_price(pos.average_entry_price()),
        pos.realized_pnl(),
        format_price(mark),
        pos.unrealized_pnl(mark)?,
        pos.lots().len()
    )?;
    Ok(())
}

fn write_report<W: Write>(out: &mut W, step: usize, fill: &Fill, report: &FillReport) -> Result<()> {
    writeln!(
        out,
        "[{}] {} {} @ {} closed={} realized={}",
        step,
        fill.side,
        format_quantity(fill.quantity),
        format_price(fill.price),
        format_quantity(report.closed_quantity),
        report.realized_pnl
    )?;
    Ok(())
}

/// 데모를 실행하고 최종 포지션을 반환합니다.
pub fn run_demo<W: Write>(config: &AppConfig, out: &mut W) -> Result<Position> {
    let repo = load_instruments(&config.instruments.path)?;
    let instrument = repo
        .get(DEMO_INSTRUMENT)
        .with_context(|| format!("Instrument {} not found", DEMO_INSTRUMENT))?;

    let _span = ledger_span!("demo", instrument.id, config.ledger.currency).entered();
    info!(instruments = repo.len(), "Demo started");

    writeln!(
        out,
        "상품: {} ({}, {}, tick {})",
        instrument.id, instrument.asset_class, instrument.currency, instrument.tick_size
    )?;

    // 시세: 롱 10 @ 100 기준 평가액과 평가손익을 구독자가 기록
    let reference_qty = Decimal::from(10);
    let reference_entry = Decimal::from(100);
    let mut quote_lines = Vec::new();
    let mark = {
        let mut feed = MarketDataFeed::new();
        feed.subscribe(DEMO_INSTRUMENT, |quote: &Quote| {
            let m = mid(quote);
            quote_lines.push(format!(
                "  quote {} bid={} ask={} mid={} notional={} uPnL(long {} @ {})={}",
                quote.instrument,
                format_price(quote.bid),
                format_price(quote.ask),
                format_price(m),
                display_money(notional(m, reference_qty, &instrument.currency)),
                format_quantity(reference_qty),
                format_price(reference_entry),
                display_money(directional_pnl(
                    Side::Buy,
                    reference_entry,
                    m,
                    reference_qty,
                    &instrument.currency
                ))
            ));
        });

        for quote in demo_quotes() {
            feed.push(quote);
        }

        feed.mark(DEMO_INSTRUMENT)
            .with_context(|| format!("No quote received for {}", DEMO_INSTRUMENT))?
    };

    writeln!(out, "\n시세:")?;
    for line in &quote_lines {
        writeln!(out, "{}", line)?;
    }

    writeln!(out, "\n체결:")?;
    let mut pos = Position::from_config(instrument.id.as_str(), &config.ledger);
    for (step, (side, quantity, price)) in demo_fills().into_iter().enumerate() {
        let price = instrument.round_to_tick(price, RoundMethod::Round);
        let fill = Fill::new(side, quantity, price, chrono::Utc::now());
        let report = pos
            .apply_fill(&fill)
            .with_context(|| format!("Demo fill {} rejected", step + 1))?;

        write_report(out, step + 1, &fill, &report)?;
        write_position(out, &pos, mark)?;
    }

    let summary = pos.summary();
    writeln!(
        out,
        "\n최종: {} {} {} avg={} realized={}",
        summary.instrument,
        summary.direction,
        format_quantity(summary.net_quantity),
        format_price(summary.average_entry_price),
        summary.realized_pnl
    )?;

    info!(
        realized = %pos.realized_pnl(),
        net_quantity = %pos.net_quantity(),
        "Demo completed"
    );

    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::PositionDirection;
    use rust_decimal_macros::dec;

    fn demo_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.instruments.path = "does/not/exist.csv".to_string();
        config
    }

    #[test]
    fn test_demo_final_position() {
        let mut out = Vec::new();
        let pos = run_demo(&demo_config(), &mut out).unwrap();

        assert_eq!(pos.realized_pnl(), &Money::usd(dec!(246)));
        assert_eq!(pos.net_quantity(), dec!(-5));
        assert_eq!(pos.average_entry_price(), dec!(119));
        assert_eq!(pos.direction(), PositionDirection::Short);
    }

    #[test]
    fn test_demo_output() {
        let mut out = Vec::new();
        run_demo(&demo_config(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("realized=USD 250.00"));
        assert!(text.contains("realized=USD 225.00"));
        assert!(text.contains("realized=USD 246.00"));
        // 마지막 시세 mid 113.00, 롱 10 @ 100
        assert!(text.contains("mid=113.000000 notional=USD 1130.00"));
        assert!(text.contains("USD 130.00"));
        // 숏 5 @ 119를 113.00으로 평가
        assert!(text.contains("unrealized@113.000000=USD 30.00"));
        assert_eq!(text.matches("  quote AAPL").count(), 3);
    }

    #[test]
    fn test_display_money_shows_overflow() {
        assert_eq!(display_money(Ok(Money::usd(dec!(12.5)))), "USD 12.50");

        let overflow = notional(Decimal::MAX, dec!(2), "USD");
        assert!(display_money(overflow).contains("오버플로"));
    }
}

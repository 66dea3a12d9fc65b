//! 체결 CSV 재생 기능.

use std::io::Write;

use anyhow::{Context, Result};
use ledger_core::{
    format_price, format_quantity, ledger_span, parse_fills_csv, Fill, LedgerConfig, Money,
    Position, PositionSummary, Price,
};
use serde::Serialize;
use tracing::{info, warn};

/// 재생 설정.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// 체결 CSV 파일 경로
    pub fills_path: String,
    /// 상품 ID
    pub instrument: String,
    /// 미실현 손익 평가 가격
    pub mark: Option<Price>,
    /// JSON 출력 여부
    pub json: bool,
}

/// 재생 결과.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutcome {
    /// 최종 포지션 스냅샷
    pub summary: PositionSummary,
    /// 적용된 체결 수
    pub applied: usize,
    /// 거부된 체결 수
    pub rejected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl: Option<Money>,
}

/// 체결을 순서대로 적용합니다.
///
/// 입력 오류(수량·가격·오버플로)로 거부된 체결은 경고 로그를 남기고 건너뜁니다.
/// 원장은 거부된 체결에 대해 변경되지 않으므로 이후 체결은 그대로 이어서
/// 적용됩니다. 그 밖의 오류는 재생을 중단합니다.
pub fn replay_fills(
    fills: &[Fill],
    instrument: &str,
    ledger: &LedgerConfig,
    mark: Option<Price>,
) -> Result<(Position, ReplayOutcome)> {
    let _span = ledger_span!("replay", instrument, ledger.currency).entered();

    let mut pos = Position::from_config(instrument, ledger);
    let mut applied = 0;
    let mut rejected = 0;

    for (idx, fill) in fills.iter().enumerate() {
        match pos.apply_fill(fill) {
            Ok(_) => applied += 1,
            Err(e) if e.is_input_error() => {
                warn!(row = idx + 1, error = %e, "Fill skipped");
                rejected += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("Fill {} failed", idx + 1)),
        }
    }

    let unrealized_pnl = mark
        .map(|m| pos.unrealized_pnl(m))
        .transpose()
        .context("Failed to value position at mark")?;

    let outcome = ReplayOutcome {
        summary: pos.summary(),
        applied,
        rejected,
        mark,
        unrealized_pnl,
    };

    info!(applied, rejected, "Replay finished");
    Ok((pos, outcome))
}

fn print_table<W: Write>(outcome: &ReplayOutcome, pos: &Position, out: &mut W) -> Result<()> {
    let summary = &outcome.summary;

    writeln!(out, "상품:        {}", summary.instrument)?;
    writeln!(out, "방향:        {}", summary.direction)?;
    writeln!(out, "순수량:      {}", format_quantity(summary.net_quantity))?;
    writeln!(out, "평균 진입가: {}", format_price(summary.average_entry_price))?;
    writeln!(out, "실현 손익:   {}", summary.realized_pnl)?;
    if let (Some(mark), Some(upnl)) = (outcome.mark, &outcome.unrealized_pnl) {
        writeln!(out, "미실현 손익: {} (mark {})", upnl, format_price(mark))?;
    }
    writeln!(out, "체결:        적용 {} / 거부 {}", outcome.applied, outcome.rejected)?;

    if !pos.lots().is_empty() {
        writeln!(out, "\n{:<6} {:>16} {:>16}", "SIDE", "QUANTITY", "ENTRY")?;
        for lot in pos.lots() {
            writeln!(
                out,
                "{:<6} {:>16} {:>16}",
                lot.side,
                format_quantity(lot.remaining_quantity()),
                format_price(lot.entry_price())
            )?;
        }
    }

    Ok(())
}

/// `replay` 명령 실행.
pub fn run_replay<W: Write>(
    config: &ReplayConfig,
    ledger: &LedgerConfig,
    out: &mut W,
) -> Result<ReplayOutcome> {
    let content = std::fs::read_to_string(&config.fills_path)
        .with_context(|| format!("Failed to read fills from {}", config.fills_path))?;
    let fills = parse_fills_csv(&content)
        .with_context(|| format!("Failed to parse fills in {}", config.fills_path))?;

    info!(path = %config.fills_path, fills = fills.len(), "Fills loaded");

    let (pos, outcome) = replay_fills(&fills, &config.instrument, ledger, config.mark)?;

    if config.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize summary")?;
        writeln!(out, "{}", json)?;
    } else {
        print_table(&outcome, &pos, out)?;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{PositionDirection, Side};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const FILLS: &str = "\
side,quantity,price,timestamp
buy,10,100,2025-01-02T09:30:00Z
buy,10,110,2025-01-02T09:31:00Z
sell,0,999,2025-01-02T09:31:30Z
sell,15,120,2025-01-02T09:32:00Z
";

    fn write_fills(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("ledger-replay-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_replay_skips_rejected_fill() {
        let fills = parse_fills_csv(FILLS).unwrap();
        let (pos, outcome) =
            replay_fills(&fills, "AAPL", &LedgerConfig::default(), Some(dec!(115))).unwrap();

        assert_eq!(outcome.applied, 3);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.summary.realized_pnl.amount, dec!(250));
        assert_eq!(outcome.summary.direction, PositionDirection::Long);
        assert_eq!(outcome.unrealized_pnl.unwrap().amount, dec!(25));
        assert_eq!(pos.lots()[0].side, Side::Buy);
    }

    #[test]
    fn test_replay_skips_overflowing_fill() {
        let content = "\
side,quantity,price
buy,10,100
buy,10,50000000000000000000000000000
sell,0.0000000000001,100
sell,4,110
";
        let fills = parse_fills_csv(content).unwrap();
        let (pos, outcome) = replay_fills(&fills, "AAPL", &LedgerConfig::default(), None).unwrap();

        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.rejected, 2);
        assert_eq!(outcome.summary.net_quantity, dec!(6));
        assert_eq!(outcome.summary.realized_pnl.amount, dec!(40));
        assert_eq!(pos.lots().len(), 1);
    }

    #[test]
    fn test_replay_mark_overflow_is_an_error() {
        let fills = parse_fills_csv("side,quantity,price\nbuy,10,100\n").unwrap();
        let result = replay_fills(&fills, "AAPL", &LedgerConfig::default(), Some(Decimal::MIN));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_replay_table() {
        let path = write_fills("table.csv", FILLS);
        let config = ReplayConfig {
            fills_path: path.to_string_lossy().into_owned(),
            instrument: "AAPL".to_string(),
            mark: None,
            json: false,
        };

        let mut out = Vec::new();
        run_replay(&config, &LedgerConfig::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("USD 250.00"));
        assert!(text.contains("5.000000"));
        assert!(text.contains("110.000000"));
        assert!(!text.contains("mark"));
    }

    #[test]
    fn test_run_replay_json() {
        let path = write_fills("json.csv", FILLS);
        let config = ReplayConfig {
            fills_path: path.to_string_lossy().into_owned(),
            instrument: "AAPL".to_string(),
            mark: Some(dec!(120)),
            json: true,
        };

        let mut out = Vec::new();
        run_replay(&config, &LedgerConfig::default(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["summary"]["instrument"], "AAPL");
        assert_eq!(value["applied"], 3);
        assert_eq!(value["rejected"], 1);
        assert!(value.get("unrealized_pnl").is_some());
    }

    #[test]
    fn test_run_replay_missing_file() {
        let config = ReplayConfig {
            fills_path: "does/not/exist.csv".to_string(),
            instrument: "AAPL".to_string(),
            mark: None,
            json: false,
        };
        let mut out = Vec::new();
        assert!(run_replay(&config, &LedgerConfig::default(), &mut out).is_err());
    }
}

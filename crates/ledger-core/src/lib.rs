//! # Ledger Core
//!
//! 단일 상품 FIFO 포지션 원장의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! - 체결 적용과 FIFO 로트 매칭, 실현 손익 누적
//! - 로트 큐에서 파생되는 순수량/평균 진입가
//! - 평가 가격 기준 미실현 손익
//! - 상품 참조 데이터와 시세 배포 협력 모듈
//! - 설정 관리 및 로깅 인프라
//!
//! ```
//! use ledger_core::{Fill, Position};
//! use rust_decimal_macros::dec;
//!
//! let mut pos = Position::new("AAPL", "USD");
//! pos.apply_fill(&Fill::buy(dec!(10), dec!(100))).unwrap();
//! pos.apply_fill(&Fill::buy(dec!(10), dec!(110))).unwrap();
//! pos.apply_fill(&Fill::sell(dec!(15), dec!(120))).unwrap();
//!
//! assert_eq!(pos.realized_pnl().amount, dec!(250));
//! assert_eq!(pos.net_quantity(), dec!(5));
//! assert_eq!(pos.average_entry_price(), dec!(110));
//! ```

#![deny(deprecated)]

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod tabular;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;

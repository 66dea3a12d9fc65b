//! 포지션 원장의 도메인 모델.

mod calculations;
mod fill;
mod instrument;
mod lot;
mod market_data;
mod position;

pub use calculations::*;
pub use fill::*;
pub use instrument::*;
pub use lot::*;
pub use market_data::*;
pub use position::*;

//! FIFO 포지션 원장 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 참조 시나리오 데모 (`demo`)
//! - 체결 CSV 재생 (`replay`)
//! - 상품 참조 데이터 조회 (`instruments`)

pub mod commands;

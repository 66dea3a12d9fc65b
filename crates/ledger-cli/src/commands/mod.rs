//! CLI 명령어 구현 모듈.

pub mod demo;
pub mod instruments;
pub mod replay;

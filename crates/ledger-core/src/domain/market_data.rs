//! 시세 데이터 타입 및 배포.
//!
//! 이 모듈은 시세 관련 타입을 정의합니다:
//! - `Quote` - 상품별 최우선 호가/최근 체결가 틱
//! - `MarketDataFeed` - 최신 시세 캐시와 구독자 콜백 등록소
//!
//! 원장은 여기서 계산된 단일 평가 가격만 사용합니다.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::{DecimalExt, Price, Quantity};

/// 상품 하나의 시세 틱.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// 상품 ID
    pub instrument: String,
    /// 최우선 매수 호가
    pub bid: Price,
    /// 매수 호가 잔량
    pub bid_quantity: Quantity,
    /// 최우선 매도 호가
    pub ask: Price,
    /// 매도 호가 잔량
    pub ask_quantity: Quantity,
    /// 최근 체결가
    pub last: Price,
    /// 관측 시각
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// 새 시세를 생성합니다. 잔량은 0, 시각은 현재입니다.
    pub fn new(instrument: impl Into<String>, bid: Price, ask: Price, last: Price) -> Self {
        Self {
            instrument: instrument.into(),
            bid,
            bid_quantity: Decimal::ZERO,
            ask,
            ask_quantity: Decimal::ZERO,
            last,
            timestamp: Utc::now(),
        }
    }

    /// 호가 잔량을 설정합니다.
    pub fn with_sizes(mut self, bid_quantity: Quantity, ask_quantity: Quantity) -> Self {
        self.bid_quantity = bid_quantity;
        self.ask_quantity = ask_quantity;
        self
    }

    /// 매수/매도 스프레드를 반환합니다.
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}

/// 평가 가격: 양쪽 호가가 있으면 `(bid + ask) / 2`, 없으면 최근 체결가, 그것도 없으면 0.
pub fn mid(quote: &Quote) -> Price {
    if quote.bid.is_strictly_positive() && quote.ask.is_strictly_positive() {
        // bid + ask 합계는 오버플로할 수 있으므로 스프레드 절반을 더함
        let half_spread = (quote.ask - quote.bid) / Decimal::TWO;
        return quote.bid.checked_add(half_spread).unwrap_or(quote.ask);
    }

    if quote.last.is_strictly_positive() {
        return quote.last;
    }

    Decimal::ZERO
}

/// 시세 구독 콜백.
pub type QuoteHandler<'a> = Box<dyn FnMut(&Quote) + 'a>;

/// 푸시 방식 시세 배포: 상품 ID로 구독하고 시세 갱신을 받습니다.
#[derive(Default)]
pub struct MarketDataFeed<'a> {
    subscribers: HashMap<String, Vec<QuoteHandler<'a>>>,
    last: HashMap<String, Quote>,
}

impl<'a> MarketDataFeed<'a> {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
            last: HashMap::new(),
        }
    }

    /// 특정 상품의 시세 콜백을 등록합니다.
    pub fn subscribe<F>(&mut self, instrument: impl Into<String>, handler: F)
    where
        F: FnMut(&Quote) + 'a,
    {
        self.subscribers
            .entry(instrument.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// 해당 상품의 모든 콜백을 등록 순서대로 호출하고 최신 시세로 캐시합니다.
    pub fn push(&mut self, quote: Quote) {
        let instrument = quote.instrument.clone();

        if let Some(handlers) = self.subscribers.get_mut(&instrument) {
            trace!(instrument = %instrument, handlers = handlers.len(), "Dispatching quote");
            for handler in handlers.iter_mut() {
                handler(&quote);
            }
        }

        self.last.insert(instrument, quote);
    }

    /// 상품의 가장 최근 시세.
    pub fn last(&self, instrument: &str) -> Option<&Quote> {
        self.last.get(instrument)
    }

    /// 상품의 가장 최근 시세로 계산한 평가 가격.
    pub fn mark(&self, instrument: &str) -> Option<Price> {
        self.last(instrument).map(mid)
    }

    /// 시세를 한 번 이상 받은 상품 수.
    pub fn known_instruments(&self) -> usize {
        self.last.len()
    }
}

impl std::fmt::Debug for MarketDataFeed<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataFeed")
            .field("subscribed_instruments", &self.subscribers.len())
            .field("known_instruments", &self.last.len())
            .finish()
    }
}

//! Market data boundary.
//!
//! The simulation never talks to an exchange directly: candles and live prices come
//! through a [`MarketFeed`]. Every call may fail (network, rate limits); callers
//! treat [`Error::Feed`] as recoverable.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::Candle;
use crate::errors::{Error, Result};

/// Last traded price of a symbol.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    /// Symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Last price.
    pub price: f64,
}

/// Source of historical candles and live prices.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Fetches up to `limit` candles of `symbol`, oldest first.
    ///
    /// `start` and `end` bound the candle times when given. When more than `limit`
    /// candles match, the most recent ones are returned.
    async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>>;

    /// Fetches the last price of `symbol`.
    async fn get_ticker_price(&self, symbol: &str) -> Result<Ticker>;
}

#[derive(Debug, Default)]
struct MemoryFeedState {
    candles: BTreeMap<String, Vec<Candle>>,
    prices: BTreeMap<String, f64>,
    failing: BTreeSet<String>,
}

/// In-memory [`MarketFeed`] over preloaded candles and prices.
///
/// Clones share the same data, so a test can keep a handle to move prices or
/// inject failures while a paper trader reads from it. The candle interval is
/// not checked: each symbol has a single series.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    state: Arc<RwLock<MemoryFeedState>>,
}

impl MemoryFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the candles of `symbol`. The last close becomes its price.
    pub fn set_candles(&self, symbol: &str, mut candles: Vec<Candle>) {
        candles.sort_by_key(Candle::time);
        let mut state = self.write();
        if let Some(last) = candles.last() {
            state.prices.insert(symbol.to_string(), last.close());
        }
        state.candles.insert(symbol.to_string(), candles);
    }

    /// Appends a candle to `symbol` and moves its price to the close.
    pub fn push_candle(&self, symbol: &str, candle: Candle) {
        let mut state = self.write();
        state.prices.insert(symbol.to_string(), candle.close());
        state.candles.entry(symbol.to_string()).or_default().push(candle);
    }

    /// Sets the live price of `symbol`.
    pub fn set_price(&self, symbol: &str, price: f64) {
        self.write().prices.insert(symbol.to_string(), price);
    }

    /// Makes every call for `symbol` fail (or succeed again).
    pub fn set_failing(&self, symbol: &str, failing: bool) {
        let mut state = self.write();
        if failing {
            state.failing.insert(symbol.to_string());
        } else {
            state.failing.remove(symbol);
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryFeedState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryFeedState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(state: &MemoryFeedState, symbol: &str) -> Result<()> {
        if state.failing.contains(symbol) {
            return Err(Error::Feed(format!("{symbol}: service unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketFeed for MemoryFeed {
    async fn get_klines(
        &self,
        symbol: &str,
        _interval: &str,
        limit: usize,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>> {
        let state = self.read();
        Self::check(&state, symbol)?;
        let candles = state
            .candles
            .get(symbol)
            .ok_or_else(|| Error::Feed(format!("unknown symbol {symbol}")))?;

        let matching = candles
            .iter()
            .filter(|c| start.is_none_or(|start| c.time() >= start) && end.is_none_or(|end| c.time() <= end))
            .collect::<Vec<_>>();
        let skip = matching.len().saturating_sub(limit);
        Ok(matching.into_iter().skip(skip).cloned().collect())
    }

    async fn get_ticker_price(&self, symbol: &str) -> Result<Ticker> {
        let state = self.read();
        Self::check(&state, symbol)?;
        let price = state
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::Feed(format!("no ticker for {symbol}")))?;
        Ok(Ticker {
            symbol: symbol.to_string(),
            price,
        })
    }
}

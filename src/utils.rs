//! JSON loading of candles and settings, and wallet persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use chrono::serde::ts_milliseconds;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::engine::{Candle, CandleBuilder, Wallet};
use crate::errors::Result;

// {
//   "open_time": 1759813200000,
//   "open_price": 124499.99,
//   "high_price": 124640.76,
//   "low_price": 124240.37,
//   "close_price": 124414.17,
//   "volume": 424.20697,
//   "close_time": 1759816799999,
//   ...
// }

/// One kline as exported by exchanges; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct KlineRecord {
    #[serde(alias = "time", with = "ts_milliseconds")]
    open_time: DateTime<Utc>,
    #[serde(alias = "open_price")]
    open: f64,
    #[serde(alias = "high_price")]
    high: f64,
    #[serde(alias = "low_price")]
    low: f64,
    #[serde(alias = "close_price")]
    close: f64,
    #[serde(default)]
    volume: f64,
}

impl TryFrom<KlineRecord> for Candle {
    type Error = crate::errors::Error;

    fn try_from(record: KlineRecord) -> Result<Self> {
        CandleBuilder::builder()
            .time(record.open_time)
            .open(record.open)
            .high(record.high)
            .low(record.low)
            .close(record.close)
            .volume(record.volume)
            .build()
    }
}

/// Reads a JSON document from `path`.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Reads an array of klines from `path` and returns validated candles sorted by time.
pub fn load_candles(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let records: Vec<KlineRecord> = load_json(path)?;
    let mut candles = records.into_iter().map(Candle::try_from).collect::<Result<Vec<_>>>()?;
    candles.sort_by_key(Candle::time);
    Ok(candles)
}

/// Writes `wallet` to `path` as JSON.
pub fn save_wallet(wallet: &Wallet, path: impl AsRef<Path>) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, wallet)?;
    Ok(())
}

/// Reads a wallet written by [`save_wallet`].
pub fn load_wallet(path: impl AsRef<Path>) -> Result<Wallet> {
    load_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::engine::{MarketOrderRequest, OrderSide, OrderSize, Simulator};
    use crate::errors::Error;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tradesim-{}-{name}", std::process::id()))
    }

    #[test]
    fn parse_kline_records() {
        let json = r#"[
            {"open_time": 3600000, "open_price": 101.0, "high_price": 103.0, "low_price": 100.0, "close_price": 102.0, "volume": 5.0, "ignore": 0.0},
            {"time": 0, "open": 100.0, "high": 102.0, "low": 99.0, "close": 101.0}
        ]"#;
        let path = temp_path("klines.json");
        std::fs::write(&path, json).unwrap();

        let candles = load_candles(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close(), 101.0);
        assert_eq!(candles[0].volume(), 0.0);
        assert_eq!(candles[1].time().timestamp(), 3600);
    }

    #[test]
    fn invalid_kline_is_rejected() {
        let path = temp_path("bad-klines.json");
        std::fs::write(&path, r#"[{"time": 0, "open": 100.0, "high": 90.0, "low": 99.0, "close": 101.0}]"#).unwrap();
        let result = load_candles(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::InvalidCandle(_))));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(load_candles(temp_path("missing.json")), Err(Error::IoError(_))));
    }

    #[test]
    fn wallet_round_trip_resumes() {
        let mut simulator = Simulator::new(SimulationConfig::default()).unwrap();
        let now = DateTime::default();
        simulator.update_price("BTCUSDT", 100.0, now).unwrap();
        simulator
            .create_market_order(MarketOrderRequest::new("BTCUSDT", OrderSide::Buy, OrderSize::Quantity(2.0)), now)
            .unwrap();

        let path = temp_path("wallet.json");
        save_wallet(simulator.wallet(), &path).unwrap();
        let wallet = load_wallet(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!((wallet.available_balance() - simulator.available_balance()).abs() < 1e-9);
        assert_eq!(wallet.transactions().len(), simulator.transactions().len());
        let restored = Simulator::restore(SimulationConfig::default(), wallet).unwrap();
        assert_eq!(restored.open_positions().count(), 1);
    }
}

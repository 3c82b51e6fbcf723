use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tradesim::engine::{Candle, CandleBuilder};
use tracing_subscriber::EnvFilter;

#[allow(dead_code)]
/// Generates a reproducible hourly random walk with a slow sine trend.
pub fn generate_sample_candles(count: usize, seed: u64, base_price: f64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = DateTime::<Utc>::default();
    let mut open = base_price;

    (0..count)
        .map(|i| {
            let trend = 0.004 * (i as f64 / 40.0).sin();
            let shock = rng.random_range(-0.015..0.015);
            let close = (open * (1.0 + trend + shock)).max(1.0);
            let high = open.max(close) * (1.0 + rng.random_range(0.0..0.006));
            let low = open.min(close) * (1.0 - rng.random_range(0.0..0.006));
            let volume = rng.random_range(500.0..1500.0);

            let candle = CandleBuilder::builder()
                .time(start + Duration::hours(i as i64))
                .open(open)
                .high(high)
                .low(low)
                .close(close)
                .volume(volume)
                .build()
                .expect("generated candles are consistent");
            open = close;
            candle
        })
        .collect()
}

#[allow(dead_code)]
pub fn example_candles() -> Vec<Candle> {
    generate_sample_candles(1000, 42, 100.0)
}

/// Installs a `RUST_LOG` driven subscriber, `info` by default.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
}

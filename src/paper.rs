//! Paper trading mode: live prices and fresh signals applied to a simulated wallet.
//!
//! Two periodic tasks run on the Tokio runtime:
//! - the price refresh task polls the ticker of every watched symbol and of every
//!   symbol with an open position, marks positions and closes those breaching their
//!   exit rules,
//! - the evaluation task fetches recent candles, runs the strategies and acts on
//!   confident signals.
//!
//! Each task awaits its own tick before the next one starts, so a slow tick is never
//! run concurrently with itself; missed ticks are skipped. Both tasks share the
//! simulator behind a mutex and only hold it while applying changes, never across a
//! feed request. A failed fetch is logged and the symbol is retried next tick.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::{PaperTradingConfig, SimulationConfig};
use crate::engine::{Order, Simulator, Wallet};
use crate::errors::{Error, Result};
use crate::feed::MarketFeed;
use crate::strategy::{AnalyzeOptions, CombineOptions, evaluate_strategies};

struct Shared {
    config: PaperTradingConfig,
    simulator: Mutex<Simulator>,
    feed: Arc<dyn MarketFeed>,
}

struct Tasks {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

/// A paper trading session.
///
/// ### Example
/// ```rust
/// use std::sync::Arc;
///
/// use tradesim::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let feed = Arc::new(MemoryFeed::new());
/// feed.set_price("BTCUSDT", 100.0);
///
/// let mut trader = PaperTrader::new(PaperTradingConfig::default(), SimulationConfig::default(), feed)?;
/// trader.start()?;
/// trader.refresh_prices().await;
/// trader.stop().await?;
///
/// assert_eq!(trader.simulator().await.last_price("BTCUSDT"), Some(100.0));
/// # Ok(())
/// # }
/// ```
pub struct PaperTrader {
    shared: Arc<Shared>,
    tasks: Option<Tasks>,
}

impl std::fmt::Debug for PaperTrader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperTrader")
            .field("config", &self.shared.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl PaperTrader {
    /// Creates a stopped session with a fresh wallet.
    pub fn new(config: PaperTradingConfig, simulation: SimulationConfig, feed: Arc<dyn MarketFeed>) -> Result<Self> {
        Self::with_simulator(config, Simulator::new(simulation)?, feed)
    }

    /// Creates a stopped session around an existing simulator, e.g. a restored one.
    pub fn with_simulator(config: PaperTradingConfig, simulator: Simulator, feed: Arc<dyn MarketFeed>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                simulator: Mutex::new(simulator),
                feed,
            }),
            tasks: None,
        })
    }

    /// Returns the session settings.
    pub fn config(&self) -> &PaperTradingConfig {
        &self.shared.config
    }

    /// Returns true between [`PaperTrader::start`] and [`PaperTrader::stop`].
    pub fn is_running(&self) -> bool {
        self.tasks.is_some()
    }

    /// Locks the simulator for manual operations (orders, deposits, config updates).
    ///
    /// The periodic tasks wait while the guard is held.
    pub async fn simulator(&self) -> MutexGuard<'_, Simulator> {
        self.shared.simulator.lock().await
    }

    /// Returns a snapshot of the wallet.
    pub async fn wallet(&self) -> Wallet {
        self.shared.simulator.lock().await.snapshot()
    }

    /// Spawns the price refresh and evaluation tasks on the current Tokio runtime.
    ///
    /// The first tick of each task runs immediately.
    pub fn start(&mut self) -> Result<()> {
        if self.tasks.is_some() {
            return Err(Error::AlreadyRunning);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| Error::InvalidConfig(format!("paper trading needs a Tokio runtime: {err}")))?;

        let (shutdown, _) = watch::channel(false);
        let refresh = {
            let shared = Arc::clone(&self.shared);
            spawn_periodic(&runtime, shared.config.price_refresh_interval(), shutdown.subscribe(), move || {
                let shared = Arc::clone(&shared);
                async move { shared.refresh_prices().await }
            })
        };
        let evaluation = {
            let shared = Arc::clone(&self.shared);
            spawn_periodic(&runtime, shared.config.evaluation_interval(), shutdown.subscribe(), move || {
                let shared = Arc::clone(&shared);
                async move {
                    shared.evaluate().await;
                }
            })
        };

        info!(
            symbols = ?self.shared.config.symbols,
            refresh_secs = self.shared.config.price_refresh_secs,
            evaluation_secs = self.shared.config.evaluation_secs,
            "paper trading started"
        );
        self.tasks = Some(Tasks {
            shutdown,
            handles: vec![refresh, evaluation],
        });
        Ok(())
    }

    /// Cancels both tasks and waits for them to finish.
    ///
    /// A tick in progress completes first, so the wallet is never left with a
    /// half-applied change.
    pub async fn stop(&mut self) -> Result<()> {
        let tasks = self.tasks.take().ok_or(Error::NotRunning)?;
        // receivers only fail to get it if the task already ended
        let _ = tasks.shutdown.send(true);
        for handle in tasks.handles {
            if let Err(err) = handle.await {
                warn!(%err, "paper trading task ended abnormally");
            }
        }
        info!("paper trading stopped");
        Ok(())
    }

    /// Runs one price refresh tick.
    pub async fn refresh_prices(&self) {
        self.shared.refresh_prices().await;
    }

    /// Runs one evaluation tick and returns the orders it produced.
    pub async fn evaluate(&self) -> Vec<Order> {
        self.shared.evaluate().await
    }
}

impl Drop for PaperTrader {
    fn drop(&mut self) {
        if let Some(tasks) = self.tasks.take() {
            for handle in tasks.handles {
                handle.abort();
            }
        }
    }
}

fn spawn_periodic<F, Fut>(
    runtime: &tokio::runtime::Handle,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    runtime.spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = timer.tick() => tick().await,
                _ = shutdown.changed() => break,
            }
        }
    })
}

impl Shared {
    fn watched_symbols(&self, simulator: &Simulator) -> BTreeSet<String> {
        self.config
            .symbols
            .iter()
            .cloned()
            .chain(simulator.open_positions().map(|p| p.symbol().to_string()))
            .collect()
    }

    async fn refresh_prices(&self) {
        let symbols = self.watched_symbols(&*self.simulator.lock().await);

        for symbol in symbols {
            let ticker = match self.feed.get_ticker_price(&symbol).await {
                Ok(ticker) => ticker,
                Err(err) => {
                    warn!(%symbol, %err, "price refresh failed, retrying next tick");
                    continue;
                }
            };

            let now = Utc::now();
            let mut simulator = self.simulator.lock().await;
            if let Err(err) = simulator.update_price(&symbol, ticker.price, now) {
                warn!(%symbol, %err, "ignoring ticker");
                continue;
            }
            match simulator.check_exits(now) {
                Ok(orders) if !orders.is_empty() => debug!(%symbol, closed = orders.len(), "exit rules triggered"),
                Ok(_) => {}
                Err(err) => warn!(%symbol, %err, "exit check failed"),
            }
        }
    }

    async fn evaluate(&self) -> Vec<Order> {
        let combine = CombineOptions {
            weight_by_confidence: self.config.weight_by_confidence,
        };
        let mut orders = Vec::new();

        {
            let mut simulator = self.simulator.lock().await;
            match simulator.check_exits(Utc::now()) {
                Ok(closed) => orders.extend(closed),
                Err(err) => warn!(%err, "exit check failed"),
            }
        }

        for symbol in &self.config.symbols {
            let candles = match self
                .feed
                .get_klines(symbol, &self.config.interval, self.config.lookback, None, None)
                .await
            {
                Ok(candles) => candles,
                Err(err) => {
                    warn!(%symbol, %err, "candle fetch failed, retrying next tick");
                    continue;
                }
            };

            let options = AnalyzeOptions::new(symbol);
            let Some(signal) = evaluate_strategies(
                &self.config.strategies,
                &candles,
                &options,
                combine,
                self.config.min_confidence,
            ) else {
                debug!(%symbol, "no signal to act on");
                continue;
            };

            let mut simulator = self.simulator.lock().await;
            match simulator.execute_signal(&signal, Utc::now()) {
                Ok(executed) => {
                    info!(%signal, orders = executed.len(), "signal acted on");
                    orders.extend(executed);
                }
                Err(err) => warn!(%signal, %err, "signal execution failed"),
            }
        }
        orders
    }
}

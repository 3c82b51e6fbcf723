/// Result type of every fallible operation of the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the simulator, configuration validation, feeds and file loading.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The candle data provided is empty. Backtesting requires at least one candle.
    #[error("Candle data is empty: backtesting requires at least one candle")]
    CandleDataEmpty,

    /// A candle has inconsistent or non-finite OHLCV values.
    #[error("Invalid candle: {0}")]
    InvalidCandle(String),

    /// The initial or current balance is not positive. Trading requires a positive balance.
    #[error("Balance must be positive (got: {0})")]
    NegZeroBalance(f64),

    /// A deposit or withdrawal amount is not a positive finite number.
    #[error("Amount must be positive and finite (got: {0})")]
    InvalidAmount(f64),

    /// A price is not a positive finite number.
    #[error("Price must be positive and finite (got: {0})")]
    InvalidPrice(f64),

    /// An order quantity (or sizing percentage) is not usable.
    #[error("Invalid order quantity: {0}")]
    InvalidQuantity(f64),

    /// Leverage must be at least 1.
    #[error("Leverage must be >= 1 (got: {0})")]
    InvalidLeverage(f64),

    /// The wallet does not have enough available funds.
    #[error("Insufficient balance: required {required:.8}, available {available:.8}")]
    InsufficientBalance {
        /// Funds needed by the operation (margin plus fees, or withdrawal amount).
        required: f64,
        /// Funds available at the time of the request.
        available: f64,
    },

    /// No position with this id exists in the wallet.
    #[error("Position not found: {0}")]
    PositionNotFound(u64),

    /// The position exists but has already been closed.
    #[error("Position {0} is already closed")]
    PositionClosed(u64),

    /// The order already reached a terminal status.
    #[error("Order {0} is already finalized")]
    OrderFinalized(u64),

    /// A SELL order would open a short while margin trading is disabled.
    #[error("Short selling requires margin trading to be enabled")]
    ShortSellingDisabled,

    /// No price is known for the symbol yet.
    #[error("No price available for symbol {0}")]
    NoPrice(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The upstream market data feed failed (network, rate limit, bad payload).
    #[error("Market feed error: {0}")]
    Feed(String),

    /// Paper trading was started twice.
    #[error("Paper trading is already running")]
    AlreadyRunning,

    /// Paper trading was stopped while not running.
    #[error("Paper trading is not running")]
    NotRunning,

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error occurred.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// Returns true for errors that leave the wallet untouched and may be retried later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Feed(_) | Self::NoPrice(_) | Self::InsufficientBalance { .. }
        )
    }
}

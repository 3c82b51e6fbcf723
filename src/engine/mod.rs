//! Core simulation engine components.
//!
//! This module provides the state machine of a simulated trading account:
//! - `Candle`: validated OHLCV bar.
//! - `Order`: market order, filled immediately by the simulator.
//! - `Position`: open or closed exposure with stop-loss / take-profit rules.
//! - `Transaction`: append-only ledger entry.
//! - `Wallet`: balances, positions, orders and the ledger.
//! - `Simulator`: the only way to mutate a wallet.

mod candle;
mod order;
mod position;
mod simulator;
mod transaction;
mod wallet;

pub use candle::*;
pub use order::*;
pub use position::*;
pub use simulator::*;
pub use transaction::*;
pub use wallet::*;

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ledger entry category.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Funds added to the wallet.
    Deposit,
    /// Funds taken out of the wallet.
    Withdrawal,
    /// Trading fee, always negative.
    Fee,
    /// Opening (zero amount) or closing (realized pnl) of a position.
    Trade,
}

/// Immutable, append-only ledger entry.
///
/// `amount` is the signed effect on the wallet's realized equity
/// (`available + locked`): deposits and profits are positive, withdrawals,
/// fees and losses negative. Opening a trade moves funds from available to
/// locked and is recorded with a zero amount.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    id: u64,
    kind: TransactionType,
    amount: f64,
    symbol: Option<String>,
    timestamp: DateTime<Utc>,
    description: String,
    related_order_id: Option<u64>,
    related_position_id: Option<u64>,
}

impl Transaction {
    pub(crate) fn new(
        id: u64,
        kind: TransactionType,
        amount: f64,
        timestamp: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            amount,
            symbol: None,
            timestamp,
            description: description.into(),
            related_order_id: None,
            related_position_id: None,
        }
    }

    pub(crate) fn for_trade(mut self, symbol: &str, order_id: u64, position_id: u64) -> Self {
        self.symbol = Some(symbol.to_string());
        self.related_order_id = Some(order_id);
        self.related_position_id = Some(position_id);
        self
    }

    /// Returns the sequential ledger id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the entry category.
    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    /// Returns the signed effect on realized equity.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Returns the traded symbol, if any.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// Returns the time of the entry.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the id of the order behind a trade or fee entry.
    pub fn related_order_id(&self) -> Option<u64> {
        self.related_order_id
    }

    /// Returns the id of the position behind a trade or fee entry.
    pub fn related_position_id(&self) -> Option<u64> {
        self.related_position_id
    }
}

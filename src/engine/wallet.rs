#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::{Order, Position, Transaction};
use crate::errors::{Error, Result};

/// Tolerance used when comparing accumulated floating point balances.
pub const BALANCE_EPSILON: f64 = 1e-9;

/// The virtual trading account of one simulation session.
///
/// The wallet only exposes read access publicly. Every mutation goes through the
/// [`Simulator`](crate::engine::Simulator), which validates first and then applies
/// all field changes and ledger entries together.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Wallet {
    // Initial balance used for reset and ledger reconciliation
    initial_balance: f64,
    // Funds free for new trades or withdrawal
    available: f64,
    // Funds locked as margin of open positions
    locked: f64,
    positions: Vec<Position>,
    orders: Vec<Order>,
    transactions: Vec<Transaction>,
    // Cumulative fees paid
    fees: f64,
    // Realized profit and loss, before fees
    cumulative_pnl: f64,
    next_id: u64,
}

impl Wallet {
    /// Creates a new wallet with the given initial balance.
    /// Zero and negative balances are rejected.
    pub fn new(balance: f64) -> Result<Self> {
        if balance <= 0.0 || !balance.is_finite() {
            return Err(Error::NegZeroBalance(balance));
        }

        Ok(Self {
            initial_balance: balance,
            available: balance,
            locked: 0.0,
            positions: Vec::new(),
            orders: Vec::new(),
            transactions: Vec::new(),
            fees: 0.0,
            cumulative_pnl: 0.0,
            next_id: 1,
        })
    }

    /// Returns the capital the wallet was created with.
    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    /// Returns the funds free for new trades or withdrawal.
    pub fn available_balance(&self) -> f64 {
        self.available
    }

    /// Returns the margin locked by open positions.
    pub fn locked_balance(&self) -> f64 {
        self.locked
    }

    /// Returns the unrealized P&L of all open positions.
    pub fn unrealized_pnl(&self) -> f64 {
        self.open_positions().map(Position::unrealized_pnl).sum()
    }

    /// Returns `available + locked + unrealized P&L`.
    pub fn total_balance(&self) -> f64 {
        self.available + self.locked + self.unrealized_pnl()
    }

    /// Returns `available + locked`, the equity already settled in the ledger.
    pub fn realized_balance(&self) -> f64 {
        self.available + self.locked
    }

    /// Returns the fees paid to the market.
    pub fn total_fees(&self) -> f64 {
        self.fees
    }

    /// Returns the realized P&L of closed positions, before fees.
    pub fn cumulative_pnl(&self) -> f64 {
        self.cumulative_pnl
    }

    /// Returns every position, open and closed, in opening order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Returns an iterator over the open positions.
    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| p.is_open())
    }

    /// Returns an iterator over the closed positions.
    pub fn closed_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| !p.is_open())
    }

    /// Looks up a position by id.
    pub fn position(&self, id: u64) -> Option<&Position> {
        self.positions.iter().find(|p| p.id() == id)
    }

    /// Returns every order in creation order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Returns the append-only ledger.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Sum of all ledger amounts.
    pub fn ledger_total(&self) -> f64 {
        self.transactions.iter().map(Transaction::amount).sum()
    }

    /// Checks the balance invariants: non-negative balances and a ledger that
    /// reconciles with the realized balance.
    pub fn is_consistent(&self) -> bool {
        let locked_margin = self.open_positions().map(Position::margin).sum::<f64>();
        let tolerance = BALANCE_EPSILON * self.initial_balance.max(1.0) * 1e3;

        self.available >= -tolerance
            && (self.locked - locked_margin).abs() <= tolerance
            && (self.ledger_total() - (self.realized_balance() - self.initial_balance)).abs() <= tolerance
    }

    pub(crate) fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn position_mut(&mut self, id: u64) -> Option<&mut Position> {
        self.positions.iter_mut().find(|p| p.id() == id)
    }

    pub(crate) fn open_positions_mut(&mut self) -> impl Iterator<Item = &mut Position> {
        self.positions.iter_mut().filter(|p| p.is_open())
    }

    /// Moves `margin + fee` out of the available balance and locks `margin`.
    pub(crate) fn lock(&mut self, margin: f64, fee: f64) -> Result<()> {
        if margin <= 0.0 || fee < 0.0 {
            return Err(Error::InvalidAmount(margin));
        }
        let required = margin + fee;
        if required > self.available + BALANCE_EPSILON {
            return Err(Error::InsufficientBalance {
                required,
                available: self.available,
            });
        }
        self.available = (self.available - required).max(0.0);
        self.locked += margin;
        self.fees += fee;
        Ok(())
    }

    /// Unlocks `margin` and credits it back together with `pnl`, net of `fee`.
    pub(crate) fn release(&mut self, margin: f64, pnl: f64, fee: f64) -> Result<()> {
        if margin <= 0.0 || self.locked + BALANCE_EPSILON < margin {
            return Err(Error::InvalidAmount(margin));
        }
        let returned = margin + pnl - fee;
        if returned < -BALANCE_EPSILON {
            return Err(Error::InsufficientBalance {
                required: -returned,
                available: 0.0,
            });
        }
        self.locked -= margin;
        if self.locked.abs() < BALANCE_EPSILON {
            self.locked = 0.0;
        }
        self.available += returned.max(0.0);
        self.fees += fee;
        self.cumulative_pnl += pnl;
        Ok(())
    }

    /// Adds funds to the available balance.
    pub(crate) fn credit(&mut self, amount: f64) -> Result<()> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(Error::InvalidAmount(amount));
        }
        self.available += amount;
        Ok(())
    }

    /// Removes funds from the available balance.
    pub(crate) fn debit(&mut self, amount: f64) -> Result<()> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(Error::InvalidAmount(amount));
        }
        if amount > self.available + BALANCE_EPSILON {
            return Err(Error::InsufficientBalance {
                required: amount,
                available: self.available,
            });
        }
        self.available = (self.available - amount).max(0.0);
        Ok(())
    }

    pub(crate) fn push_position(&mut self, position: Position) {
        self.positions.push(position);
    }

    pub(crate) fn push_order(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub(crate) fn push_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    /// Resets the wallet to a fresh account holding `balance`.
    pub(crate) fn reset(&mut self, balance: f64) -> Result<()> {
        *self = Self::new(balance)?;
        Ok(())
    }
}

#[cfg(test)]
#[test]
fn new_wallet_valid_balance() {
    let wallet = Wallet::new(100.0).unwrap();
    assert_eq!(wallet.available_balance(), 100.0);
    assert_eq!(wallet.total_balance(), 100.0);
    assert_eq!(wallet.locked, 0.0);
    assert!(wallet.is_consistent());
}

#[cfg(test)]
#[test]
fn new_wallet_invalid_balance() {
    let result = Wallet::new(0.0);
    assert!(matches!(result, Err(Error::NegZeroBalance(_))));

    let result = Wallet::new(-10.0);
    assert!(matches!(result, Err(Error::NegZeroBalance(_))));

    let result = Wallet::new(f64::INFINITY);
    assert!(matches!(result, Err(Error::NegZeroBalance(_))));
}

#[cfg(test)]
#[test]
fn lock_and_release_funds() {
    let mut wallet = Wallet::new(100.0).unwrap();

    wallet.lock(20.0, 0.5).unwrap();
    assert_eq!(wallet.available, 79.5);
    assert_eq!(wallet.locked, 20.0);
    assert_eq!(wallet.fees, 0.5);

    wallet.release(20.0, 5.0, 0.25).unwrap();
    assert_eq!(wallet.available, 104.25);
    assert_eq!(wallet.locked, 0.0);
    assert_eq!(wallet.fees, 0.75);
    assert_eq!(wallet.cumulative_pnl, 5.0);
}

#[cfg(test)]
#[test]
fn lock_insufficient_funds_leaves_wallet_untouched() {
    let mut wallet = Wallet::new(100.0).unwrap();
    let result = wallet.lock(99.5, 1.0);
    assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
    assert_eq!(wallet.available, 100.0);
    assert_eq!(wallet.locked, 0.0);
    assert_eq!(wallet.fees, 0.0);
}

#[cfg(test)]
#[test]
fn lock_invalid_amount() {
    let mut wallet = Wallet::new(100.0).unwrap();
    assert!(matches!(wallet.lock(-10.0, 0.0), Err(Error::InvalidAmount(_))));
    assert!(matches!(wallet.release(10.0, 0.0, 0.0), Err(Error::InvalidAmount(_))));
}

#[cfg(test)]
#[test]
fn credit_and_debit() {
    let mut wallet = Wallet::new(100.0).unwrap();
    wallet.credit(50.0).unwrap();
    assert_eq!(wallet.available_balance(), 150.0);

    wallet.debit(150.0).unwrap();
    assert_eq!(wallet.available_balance(), 0.0);

    assert!(matches!(wallet.debit(1.0), Err(Error::InsufficientBalance { .. })));
    assert!(matches!(wallet.credit(f64::NAN), Err(Error::InvalidAmount(_))));
    assert!(matches!(wallet.debit(0.0), Err(Error::InvalidAmount(_))));
}

#[cfg(test)]
#[test]
fn reset_wallet() {
    let mut wallet = Wallet::new(100.0).unwrap();
    wallet.lock(20.0, 0.2).unwrap();
    let _ = wallet.next_id();

    wallet.reset(250.0).unwrap();
    assert_eq!(wallet.fees, 0.0);
    assert_eq!(wallet.locked, 0.0);
    assert_eq!(wallet.available_balance(), 250.0);
    assert_eq!(wallet.initial_balance(), 250.0);
    assert_eq!(wallet.next_id(), 1);
}

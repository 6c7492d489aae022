use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The opposite side, i.e. the side this order crosses against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Monotonic diagnostic timestamp, assigned once per process.
///
/// Price-time priority is enforced by arrival order into a level, never by
/// comparing these, so a process-wide counter is enough; there's no need for
/// wall-clock time just to label orders for `Debug` output.
fn next_ts() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A limit order: immutable identity `(id, side, price)`, mutable
/// `remaining_qty` while resting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub side: Side,
    pub price: i64,
    pub remaining_qty: i64,
    pub ts: u64,
}

impl Order {
    /// Builds a new order, validating that `qty > 0`.
    ///
    /// Callers must not reuse an id that is currently resting; that is
    /// caller responsibility and is not checked here.
    pub fn new(id: u64, side: Side, price: i64, qty: i64) -> Result<Self, EngineError> {
        if qty <= 0 {
            return Err(EngineError::InvalidOrder {
                reason: format!("qty must be > 0, got {qty}"),
            });
        }
        Ok(Order {
            id,
            side,
            price,
            remaining_qty: qty,
            ts: next_ts(),
        })
    }
}

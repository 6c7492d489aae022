//! Core of a single-instrument limit order matching engine.
//!
//! [`orderbook::OrderBook`] is the synchronous price-time priority book and
//! matching algorithm. [`queue::ConcurrentQueue`] is a bounded-free
//! multi-producer/multi-consumer FIFO with a closeable lifecycle.
//! [`engine::AsyncEngine`] wires one order book to an inbound queue of
//! orders and an outbound queue of trade events behind a single worker
//! thread, with clean drain-before-exit shutdown.

pub mod engine;
pub mod error;
pub mod order;
pub mod orderbook;
pub mod queue;
pub mod trade;

pub use engine::AsyncEngine;
pub use error::{EngineError, EngineResult};
pub use order::{Order, Side};
pub use orderbook::OrderBook;
pub use queue::ConcurrentQueue;
pub use trade::{EngineEvent, Trade};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::order::Order;
use crate::orderbook::OrderBook;
use crate::queue::ConcurrentQueue;
use crate::trade::EngineEvent;

/// Owns one [`OrderBook`], one inbound queue of [`Order`]s, one outbound
/// queue of [`EngineEvent`]s, and exactly one worker thread that drains
/// inbound, feeds the book, and publishes outbound events.
///
/// The book is reached only through a mutex that the worker locks once per
/// inbound item; in the steady state the worker is the only contender, so
/// this costs nothing beyond what confinement would, while still letting
/// [`AsyncEngine::best_bid`]/[`AsyncEngine::best_ask`] observe a consistent
/// snapshot from any thread: reads are serialized with mutation through the
/// same lock.
pub struct AsyncEngine {
    book: Arc<Mutex<OrderBook>>,
    inbound: Arc<ConcurrentQueue<Order>>,
    outbound: Arc<ConcurrentQueue<EngineEvent>>,
    running: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncEngine {
    pub fn new() -> Self {
        Self::with_book(OrderBook::new())
    }

    pub fn with_book(book: OrderBook) -> Self {
        let book = Arc::new(Mutex::new(book));
        let inbound = Arc::new(ConcurrentQueue::new());
        let outbound = Arc::new(ConcurrentQueue::new());
        let running = AtomicBool::new(true);

        let worker = {
            let book = book.clone();
            let inbound = inbound.clone();
            let outbound = outbound.clone();
            thread::spawn(move || worker_loop(book, inbound, outbound))
        };

        Self {
            book,
            inbound,
            outbound,
            running,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueues `order` for the worker to process. FIFO per producer; no
    /// cross-producer fairness beyond the queue's own.
    pub fn submit(&self, order: Order) {
        self.inbound.push(order);
    }

    /// Non-blocking drain from the outbound queue.
    pub fn poll_event(&self) -> Option<EngineEvent> {
        self.outbound.try_pop()
    }

    /// Blocking drain from the outbound queue; returns `None` once outbound
    /// is closed and fully drained.
    pub fn wait_event(&self) -> Option<EngineEvent> {
        self.outbound.pop()
    }

    /// Reads the book's best bid. See module docs: serialized with the
    /// worker's mutations via the shared mutex.
    pub fn best_bid(&self) -> Option<i64> {
        self.book.lock().unwrap().best_bid()
    }

    /// Reads the book's best ask. See module docs: serialized with the
    /// worker's mutations via the shared mutex.
    pub fn best_ask(&self) -> Option<i64> {
        self.book.lock().unwrap().best_ask()
    }

    /// Idempotent, exactly-once shutdown: closes inbound (unblocking the
    /// worker if it's waiting), joins the worker once it has drained
    /// whatever was already accepted, then closes outbound. Safe to call
    /// from any thread and safe to call more than once.
    pub fn shutdown(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        info!("engine shutdown: closing inbound");
        self.inbound.close();

        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("engine worker thread panicked");
            }
        }
        info!("engine shutdown: worker joined, closing outbound");
        self.outbound.close();
    }
}

impl Default for AsyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AsyncEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Running -> (notionally) Draining -> Exited. The worker keeps consuming
/// whatever inbound.pop() hands it, including items that arrived after
/// `close()` was called but before the queue went empty, so every order
/// accepted before shutdown is guaranteed to be processed.
fn worker_loop(
    book: Arc<Mutex<OrderBook>>,
    inbound: Arc<ConcurrentQueue<Order>>,
    outbound: Arc<ConcurrentQueue<EngineEvent>>,
) {
    while let Some(order) = inbound.pop() {
        let trades = book.lock().unwrap().add_order(order);
        if !trades.is_empty() {
            outbound.push(EngineEvent::TradeBatch { trades });
        }
    }
}

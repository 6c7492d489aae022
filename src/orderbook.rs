use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Write;

use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::order::{Order, Side};
use crate::trade::Trade;

/// Price-time priority order book for a single instrument.
///
/// `bids` and `asks` are each a price -> FIFO-queue-of-orders map. Iterating
/// `bids` in reverse gives highest-price-first; iterating `asks` forwards
/// gives lowest-price-first. `id_index` maps a resting order's id to the
/// `(side, price)` of the queue holding it, so cancellation doesn't need to
/// scan every level.
pub struct OrderBook {
    /// Buy orders, keyed by price ascending; best bid is the last entry.
    pub bids: BTreeMap<i64, VecDeque<Order>>,
    /// Sell orders, keyed by price ascending; best ask is the first entry.
    pub asks: BTreeMap<i64, VecDeque<Order>>,
    id_index: HashMap<u64, (Side, i64)>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            id_index: HashMap::new(),
        }
    }

    fn resting_side_mut(&mut self, side: Side) -> &mut BTreeMap<i64, VecDeque<Order>> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Matches `order` against the book and returns the resulting trades in
    /// execution order. Any unfilled residual is enqueued at the tail of its
    /// price level on its own side; the book never crosses itself and every
    /// unit of quantity is conserved once this returns.
    ///
    /// Pre: `order.remaining_qty > 0` (enforced by [`Order::new`]); `order.id`
    /// is not currently resting (caller responsibility, not checked here).
    pub fn add_order(&mut self, mut order: Order) -> Vec<Trade> {
        info!(id = order.id, side = ?order.side, price = order.price, qty = order.remaining_qty, "incoming order");
        let trades = match order.side {
            Side::Buy => self.cross(&mut order, |best_px, order_px| order_px >= best_px),
            Side::Sell => self.cross(&mut order, |best_px, order_px| order_px <= best_px),
        };

        if order.remaining_qty > 0 {
            let side = order.side;
            let price = order.price;
            let id = order.id;
            self.resting_side_mut(side)
                .entry(price)
                .or_default()
                .push_back(order);
            self.id_index.insert(id, (side, price));
            debug!(id, side = ?side, price, "residual rests in book");
        }
        if !trades.is_empty() {
            debug!(count = trades.len(), "trades emitted");
        }
        trades
    }

    /// Runs the crossing loop for `order` against the opposite side's ladder.
    ///
    /// `crossable(best_px, order_px)` decides whether `order` can still cross
    /// the best resting level on the opposite side: for a Buy, the order's
    /// price must be >= the best ask; for a Sell, <= the best bid.
    fn cross(&mut self, order: &mut Order, crossable: impl Fn(i64, i64) -> bool) -> Vec<Trade> {
        let mut trades = Vec::new();
        let opposite = order.side.opposite();

        loop {
            if order.remaining_qty <= 0 {
                break;
            }
            let best_px = match opposite {
                // Asks: lowest price first.
                Side::Sell => self.asks.keys().next().copied(),
                // Bids: highest price first.
                Side::Buy => self.bids.keys().next_back().copied(),
            };
            let Some(best_px) = best_px else { break };
            if !crossable(best_px, order.price) {
                break;
            }

            let level = self.resting_side_mut(opposite).get_mut(&best_px).unwrap();
            while order.remaining_qty > 0 {
                let Some(resting) = level.front_mut() else {
                    break;
                };
                let traded = order.remaining_qty.min(resting.remaining_qty);
                trades.push(Trade {
                    maker_id: resting.id,
                    taker_id: order.id,
                    price: resting.price,
                    qty: traded,
                });
                order.remaining_qty -= traded;
                resting.remaining_qty -= traded;

                if resting.remaining_qty == 0 {
                    let filled_id = resting.id;
                    level.pop_front();
                    self.id_index.remove(&filled_id);
                } else {
                    // The incoming order is fully filled; the resting order
                    // keeps its place at the head of the queue.
                    break;
                }
            }

            if level.is_empty() {
                self.resting_side_mut(opposite).remove(&best_px);
                warn!(price = best_px, side = ?opposite, "level exhausted, pruned");
            }
        }

        trades
    }

    /// Removes a resting order by id. Returns `true` iff it was found and
    /// removed; `false` if no such order is currently resting (including the
    /// case where it was already fully filled or previously cancelled).
    pub fn cancel(&mut self, id: u64) -> bool {
        let Some((side, price)) = self.id_index.remove(&id) else {
            return false;
        };
        let book_side = self.resting_side_mut(side);
        let Some(level) = book_side.get_mut(&price) else {
            // Index/queue out of sync: a programming error, not a runtime
            // condition. Fail closed rather than panicking.
            warn!(id, "id_index pointed at an empty level during cancel");
            return false;
        };
        let Some(pos) = level.iter().position(|o| o.id == id) else {
            warn!(id, "id_index entry had no matching order in its level");
            return false;
        };
        level.remove(pos);
        if level.is_empty() {
            book_side.remove(&price);
        }
        info!(id, "order cancelled");
        true
    }

    /// Highest resting bid price, or `None` if there are no resting bids.
    pub fn best_bid(&self) -> Option<i64> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest resting ask price, or `None` if there are no resting asks.
    pub fn best_ask(&self) -> Option<i64> {
        self.asks.keys().next().copied()
    }

    /// Diagnostic dump: asks low-to-high, then bids high-to-low, `id x qty`
    /// tokens per level. Not part of the matching contract; format is not
    /// stable.
    pub fn print_book<W: Write>(&self, mut sink: W) -> std::io::Result<()> {
        writeln!(sink, "asks (low -> high):")?;
        for (price, level) in self.asks.iter() {
            write!(sink, "  {price}:")?;
            for o in level {
                write!(sink, " {}x{}", o.id, o.remaining_qty)?;
            }
            writeln!(sink)?;
        }
        writeln!(sink, "bids (high -> low):")?;
        for (price, level) in self.bids.iter().rev() {
            write!(sink, "  {price}:")?;
            for o in level {
                write!(sink, " {}x{}", o.id, o.remaining_qty)?;
            }
            writeln!(sink)?;
        }
        Ok(())
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience wrapper: builds an [`Order`] and feeds it through
/// [`OrderBook::add_order`] in one call, surfacing `qty <= 0` as an error
/// instead of letting it silently through.
pub fn submit_limit(
    book: &mut OrderBook,
    id: u64,
    side: Side,
    price: i64,
    qty: i64,
) -> Result<Vec<Trade>, EngineError> {
    let order = Order::new(id, side, price, qty)?;
    Ok(book.add_order(order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy(book: &mut OrderBook, id: u64, price: i64, qty: i64) -> Vec<Trade> {
        submit_limit(book, id, Side::Buy, price, qty).unwrap()
    }
    fn sell(book: &mut OrderBook, id: u64, price: i64, qty: i64) -> Vec<Trade> {
        submit_limit(book, id, Side::Sell, price, qty).unwrap()
    }

    /// Empty book, no cross.
    #[test]
    fn resting_order_sets_best_bid() {
        let mut book = OrderBook::new();
        let trades = buy(&mut book, 1, 100, 10);
        assert!(trades.is_empty());
        assert_eq!(book.best_bid(), Some(100));
        assert_eq!(book.best_ask(), None);
    }

    /// Simple full cross across two ask levels.
    #[test]
    fn simple_full_cross() {
        let mut book = OrderBook::new();
        sell(&mut book, 1, 101, 50);
        sell(&mut book, 2, 102, 40);
        buy(&mut book, 3, 100, 70);
        let trades = buy(&mut book, 4, 102, 80);

        assert_eq!(
            trades,
            vec![
                Trade { maker_id: 1, taker_id: 4, price: 101, qty: 50 },
                Trade { maker_id: 2, taker_id: 4, price: 102, qty: 30 },
            ]
        );
        assert!(book.asks.is_empty());
        assert_eq!(book.bids[&100].len(), 1);
        assert_eq!(book.bids[&100][0].id, 3);
        assert_eq!(book.bids[&100][0].remaining_qty, 70);
    }

    /// Partial fill creates a residual.
    #[test]
    fn partial_fill_creates_residual() {
        let mut book = OrderBook::new();
        sell(&mut book, 1, 101, 50);
        let trades = buy(&mut book, 2, 101, 30);

        assert_eq!(trades, vec![Trade { maker_id: 1, taker_id: 2, price: 101, qty: 30 }]);
        assert!(book.bids.is_empty());
        assert_eq!(book.asks[&101][0].remaining_qty, 20);
    }

    /// FIFO priority within a level.
    #[test]
    fn fifo_priority_within_level() {
        let mut book = OrderBook::new();
        sell(&mut book, 1, 101, 10);
        sell(&mut book, 2, 101, 10);
        let trades = buy(&mut book, 3, 101, 15);

        assert_eq!(
            trades,
            vec![
                Trade { maker_id: 1, taker_id: 3, price: 101, qty: 10 },
                Trade { maker_id: 2, taker_id: 3, price: 101, qty: 5 },
            ]
        );
        assert_eq!(book.asks[&101].len(), 1);
        assert_eq!(book.asks[&101][0].id, 2);
        assert_eq!(book.asks[&101][0].remaining_qty, 5);
    }

    /// Cancellation frees a resting order and lets the next order behind it fill.
    #[test]
    fn cancellation_frees_a_resting_order() {
        let mut book = OrderBook::new();
        buy(&mut book, 1, 100, 10);
        buy(&mut book, 2, 100, 10);

        assert!(book.cancel(1));
        let trades = sell(&mut book, 3, 100, 10);

        assert_eq!(trades, vec![Trade { maker_id: 2, taker_id: 3, price: 100, qty: 10 }]);
    }

    #[test]
    fn cancel_unknown_id_returns_false() {
        let mut book = OrderBook::new();
        assert!(!book.cancel(999));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut book = OrderBook::new();
        buy(&mut book, 1, 100, 10);
        assert!(book.cancel(1));
        assert!(!book.cancel(1));
    }

    #[test]
    fn cancelling_a_fully_filled_order_returns_false() {
        let mut book = OrderBook::new();
        sell(&mut book, 1, 100, 5);
        buy(&mut book, 2, 100, 5);
        // order 1 was fully filled as a maker and is no longer resting.
        assert!(!book.cancel(1));
    }

    #[test]
    fn crossing_limit_buy_matches_instead_of_resting() {
        let mut book = OrderBook::new();
        sell(&mut book, 1, 105, 5);
        let trades = buy(&mut book, 2, 110, 3);

        assert_eq!(trades, vec![Trade { maker_id: 1, taker_id: 2, price: 105, qty: 3 }]);
        assert_eq!(book.asks[&105][0].remaining_qty, 2);
        assert!(!book.bids.contains_key(&110));
    }

    #[test]
    fn book_never_crosses_at_rest() {
        let mut book = OrderBook::new();
        for i in 0..50u64 {
            let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
            let price = 90 + (i as i64 % 20);
            submit_limit(&mut book, i, side, price, 3).unwrap();
            if let (Some(bb), Some(ba)) = (book.best_bid(), book.best_ask()) {
                assert!(bb < ba, "book crossed at rest: bid {bb} >= ask {ba}");
            }
        }
    }

    #[test]
    fn conservation_of_quantity_with_no_cancellations() {
        let mut book = OrderBook::new();
        let mut submitted = 0i64;
        let mut traded_once = 0i64;
        for i in 0..40u64 {
            let side = if i % 3 == 0 { Side::Buy } else { Side::Sell };
            let price = 100 + (i as i64 % 5) - 2;
            let qty = 4;
            submitted += qty;
            let trades = submit_limit(&mut book, i, side, price, qty).unwrap();
            traded_once += trades.iter().map(|t| t.qty).sum::<i64>();
        }
        let resting: i64 = book
            .bids
            .values()
            .chain(book.asks.values())
            .flat_map(|level| level.iter())
            .map(|o| o.remaining_qty)
            .sum();
        assert_eq!(submitted, traded_once + resting);
    }

    #[test]
    fn print_book_lists_asks_low_to_high_and_bids_high_to_low() {
        let mut book = OrderBook::new();
        buy(&mut book, 1, 100, 10);
        buy(&mut book, 2, 99, 5);
        sell(&mut book, 3, 105, 7);
        sell(&mut book, 4, 110, 2);

        let mut out = Vec::new();
        book.print_book(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let ask_105 = text.find("105").unwrap();
        let ask_110 = text.find("110").unwrap();
        let bid_100 = text.find("100").unwrap();
        let bid_99 = text.find("99").unwrap();
        assert!(ask_105 < ask_110);
        assert!(bid_100 < bid_99);
    }
}

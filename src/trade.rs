use serde::{Deserialize, Serialize};

/// A matched transaction between a resting order (the maker) and the
/// incoming order that crossed against it (the taker).
///
/// `price` is always the maker's price: the resting order sets the trade
/// price regardless of how aggressive the taker's limit was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub maker_id: u64,
    pub taker_id: u64,
    pub price: i64,
    pub qty: i64,
}

/// Events published on the engine's outbound queue.
///
/// The tag space is extensible (e.g. a future `BookSnapshot` variant) but
/// only `TradeBatch` carries defined behavior today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// All trades produced by a single incoming order, in execution order.
    TradeBatch { trades: Vec<Trade> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_batch_round_trips_through_json() {
        let event = EngineEvent::TradeBatch {
            trades: vec![Trade { maker_id: 1, taker_id: 2, price: 100, qty: 5 }],
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: EngineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}

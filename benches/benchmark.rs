use criterion::{criterion_group, criterion_main, Criterion};
use order_book_engine::orderbook::submit_limit;
use order_book_engine::{Order, OrderBook, Side};

/// Builds a book with `orders_per_level` resting sells at each of `depth`
/// price levels. Asks only: `add_order` always crosses before resting, so
/// seeding both sides at the same prices here would just cross itself away
/// instead of building depth.
fn setup_order_book(depth: i64, orders_per_level: i64) -> OrderBook {
    let mut ob = OrderBook::new();
    let mut next_id = 0u64;
    for price in 1..=depth {
        for _ in 0..orders_per_level {
            submit_limit(&mut ob, next_id, Side::Sell, price, 1).unwrap();
            next_id += 1;
        }
    }
    ob
}

fn bench_match_order(c: &mut Criterion) {
    let depth = 100;
    let orders_per_level = 10;

    c.bench_function("crossing limit buy through many ask levels", |b| {
        b.iter_batched(
            || setup_order_book(depth, orders_per_level),
            |mut ob| {
                let crossing_buy = Order::new(
                    u64::MAX,
                    Side::Buy,
                    depth,
                    depth * orders_per_level / 2,
                )
                .unwrap();
                ob.add_order(crossing_buy);
            },
            criterion::BatchSize::SmallInput,
        )
    });

    c.bench_function("resting limit order, no cross", |b| {
        let mut ob = setup_order_book(depth, orders_per_level);
        let mut id = depth as u64 * orders_per_level as u64 * 2;
        b.iter(|| {
            submit_limit(&mut ob, id, Side::Buy, 0, 1).unwrap();
            id += 1;
        })
    });
}

criterion_group!(benches, bench_match_order);
criterion_main!(benches);

//! Demo CLI for poking at the order book / async engine by hand.
//!
//! Not part of the matching engine's contract — this exists so the crate
//! has a runnable surface, the way most CLI-fronted crates ship one.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::Rng;
use tracing::info;

use order_book_engine::orderbook::submit_limit;
use order_book_engine::{AsyncEngine, EngineEvent, Order, OrderBook, Side};

#[derive(Parser)]
#[command(name = "order-book-engine")]
#[command(author, version, about = "A demo of a limit-order matching engine core")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a single resting order to a throwaway book, then print it.
    Add {
        #[arg(value_enum)]
        side: CliSide,
        price: i64,
        quantity: i64,
    },
    /// Run a two-producer / one-consumer demo against the async engine.
    Demo {
        /// Orders submitted per producer thread.
        #[arg(default_value_t = 10)]
        orders_per_producer: u64,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum CliSide {
    Buy,
    Sell,
}

impl From<CliSide> for Side {
    fn from(value: CliSide) -> Self {
        match value {
            CliSide::Buy => Side::Buy,
            CliSide::Sell => Side::Sell,
        }
    }
}

fn handle_add(side: CliSide, price: i64, quantity: i64) {
    let mut book = OrderBook::new();
    let id = rand::rng().random::<u64>();
    match submit_limit(&mut book, id, side.into(), price, quantity) {
        Ok(trades) => {
            if trades.is_empty() {
                println!("order {id} added, no trades");
            } else {
                println!("order {id} added, {} trade(s):", trades.len());
                for t in trades {
                    println!("  {t:?}");
                }
            }
        }
        Err(e) => println!("order rejected: {e}"),
    }
    let mut out = Vec::new();
    book.print_book(&mut out).unwrap();
    print!("{}", String::from_utf8_lossy(&out));
}

fn run_demo(orders_per_producer: u64) {
    let engine = Arc::new(AsyncEngine::new());
    info!(orders_per_producer, "starting demo");

    let mut producers = Vec::new();
    for p in 0..2u64 {
        let engine = engine.clone();
        producers.push(thread::spawn(move || {
            for i in 0..orders_per_producer {
                let id = p * 1_000_000 + i;
                let side = if p == 0 { Side::Sell } else { Side::Buy };
                let price = 100 + (i as i64 % 3) - 1;
                if let Ok(order) = Order::new(id, side, price, 1) {
                    engine.submit(order);
                }
                thread::sleep(Duration::from_millis(1));
            }
        }));
    }
    for p in producers {
        p.join().unwrap();
    }

    engine.shutdown();

    let mut total_trades = 0usize;
    while let Some(EngineEvent::TradeBatch { trades }) = engine.wait_event() {
        total_trades += trades.len();
        for t in trades {
            println!("{t:?}");
        }
    }
    println!("demo done: {total_trades} trade(s) emitted");
}

pub fn run() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Add { side, price, quantity } => handle_add(side, price, quantity),
        Commands::Demo { orders_per_producer } => run_demo(orders_per_producer),
    }
}

//! One process-wide session: every worker thread reads the orders through
//! the same shared context.
//!
//! Run with: `cargo run --example shared_singleton`

use ferrous_session::{factory_fn, BoxError, ScopeConfig, ScopeManager};
use std::thread;

#[derive(Debug)]
struct Order {
    customer: &'static str,
    total: u32,
}

struct WestwindEntities {
    orders: Vec<Order>,
}

fn open_westwind() -> Result<WestwindEntities, BoxError> {
    println!("opening the shared context");
    Ok(WestwindEntities {
        orders: vec![
            Order { customer: "Ann Devon", total: 120 },
            Order { customer: "Tom Hardy", total: 45 },
            Order { customer: "Liu Wong", total: 80 },
        ],
    })
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let manager = ScopeManager::with_config(factory_fn(open_westwind), ScopeConfig::default().with_log_events(true));

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let manager = manager.clone();
            thread::spawn(move || -> Result<(), ferrous_session::ScopeError> {
                let db = manager.get_or_create_singleton()?;
                let mut orders: Vec<_> = db.orders.iter().collect();
                orders.sort_by_key(|o| o.total);
                for order in orders {
                    println!("[worker {}] {} has an order costing {}.", worker, order.customer, order.total);
                }
                println!("[worker {}] used {}", worker, db.id());
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        match worker.join() {
            Ok(result) => result?,
            Err(_) => return Err("worker thread panicked".into()),
        }
    }

    println!("singleton constructions: {}", manager.metrics().singleton_constructions);
    manager.shutdown();
    Ok(())
}

//! One session per unit of work: query the orders, raise the cheapest one
//! and print them again, all inside a single transient session.
//!
//! Run with: `cargo run --example console_transient`

use ferrous_session::{factory_fn, BoxError, ScopeManager};
use parking_lot::Mutex;

// ===== In-memory data access =====

#[derive(Debug, Clone)]
struct Customer {
    first_name: &'static str,
    last_name: &'static str,
}

#[derive(Debug, Clone)]
struct Order {
    customer: Customer,
    total: u32,
}

struct WestwindEntities {
    orders: Mutex<Vec<Order>>,
}

impl WestwindEntities {
    fn open() -> Result<Self, BoxError> {
        let ann = Customer { first_name: "Ann", last_name: "Devon" };
        let tom = Customer { first_name: "Tom", last_name: "Hardy" };
        Ok(Self {
            orders: Mutex::new(vec![
                Order { customer: ann.clone(), total: 120 },
                Order { customer: tom, total: 45 },
                Order { customer: ann, total: 80 },
            ]),
        })
    }

    fn orders_by_total(&self) -> Vec<Order> {
        let mut orders = self.orders.lock().clone();
        orders.sort_by_key(|o| o.total);
        orders
    }

    fn add_to_cheapest(&self, amount: u32) {
        if let Some(order) = self.orders.lock().iter_mut().min_by_key(|o| o.total) {
            order.total += amount;
        }
    }
}

fn print_orders(db: &WestwindEntities) {
    for order in db.orders_by_total() {
        println!(
            "{} {} has an order costing {}.",
            order.customer.first_name, order.customer.last_name, order.total
        );
    }
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let manager = ScopeManager::new(
        factory_fn(WestwindEntities::open).on_release(|_: &WestwindEntities| println!("(context disposed)")),
    );

    manager.with_transient(|db| {
        print_orders(db);
        println!();

        db.add_to_cheapest(10);
        print_orders(db);
    })?;

    let metrics = manager.metrics();
    println!(
        "\ntransient constructions: {}, releases: {}",
        metrics.transient_constructions, metrics.releases
    );
    Ok(())
}

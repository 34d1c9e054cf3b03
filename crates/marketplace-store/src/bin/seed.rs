//! # Seed Cart Generator
//!
//! Writes a sample cart blob into a SQLite store for development, so the
//! app starts with a hydrated cart.
//!
//! ## Usage
//! ```bash
//! # Seed 5 lines into ./marketplace_dev.db (default)
//! cargo run -p marketplace-store --bin seed
//!
//! # Custom amount, path and namespace
//! cargo run -p marketplace-store --bin seed -- --count 12 --db ./data/cart.db --namespace Staging
//! ```
//!
//! Existing carts are left alone unless `--force` is given.

use std::env;

use marketplace_core::{codec, storage_key, Cart, NewLineItem, DEFAULT_NAMESPACE};
use marketplace_store::{KeyValueStore, SqliteStore, StoreConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Catalog used for sample lines: (title, price)
const CATALOG: &[(&str, f64)] = &[
    ("Camiseta Básica", 49.9),
    ("Tênis de Corrida", 299.9),
    ("Boné Aba Reta", 79.9),
    ("Mochila Urbana", 189.0),
    ("Meia Esportiva", 19.9),
    ("Jaqueta Corta-Vento", 249.5),
    ("Garrafa Térmica", 89.0),
    ("Óculos de Sol", 159.9),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut count = 5usize;
    let mut db_path = "./marketplace_dev.db".to_string();
    let mut namespace = DEFAULT_NAMESPACE.to_string();
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(5);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--namespace" | "-n" => {
                if i + 1 < args.len() {
                    namespace = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("GoMarketplace Cart Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>        Number of cart lines (default: 5)");
                println!("  -d, --db <PATH>        Database file path (default: ./marketplace_dev.db)");
                println!("  -n, --namespace <NS>   Key namespace (default: {})", DEFAULT_NAMESPACE);
                println!("  -f, --force            Overwrite an existing cart");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let key = storage_key(&namespace);
    info!(db = %db_path, key = %key, count, "Seeding cart");

    let store = SqliteStore::open(StoreConfig::new(&db_path)).await?;

    if !force {
        if let Some(existing) = store.get(&key).await? {
            warn!(
                bytes = existing.len(),
                "A cart is already stored under this key; pass --force to overwrite"
            );
            return Ok(());
        }
    }

    let cart = sample_cart(count)?;
    let blob = codec::encode(&cart)?;
    store.set(&key, &blob).await?;

    info!(
        lines = cart.len(),
        units = cart.total_quantity(),
        "Seed complete"
    );

    store.close().await;
    Ok(())
}

/// Builds a cart with `count` lines; line `n` has quantity `n % 3 + 1`.
fn sample_cart(count: usize) -> Result<Cart, marketplace_core::CoreError> {
    let mut cart = Cart::new();

    for n in 0..count {
        let (title, price) = CATALOG[n % CATALOG.len()];
        let round = n / CATALOG.len();
        let title = if round == 0 {
            title.to_string()
        } else {
            format!("{} #{}", title, round + 1)
        };

        let item = NewLineItem::new(
            format!("seed-{:04}", n),
            title,
            format!("https://images.gomarketplace.dev/seed/{:04}.png", n),
            price,
        );

        cart.add(item.clone())?;
        for _ in 0..(n % 3) {
            cart.add(item.clone())?;
        }
    }

    Ok(cart)
}

/// Initializes the tracing subscriber.
///
/// Default: `info`, overridable with `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,marketplace=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

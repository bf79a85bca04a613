//! # Seed Data Generator
//!
//! Populates a database with a demo catalog and an admin account.
//!
//! ## Usage
//! ```bash
//! cargo run -p duka-db --bin seed
//! cargo run -p duka-db --bin seed -- --db ./data/duka.db
//! cargo run -p duka-db --bin seed -- --admin owner --password s3cret!
//! ```

use std::env;

use duka_core::{Money, Product, Role};
use duka_db::{Database, DbConfig};

/// (category, barcode prefix, [(name, price in major units)])
const CATALOG: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "Grocery",
        "GRC",
        &[
            ("Sugar 1kg", 1000),
            ("Sugar 2kg", 1900),
            ("Rice 5kg", 4500),
            ("Maize Flour 2kg", 2200),
            ("Wheat Flour 2kg", 2600),
            ("Cooking Oil 1L", 3800),
            ("Salt 500g", 200),
            ("Tea Leaves 250g", 1500),
            ("Beans 1kg", 2800),
        ],
    ),
    (
        "Beverages",
        "BEV",
        &[
            ("Soda 500ml", 800),
            ("Mineral Water 1.5L", 1000),
            ("Mango Juice 1L", 3000),
            ("Milk 500ml", 1200),
        ],
    ),
    (
        "Household",
        "HSH",
        &[
            ("Bar Soap", 1500),
            ("Washing Powder 1kg", 4000),
            ("Matches (10)", 500),
            ("Candles (6)", 1200),
            ("Kerosene 1L", 3200),
        ],
    ),
    (
        "Personal Care",
        "PRC",
        &[
            ("Toothpaste 100ml", 2500),
            ("Body Lotion 400ml", 6500),
            ("Petroleum Jelly 250g", 3000),
        ],
    ),
    (
        "Snacks",
        "SNK",
        &[
            ("Biscuits", 500),
            ("Peanuts 100g", 700),
            ("Crisps 50g", 600),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./duka_dev.db");
    let mut admin = String::from("admin");
    let mut password = String::from("admin123");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" if i + 1 < args.len() => {
                db_path = args[i + 1].clone();
                i += 1;
            }
            "--admin" if i + 1 < args.len() => {
                admin = args[i + 1].clone();
                i += 1;
            }
            "--password" if i + 1 < args.len() => {
                password = args[i + 1].clone();
                i += 1;
            }
            "--help" | "-h" => {
                println!("Duka POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: ./duka_dev.db)");
                println!("      --admin <NAME>     Admin username (default: admin)");
                println!("      --password <PASS>  Admin password (default: admin123)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Duka POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().count().await? == 0 {
        db.users().create(&admin, &password, Role::Admin).await?;
        println!("✓ Created admin account '{}'", admin);
    } else {
        println!("• Accounts already exist, skipping admin");
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalog to avoid overwriting stock.");
        return Ok(());
    }

    let mut generated = 0;
    for (category_idx, (category, prefix, items)) in CATALOG.iter().enumerate() {
        for (item_idx, (name, price)) in items.iter().enumerate() {
            let barcode = format!("{}-{:03}", prefix, item_idx + 1);
            // Spread stock so a few items start low.
            let stock = ((category_idx * 7 + item_idx * 13) % 40) as i64;

            let product = Product::new(&barcode, name, Money::from_major(*price), stock, category);
            if let Err(e) = db.products().upsert(&product).await {
                eprintln!("Failed to insert {}: {}", barcode, e);
                continue;
            }
            generated += 1;
        }
    }

    println!("✓ Generated {} products", generated);

    let stats = db.reports().dashboard(duka_core::DEFAULT_LOW_STOCK_THRESHOLD).await?;
    println!(
        "  Inventory value: {}",
        Money::from_cents(stats.inventory_value_cents)
    );
    println!("  Low stock items: {}", stats.low_stock_count);

    db.close().await;
    Ok(())
}

//! # Demo Data Generator
//!
//! Creates a demo market with sellers and finalized receipts, then runs the
//! settlement once so reports have something to show.
//!
//! ## Usage
//! ```bash
//! # 20 sellers, 150 receipts (default)
//! cargo run -p flohmarkt-db --bin seed
//!
//! # Custom amounts and database
//! cargo run -p flohmarkt-db --bin seed -- --sellers 40 --receipts 400 --db ./demo.db
//! ```
//!
//! ## Generated Data
//! - Market "Demo-Flohmarkt" dated today
//! - Sellers numbered from 4001, every seventh one inactive
//! - Receipts with 1 to 6 items priced from the label ladder
//!
//! Generation is deterministic: the same options give the same data.

use chrono::Utc;
use std::env;

use flohmarkt_core::labels::DENOMINATION_LADDER;
use flohmarkt_core::{ArticleCode, Denomination, Seller, SellerId};
use flohmarkt_db::{Database, DbConfig};

const FIRST_NAMES: &[&str] = &[
    "Anna", "Ben", "Clara", "David", "Eva", "Felix", "Greta", "Hannes", "Ida", "Jonas", "Karla",
    "Lukas", "Mia", "Noah", "Olga", "Paul",
];

const LAST_NAMES: &[&str] = &[
    "Berger", "Fischer", "Hoffmann", "Keller", "Lang", "Meyer", "Neumann", "Schmidt", "Vogel",
    "Wagner", "Weber", "Zimmermann",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut seller_count: u16 = 20;
    let mut receipt_count: usize = 150;
    let mut db_path = String::from("./flohmarkt_demo.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sellers" | "-s" => {
                if i + 1 < args.len() {
                    seller_count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--receipts" | "-r" => {
                if i + 1 < args.len() {
                    receipt_count = args[i + 1].parse().unwrap_or(150);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Flohmarkt POS Demo Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sellers <N>   Number of sellers (default: 20)");
                println!("  -r, --receipts <N>  Number of finalized receipts (default: 150)");
                println!("  -d, --db <PATH>     Database file path (default: ./flohmarkt_demo.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let seller_count = seller_count.clamp(1, 5000);

    println!("🌱 Flohmarkt POS Demo Data Generator");
    println!("====================================");
    println!("Database: {}", db_path);
    println!("Sellers:  {}", seller_count);
    println!("Receipts: {}", receipt_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let market = db
        .markets()
        .create("Demo-Flohmarkt", Utc::now().date_naive())
        .await?;
    println!("✓ Market {} created ({})", market.id, market.date.format("%d.%m.%Y"));

    let mut active_ids = Vec::new();
    let mut skipped = 0;
    for n in 0..seller_count {
        let seller = generate_seller(n)?;
        match db.sellers().insert(&seller).await {
            Ok(stored) if stored.active => active_ids.push(stored.seller_id),
            Ok(_) => {}
            Err(e) => {
                skipped += 1;
                eprintln!("  Skipping seller {}: {}", seller.seller_id, e);
            }
        }
    }
    println!(
        "✓ {} sellers registered ({} active, {} skipped)",
        seller_count - skipped,
        active_ids.len(),
        skipped
    );

    if active_ids.is_empty() {
        println!("⚠ No active sellers, nothing to sell.");
        return Ok(());
    }

    println!();
    println!("Ringing up receipts...");
    let start = std::time::Instant::now();

    for r in 0..receipt_count {
        let receipt = db.receipts().current_open(market.id).await?;
        for item in 0..(1 + r % 6) {
            let seed = r * 31 + item * 7;
            let seller_id = active_ids[seed % active_ids.len()];
            let price = Denomination::new(DENOMINATION_LADDER[seed % DENOMINATION_LADDER.len()] as u32)?;
            db.receipts()
                .append_item(&receipt.id, ArticleCode::encode(seller_id, price))
                .await?;
        }
        db.receipts().finalize(&receipt.id).await?;

        if (r + 1) % 50 == 0 {
            println!("  Finalized {} receipts...", r + 1);
        }
    }

    println!("✓ Finalized {} receipts in {:?}", receipt_count, start.elapsed());

    println!();
    println!("Running settlement...");
    let run = db.settlements().run(market.id).await?;
    println!("  Sellers: {}", run.records.len());
    println!("  Items:   {}", run.item_count());
    println!("  Revenue: {}", run.revenue());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds the n-th demo seller.
fn generate_seller(n: u16) -> Result<Seller, Box<dyn std::error::Error>> {
    let first = FIRST_NAMES[n as usize % FIRST_NAMES.len()];
    let last = LAST_NAMES[(n as usize * 5) % LAST_NAMES.len()];

    Ok(Seller {
        seller_id: SellerId::new(flohmarkt_core::FIRST_SELLER_ID + n)?,
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: Some(format!(
            "{}.{}@example.org",
            first.to_lowercase(),
            last.to_lowercase()
        )),
        active: n % 7 != 6,
    })
}

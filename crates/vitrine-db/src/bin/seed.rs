//! # Seed Data Generator
//!
//! Populates the database with demo designs and coupons for development.
//!
//! ## Usage
//! ```bash
//! # Generate 60 designs (default) plus the demo coupons
//! cargo run -p vitrine-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p vitrine-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p vitrine-db --bin seed -- --db ./data/vitrine.db
//! ```
//!
//! ## Generated Data
//! - Designs: `{Collection} {Motif}` titles, $14.00 - $45.00, stock 0 - 40
//! - Coupons:
//!   - `WELCOME10`: 10% off, unlimited
//!   - `FIVEOFF`: $5.00 off orders of $30.00 or more, 100 uses
//!   - `VIP25`: 25% off, 10 uses

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;
use vitrine_core::{DiscountType, NewCoupon, Product};
use vitrine_db::{Database, DbConfig};

/// Collections and motifs combined into design titles
const COLLECTIONS: &[(&str, &[&str])] = &[
    (
        "Coastline",
        &["Wave", "Lighthouse", "Gull", "Tide", "Anchor", "Reef"],
    ),
    (
        "Botanica",
        &["Fern", "Monstera", "Olive Branch", "Lotus", "Thistle", "Ivy"],
    ),
    (
        "Metro",
        &["Skyline", "Subway Map", "Neon Sign", "Bridge", "Crosswalk", "Rooftop"],
    ),
    (
        "Cosmos",
        &["Orbit", "Nebula", "Comet", "Moon Phase", "Constellation", "Eclipse"],
    ),
    (
        "Grid",
        &["Checker", "Stripe", "Dots", "Halftone", "Maze", "Lattice"],
    ),
];

const DESIGNERS: &[&str] = &["designer-ana", "designer-kofi", "designer-lin"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./data/vitrine.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
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
                println!("Vitrine Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of designs to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./data/vitrine.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Vitrine Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Designs:  {}", count);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} designs", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating designs...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (collection, motifs) in COLLECTIONS.iter() {
        for motif in motifs.iter() {
            for variant in 1..=2 {
                if generated >= count {
                    break 'outer;
                }

                let product = generate_product(collection, motif, variant, generated);
                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.title, e);
                    continue;
                }

                generated += 1;
            }
        }
    }

    println!("✓ Generated {} designs in {:?}", generated, start.elapsed());

    println!();
    println!("Creating coupons...");

    let now = Utc::now();
    for new in demo_coupons(now) {
        let code = new.code.clone();
        let coupon = new.into_coupon(Uuid::new_v4().to_string(), now);
        match db.coupons().insert(&coupon).await {
            Ok(_) => println!("  {} ✓", code),
            Err(e) => eprintln!("  {} failed: {}", code, e),
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single design with deterministic pseudo-random data.
fn generate_product(collection: &str, motif: &str, variant: usize, seed: usize) -> Product {
    let now = Utc::now();

    // $14.00 - $45.00 in whole dollars
    let price_cents = (14 + ((seed * 7) % 32) as i64) * 100;

    // 0 - 40 units, a few sold out
    let stock = ((seed * 13) % 41) as i64;

    let title = if variant == 1 {
        format!("{} {}", collection, motif)
    } else {
        format!("{} {} II", collection, motif)
    };

    let slug = title.to_lowercase().replace(' ', "-");

    Product {
        id: Uuid::new_v4().to_string(),
        title,
        price_cents,
        stock,
        sales: 0,
        image: Some(format!("https://cdn.vitrine.dev/designs/{}.png", slug)),
        designer_id: Some(DESIGNERS[seed % DESIGNERS.len()].to_string()),
        created_at: now,
        updated_at: now,
    }
}

fn demo_coupons(now: chrono::DateTime<Utc>) -> Vec<NewCoupon> {
    vec![
        NewCoupon {
            code: "WELCOME10".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 1000,
            min_purchase_cents: 0,
            expires_at: now + Duration::days(365),
            usage_limit: None,
            assigned_to: None,
            is_active: true,
        },
        NewCoupon {
            code: "FIVEOFF".to_string(),
            discount_type: DiscountType::FixedAmount,
            discount_value: 500,
            min_purchase_cents: 3000,
            expires_at: now + Duration::days(90),
            usage_limit: Some(100),
            assigned_to: None,
            is_active: true,
        },
        NewCoupon {
            code: "VIP25".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 2500,
            min_purchase_cents: 0,
            expires_at: now + Duration::days(30),
            usage_limit: Some(10),
            assigned_to: None,
            is_active: true,
        },
    ]
}

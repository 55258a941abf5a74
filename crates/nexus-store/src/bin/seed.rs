//! # Seed Data Generator
//!
//! Opens a store (seeding the first unit and admin if it is empty) and
//! optionally loads a small demo catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Seed using nexus.toml / NEXUS_* environment
//! cargo run -p nexus-store --bin seed
//!
//! # Seed a JSON store in ./data with demo products and transactions
//! cargo run -p nexus-store --bin seed -- --data-dir ./data --demo
//!
//! # Same, on SQLite
//! cargo run -p nexus-store --bin seed -- --backend sqlite --data-dir ./data --demo
//! ```

use chrono::Utc;
use std::env;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use nexus_core::{
    Identity, Money, MovementKind, NewMovement, NewProduct, NewTransaction, TransactionKind,
};
use nexus_store::{BackendKind, Store, StoreConfig};

/// (name, sku, min stock, opening stock, cost in cents)
const PRODUCTS: &[(&str, &str, i64, i64, i64)] = &[
    ("Café Torrado 500g", "CAF-500", 10, 40, 1890),
    ("Arroz Tipo 1 5kg", "ARR-5KG", 8, 25, 2450),
    ("Feijão Carioca 1kg", "FEI-1KG", 12, 30, 899),
    ("Óleo de Soja 900ml", "OLE-900", 15, 12, 749),
    ("Açúcar Cristal 1kg", "ACU-1KG", 10, 50, 465),
    ("Papel A4 500 folhas", "PAP-A4", 5, 3, 2990),
];

/// (type, amount in major units, category, description, payment method)
const TRANSACTIONS: &[(TransactionKind, i64, &str, &str, &str)] = &[
    (TransactionKind::Income, 4200, "Sales", "Vendas da semana", "Pix"),
    (TransactionKind::Expense, 3500, "Rent", "Aluguel", "Boleto"),
    (TransactionKind::Expense, 480, "Utilities", "Energia elétrica", "Débito"),
    (TransactionKind::Expense, 1200, "Payroll", "Adiantamento", "Transferência"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut data_dir: Option<PathBuf> = None;
    let mut backend: Option<BackendKind> = None;
    let mut demo = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--data-dir" | "-d" => {
                if i + 1 < args.len() {
                    data_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--backend" | "-b" => {
                if i + 1 < args.len() {
                    backend = Some(args[i + 1].parse()?);
                    i += 1;
                }
            }
            "--demo" => demo = true,
            "--help" | "-h" => {
                println!("Nexus ERP Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>     Config file (default: platform nexus.toml)");
                println!("  -d, --data-dir <PATH>   Data directory override");
                println!("  -b, --backend <KIND>    memory | json | sqlite");
                println!("      --demo              Add demo products and transactions");
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = StoreConfig::load(config_path)?;
    if let Some(dir) = data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(kind) = backend {
        config = config.with_backend(kind);
    }
    config.validate()?;

    println!("🌱 Nexus ERP Seed Data Generator");
    println!("================================");
    println!("Backend:  {}", config.backend());
    if let Some(path) = config.snapshot_path() {
        println!("Snapshot: {}", path.display());
    }
    println!();

    let store = Store::from_config(&config).await?;
    println!("✓ Store opened");
    println!(
        "  {} unit(s), {} user(s), {} product(s)",
        store.units().len(),
        store.users().len(),
        store.products().len()
    );

    if demo {
        if store.products().is_empty() {
            load_demo(&store)?;
        } else {
            println!("⚠ Store already has products, skipping demo data.");
        }
    }

    let status = store.shutdown().await;
    if status.is_healthy() {
        println!();
        println!("✓ Snapshot saved ({} write(s))", status.saved_count);
        println!("  Sign in as {}", config.seed.admin_email);
    } else {
        eprintln!(
            "⚠ Snapshot not saved: {}",
            status.last_error.unwrap_or_default()
        );
    }

    Ok(())
}

fn load_demo(store: &Store) -> Result<(), Box<dyn std::error::Error>> {
    let actor = Identity::system();
    let unit_id = store
        .units()
        .first()
        .map(|u| u.id.clone())
        .ok_or("store has no unit to attach demo data to")?;
    let today = Utc::now().date_naive();

    println!();
    println!("Adding demo data...");

    for (name, sku, min_stock, stock, cost) in PRODUCTS {
        store.add_product(
            &actor,
            NewProduct {
                name: name.to_string(),
                sku: sku.to_string(),
                unit_id: unit_id.clone(),
                min_stock: *min_stock,
                current_stock: *stock,
                cost_price: Money::from_cents(*cost),
                image_ref: None,
            },
        )?;
    }
    println!("✓ {} products", PRODUCTS.len());

    // A sale and a restock, both linked to finance.
    let products = store.products();
    if let Some(first) = products.first() {
        store.record_movement(
            &actor,
            NewMovement {
                product_id: first.id.clone(),
                kind: MovementKind::Out,
                quantity: 4,
                date: today,
                reason: "Venda balcão".into(),
            },
            true,
        )?;
    }
    if let Some(last) = products.last() {
        store.record_movement(
            &actor,
            NewMovement {
                product_id: last.id.clone(),
                kind: MovementKind::In,
                quantity: 10,
                date: today,
                reason: "Reposição".into(),
            },
            true,
        )?;
    }
    println!("✓ 2 stock movements");

    for (kind, amount, category, description, method) in TRANSACTIONS {
        store.create_transaction(
            &actor,
            NewTransaction {
                kind: *kind,
                amount: Money::from_major(*amount),
                date: today,
                category: category.to_string(),
                description: description.to_string(),
                payment_method: method.to_string(),
                unit_id: unit_id.clone(),
                attachment_ref: None,
            },
        )?;
    }
    println!("✓ {} transactions (pending approval)", TRANSACTIONS.len());

    let low = store.low_stock(None);
    println!("  {} product(s) at or below minimum stock", low.len());

    Ok(())
}

/// `RUST_LOG` wins; otherwise info with debug for the nexus crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nexus=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

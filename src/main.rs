use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use assets_ledger::config::init_tracing;
use assets_ledger::import::{import_customers, load_customers};
use assets_ledger::{execute, Function, LedgerConfig};

#[derive(Parser)]
#[command(name = "assets-ledger", version, about = "Due-diligence records on a versioned ledger")]
struct Cli {
    #[command(flatten)]
    ledger: LedgerConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Invoke one ledger function, e.g. `invoke getCustomerInfo Acme`
    Invoke {
        function: String,
        args: Vec<String>,
    },
    /// Bulk-load customers from CSV (one transaction per row)
    Import { csv: PathBuf },
    /// Show ledger height and latest transaction
    Info,
}

fn main() -> Result<()> {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();
    init_tracing("assets_ledger=info");

    let cli = Cli::parse();
    // One-off invocations must outlive the process: always SQLite-backed
    let db_path = cli.ledger.durable_path();
    let store = cli
        .ledger
        .open_durable_store()
        .with_context(|| format!("Failed to open ledger {:?}", db_path))?;
    tracing::debug!(path = %db_path.display(), "ledger opened");

    match cli.command {
        Command::Invoke { function, args } => {
            let function: Function = function.parse()?;
            let response = execute(store.as_ref(), function, &args)?;

            println!("✓ {} (tx {})", function, response.tx_id);
            if !response.payload.is_empty() {
                println!("{}", serde_json::to_string_pretty(&response.payload_json()?)?);
            }
        }
        Command::Import { csv } => {
            println!("📂 Loading CSV...");
            let rows = load_customers(&csv)?;
            println!("✓ Loaded {} customers from CSV", rows.len());

            println!("\n💾 Submitting transactions...");
            let report = import_customers(store.as_ref(), &rows);
            println!("✓ Imported {} customers", report.imported);
            for (row, err) in &report.failed {
                eprintln!("❌ Row {}: {}", row, err);
            }
        }
        Command::Info => {
            let info = store.info()?;
            println!("⛓️  Channel {} / chaincode {}", cli.ledger.channel, cli.ledger.chaincode);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

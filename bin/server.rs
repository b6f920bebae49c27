// Assets Ledger - Web Server
// REST gateway over the ledger functions (axum)

use anyhow::{Context, Result};
use clap::Parser;

use assets_ledger::config::init_tracing;
use assets_ledger::gateway::{router, AppState};
use assets_ledger::GatewayConfig;

#[derive(Parser)]
#[command(name = "assets-server", version, about = "HTTP gateway for the assets ledger")]
struct Cli {
    #[command(flatten)]
    gateway: GatewayConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("assets_ledger=info,tower_http=info");

    let config = Cli::parse().gateway;

    println!("🌐 Assets Ledger - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Explicit store handle, shared by every request
    let store = config.ledger.open_store().context("Failed to open ledger")?;
    match &config.ledger.db_path {
        Some(path) => println!("✓ Ledger opened: {:?}", path),
        None => println!("✓ In-memory ledger (data is lost on exit)"),
    }

    let addr = config.listen_addr.clone();
    let app = router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   Chain: http://{}/getChainInfo", addr);
    println!("   API:   http://{}/api/health", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}

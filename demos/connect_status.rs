//! Connect to a rosbridge server, report status, disconnect.
//!
//! Demonstrates:
//! - Loading settings from the host's JSON settings blob
//! - The connect / status / disconnect acknowledgements
//! - Waiting for the handshake outcome
//!
//! Usage:
//!   cargo run --example connect_status
//!   cargo run --example connect_status -- --settings '{"host":"robot.local","port":9090}'
//!   cargo run --example connect_status -- --timeout-ms 3000 --debug
//!   cargo run --example connect_status -- --no-wait

// ============================================================================
// Imports
// ============================================================================

use anyhow::Context;
use rosbridge_connection::{BridgeSettings, ConnectionManager};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Args
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
struct Args {
    debug: bool,
    no_wait: bool,
    settings: Option<String>,
    timeout_ms: Option<u64>,
}

impl Args {
    /// Parse command-line arguments.
    fn parse() -> Self {
        let mut args = Self::default();
        let mut iter = std::env::args().skip(1);

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug" => args.debug = true,
                "--no-wait" => args.no_wait = true,
                "--settings" => args.settings = iter.next(),
                "--timeout-ms" => args.timeout_ms = iter.next().and_then(|v| v.parse().ok()),
                other => eprintln!("[WARN] Ignoring unknown argument: {other}"),
            }
        }

        args
    }
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "rosbridge_connection=debug"
    } else {
        "rosbridge_connection=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== rosbridge connect / status / disconnect ===\n");

    let mut settings = match &args.settings {
        Some(json) => BridgeSettings::from_json(json).context("invalid --settings")?,
        None => BridgeSettings::default(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        settings.connect_timeout_ms = Some(timeout_ms);
        settings.validate()?;
    }

    println!("[Setup] Endpoint: {}", settings.endpoint());
    let manager = ConnectionManager::new(settings);
    println!("[Status] {}\n", manager.status());

    println!("[Connect] {}", manager.connect().await);
    println!("[Connect] {}", manager.connect().await);

    let status = manager.settled().await;
    println!("[Status] {}", status);
    println!("[Status] {}\n", serde_json::to_string(&status)?);

    if status.is_connected() && !args.no_wait {
        println!("Press Ctrl+C to disconnect...");
        tokio::signal::ctrl_c().await.ok();
    }

    println!("[Disconnect] {}", manager.disconnect().await);
    println!("[Disconnect] {}", manager.disconnect().await);
    println!("[Status] {}", manager.status());

    Ok(())
}

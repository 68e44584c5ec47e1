//! # Recital - Poem Practice Server
//!
//! The main binary for the Recital recitation trainer.
//!
//! This application provides:
//! - HTTP JSON API server (axum-based) with an optional static front-end
//! - CLI interface for library operations and practice draws
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/recital (THE BINARY)              │
//! │                                                      │
//! │    ┌─────────────┐            ┌─────────────┐        │
//! │    │    CLI      │            │  HTTP API   │        │
//! │    │   (clap)    │            │   (axum)    │        │
//! │    └──────┬──────┘            └──────┬──────┘        │
//! │           └──────────────┬───────────┘               │
//! │                          ▼                           │
//! │                 ┌─────────────────┐                  │
//! │                 │  recital-core   │                  │
//! │                 │ (sampler+store) │                  │
//! │                 └─────────────────┘                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server with the bundled front-end
//! recital server --host 0.0.0.0 --port 5000 --public-dir public
//!
//! # CLI operations
//! recital add "静夜思" --file poem.txt
//! recital study "静夜思"
//! recital draw --count 3
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments first so --verbose can shape the log filter
    let cli = cli::Cli::parse();

    init_tracing(cli.verbose);

    if !cli.quiet {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing. `RECITAL_LOG_FORMAT=json` enables machine-parseable output.
fn init_tracing(verbose: bool) {
    let log_format = std::env::var("RECITAL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if verbose {
        "recital=debug,recital_core=debug,tower_http=debug"
    } else {
        "recital=info,recital_core=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Print the Recital startup banner.
fn print_banner() {
    println!(
        r#"
  ┬─┐┌─┐┌─┐┬┌┬┐┌─┐┬
  ├┬┘├┤ │  │ │ ├─┤│
  ┴└─└─┘└─┘┴ ┴ ┴ ┴┴─┘

  Poem Practice Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}

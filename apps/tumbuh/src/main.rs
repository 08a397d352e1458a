//! # Tumbuh - Child Growth Screening
//!
//! The main binary for Tumbuh.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/tumbuh (THE BINARY)          │
//! │                                              │
//! │  ┌─────────────┐        ┌─────────────────┐  │
//! │  │    CLI      │        │  Config (TOML)  │  │
//! │  │   (clap)    │        │  + CSV result   │  │
//! │  └──────┬──────┘        └────────┬────────┘  │
//! │         └───────────┬────────────┘           │
//! │                     ▼                        │
//! │             ┌───────────────┐                │
//! │             │  tumbuh-core  │                │
//! │             │  (THE LOGIC)  │                │
//! │             └───────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! tumbuh evaluate -n Ani -s P -b 2015-01-01 -H 128.5 -W 25 --class 4
//! tumbuh evaluate -s male -b 2016-03-10 -H 118 -W 21 -p median-sd
//! tumbuh zscore -s female -i hfa -m 113 -x 128.5
//! tumbuh recap --log results.csv
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tumbuh::cli;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing: TUMBUH_LOG_FORMAT=json enables machine-parseable output.
    // Logs go to stderr so --json-mode output on stdout stays clean.
    let log_format = std::env::var("TUMBUH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose { "tumbuh=debug" } else { "tumbuh=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Tumbuh startup banner.
fn print_banner() {
    println!(
        r#"
  ████████╗██╗   ██╗███╗   ███╗██████╗ ██╗   ██╗██╗  ██╗
  ╚══██╔══╝██║   ██║████╗ ████║██╔══██╗██║   ██║██║  ██║
     ██║   ██║   ██║██╔████╔██║██████╔╝██║   ██║███████║
     ██║   ██║   ██║██║╚██╔╝██║██╔══██╗██║   ██║██╔══██║
     ██║   ╚██████╔╝██║ ╚═╝ ██║██████╔╝╚██████╔╝██║  ██║
     ╚═╝    ╚═════╝ ╚═╝     ╚═╝╚═════╝  ╚═════╝ ╚═╝  ╚═╝

  Child Growth Screening v{}

  Height-for-age • Weight-for-age • WHO LMS
"#,
        env!("CARGO_PKG_VERSION")
    );
}

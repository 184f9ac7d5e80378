//! # Wayfarer - Learning Journey Server
//!
//! Binary entry point. Sets up tracing, parses the CLI, and dispatches.

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use wayfarer::cli::{self, Cli};

const BANNER: &str = r"
 _      __           ____
| | /| / /__ ___ __ / __/__ _____ ___ ____
| |/ |/ / _ `/ // // _// _ `/ __// -_) __/
|__/|__/\_,_/\_, //_/  \_,_/_/   \__/_/
            /___/
";

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "wayfarer=debug,wayfarer_core=debug,tower_http=debug"
    } else {
        "wayfarer=info,tower_http=debug"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let json_logs = std::env::var("WAYFARER_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !cli.quiet {
        println!("{BANNER}");
        println!("wayfarer v{}", env!("CARGO_PKG_VERSION"));
        println!();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!(event = "command_failed", error = %e, "Command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

//! geopick CLI entry point
//!
//! Address picker engine - CLI + HTTP API

use geopick::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

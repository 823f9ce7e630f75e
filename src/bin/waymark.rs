//! Waymark CLI Binary
//!
//! Command-line interface for the waymark catalog browser.

use clap::Parser;
use std::process;
use waymark::tooling::cli::{Cli, CliContext};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Create CLI context
    let context = match CliContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = context.init_logging(&cli) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    // Execute command
    match context.execute(&cli.command).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retouch - a self-hosted AI image editing playground.
//!
//! Binary entry point: loads configuration, then serves the HTTP API.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use clap::{Parser, Subcommand};

/// Retouch - a self-hosted AI image editing playground.
#[derive(Parser, Debug)]
#[command(name = "retouch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Retouch API server.
    Serve,
    /// Validate and print the resolved configuration.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match retouch_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            retouch_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level when set.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Some(Commands::Check) => print_config(&config),
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run(config).await {
                tracing::error!(error = %e, "server exited with error");
                std::process::exit(1);
            }
        }
    }
}

/// Print the resolved configuration with secrets redacted.
fn print_config(config: &retouch_config::RetouchConfig) {
    println!("[server]");
    println!("host = {:?}", config.server.host);
    println!("port = {}", config.server.port);
    println!("log_level = {:?}", config.server.log_level);
    println!();
    println!("[provider]");
    println!(
        "api_key = {}",
        if config.provider.api_key.is_some() {
            "[redacted]"
        } else {
            "(unset)"
        }
    );
    println!("base_url = {:?}", config.provider.base_url);
    println!("model = {:?}", config.provider.model);
    println!("timeout_secs = {}", config.provider.timeout_secs);
    println!("max_retries = {}", config.provider.max_retries);
    println!(
        "retry_base_delay_ms = {}",
        config.provider.retry_base_delay_ms
    );
    println!();
    println!("[storage]");
    println!("mode = {:?}", config.storage.mode);
    println!("output_dir = {:?}", config.storage.output_dir);
    println!("database_path = {:?}", config.storage.database_path);
    println!("history_path = {:?}", config.storage.history_path);
    println!("managed_platform = {}", config.storage.managed_platform);
    println!();
    println!("[auth]");
    println!(
        "password = {}",
        if config.auth.password.is_some() {
            "[redacted]"
        } else {
            "(unset)"
        }
    );
}

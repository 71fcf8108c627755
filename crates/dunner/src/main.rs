// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dunner - tiered invoice-collection email automation.
//!
//! This is the binary entry point for the Dunner engine.

use clap::{Parser, Subcommand};

mod app;
mod run;
mod serve;

/// Dunner - tiered invoice-collection email automation.
#[derive(Parser, Debug)]
#[command(name = "dunner", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway API and the run scheduler.
    Serve,
    /// Execute one automation run now.
    Run {
        /// Route every email to the configured test address.
        #[arg(long)]
        test: bool,
        /// Log emails instead of delivering them over SMTP.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the dry-run candidate report without sending.
    Preview,
    /// Validate and print the effective configuration.
    Config,
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dunner={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

fn print_config(config: &dunner_config::DunnerConfig) {
    match toml::to_string_pretty(config) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("dunner: failed to render config: {e}"),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match dunner_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            dunner_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.engine.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Run { test, dry_run }) => run::run_once(config, test, dry_run).await,
        Some(Commands::Preview) => run::run_preview(config).await,
        Some(Commands::Config) => {
            print_config(&config);
            Ok(())
        }
        None => {
            println!("dunner: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("dunner: {e}");
        std::process::exit(1);
    }
}

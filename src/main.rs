// Copyright 2026 LPSE Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use lpse_scraper::cli;

#[derive(Parser)]
#[command(
    name = "lpse",
    about = "LPSE tender scraper — drives headless Chromium through the SPSE portal's browser challenge and serves tender listings over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP scrape service
    Serve {
        /// Port to listen on (overrides LPSE_HTTP_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run a single scrape and print the result
    Scrape {
        /// Budget year to query (defaults to the current year)
        year: Option<i32>,
        /// Print the full result set as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download and install Chrome for Testing
    Install {
        /// Force reinstall even if Chromium is already installed
        #[arg(long)]
        force: bool,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => cli::serve_cmd::run(port).await,
        Commands::Scrape { year, json } => cli::scrape_cmd::run(year, json).await,
        Commands::Install { force } => cli::install_cmd::run(force).await,
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "lpse", &mut std::io::stdout());
            Ok(())
        }
    }
}

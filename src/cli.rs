//! CLI command definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mock GCM - a stateful test double for the push gateway's send API
#[derive(Parser, Debug)]
#[command(name = "mock-gcm")]
#[command(version)]
#[command(about = "Stateful mock of a push-notification gateway's multicast send endpoint")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the mock gateway until interrupted
    Serve {
        /// Secret expected in `Authorization: key=<secret>`
        #[arg(short = 'k', long, env = "MOCK_GCM_API_KEY")]
        api_key: Option<String>,

        /// Address to listen on
        #[arg(short, long, env = "MOCK_GCM_BIND")]
        bind: Option<String>,

        /// TOML preset with errors, canonical ids and a pending failure
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

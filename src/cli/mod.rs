pub mod commands;
pub mod context;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config;
use context::CliContext;

#[derive(Parser)]
#[command(name = "storefront-admin")]
#[command(about = "Storefront admin CLI - sessions, orders and shipment fulfillment")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in, sign out and inspect the current session")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Browse orders and change their status")]
    Orders {
        #[command(subcommand)]
        cmd: commands::orders::OrderCommands,
    },

    #[command(about = "Drive the shipment workflow for an order")]
    Shipment {
        #[command(subcommand)]
        cmd: commands::shipment::ShipmentCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = CliContext::from_config(config::config())?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx, output_format).await,
        Commands::Orders { cmd } => commands::orders::handle(cmd, &ctx, output_format).await,
        Commands::Shipment { cmd } => commands::shipment::handle(cmd, &ctx, output_format).await,
    }
}

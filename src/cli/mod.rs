pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docrest")]
#[command(about = "Serve REST endpoints generated from a collection/action definition")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Install the declared routes and start serving")]
    Serve {
        #[arg(short, long, env = "DOCREST_CONFIG", help = "Service definition (YAML or JSON)")]
        config: PathBuf,
        #[arg(short, long, help = "Port to listen on (overrides the definition and environment)")]
        port: Option<u16>,
    },

    #[command(about = "Validate a service definition and list the routes it declares")]
    Check {
        #[arg(short, long, env = "DOCREST_CONFIG", help = "Service definition (YAML or JSON)")]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

    match cli.command {
        Commands::Serve { config, port } => commands::serve::handle(&config, port).await,
        Commands::Check { config } => commands::check::handle(&config, output_format),
    }
}

//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chartmark_core::config;
use clap::Parser;

use crate::logging;

mod commands;

#[derive(Parser)]
#[command(name = "chartmark")]
#[command(version)]
#[command(about = "Render assistant replies to HTML and hydrate their charts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the reply comes from and how to read it.
#[derive(clap::Args, Debug, Clone, Default)]
struct InputArgs {
    /// Reply file to read (default: stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Treat the input as a backend turn body ({"response": ..} or {"error": ..})
    #[arg(long)]
    turn: bool,
}

impl From<&InputArgs> for commands::Input {
    fn from(args: &InputArgs) -> Self {
        commands::Input {
            file: args.file.clone(),
            turn: args.turn,
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Transform a reply and print its HTML fragment
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// Print the segment tree as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },

    /// Transform a reply, fetch and draw its charts, print the page
    Hydrate {
        #[command(flatten)]
        input: InputArgs,

        /// Base URL for relative chart references (overrides config)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Chart width in pixels applied after drawing (overrides config)
        #[arg(long, value_name = "PX")]
        width: Option<f64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // config commands work even when the config file is broken
    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        };
    }

    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config.log)?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli.command, &config).await })
}

async fn dispatch(command: Commands, config: &config::Config) -> Result<()> {
    match command {
        Commands::Render { input, json } => {
            commands::render::run(&commands::Input::from(&input), json, config)
        }
        Commands::Hydrate {
            input,
            base_url,
            width,
        } => {
            let input = commands::Input::from(&input);
            commands::hydrate::run(commands::hydrate::HydrateRunOptions {
                input: &input,
                base_url: base_url.as_deref(),
                width,
                config,
            })
            .await
        }
        // handled before the runtime starts
        Commands::Config { .. } => Ok(()),
    }
}

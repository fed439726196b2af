use clap::{Parser, Subcommand};
use miette::{miette, Result};
use std::path::PathBuf;

use promise_tracer_rs::cli;

#[derive(Parser)]
#[command(name = "promise-tracer")]
#[command(about = "Usage and escape analysis of promises and bindings from interpreter traces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay JSON Lines trace files and report every denoted value
    Replay {
        /// Input trace files
        #[arg(required = true)]
        traces: Vec<PathBuf>,

        /// JSON object of enable_<name>_analysis variables
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override one variable, e.g. --set enable_side_effect_analysis=FALSE
        #[arg(long = "set", value_name = "NAME=VALUE")]
        overrides: Vec<String>,

        /// Output format (json, text)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Abort on the first event that desynchronises the model
        #[arg(long)]
        strict: bool,
    },

    /// Print the effective analysis switches
    Switches {
        /// JSON object of enable_<name>_analysis variables
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override one variable
        #[arg(long = "set", value_name = "NAME=VALUE")]
        overrides: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            traces,
            config,
            overrides,
            format,
            output,
            strict,
        } => {
            let format = format
                .parse::<cli::replay::OutputFormat>()
                .map_err(|e| miette!("{}", e))?;
            let args = cli::replay::ReplayArgs {
                traces,
                config,
                overrides,
                format,
                output,
                strict,
            };
            cli::replay::replay(&args).map_err(|e| miette!("{}", e))
        }
        Commands::Switches { config, overrides } => {
            cli::switches::switches(config.as_deref(), &overrides).map_err(|e| miette!("{}", e))
        }
    }
}

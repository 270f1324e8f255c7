mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "docrag-cli", about = "Ask questions against a document", version)]
struct Cli {
    /// Configuration file (default: <config dir>/docrag/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Show how a document is split into chunks
    Chunks {
        /// Document to split (.txt, .md, or other plain text)
        file: PathBuf,
        /// Characters per chunk (overrides the configuration)
        #[arg(long)]
        size: Option<usize>,
    },

    /// Retrieve the chunks most relevant to a question
    Query {
        /// Document to index
        file: PathBuf,
        /// Question to answer
        question: String,
        /// Number of chunks to retrieve (overrides the configuration)
        #[arg(long)]
        k: Option<usize>,
        /// Print the formatted context block instead of a ranked list
        #[arg(long)]
        context: bool,
    },

    /// Build the index for a document and report its size
    Stats {
        /// Document to index
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let app = app::App::new(cli.config.as_deref())?;

    match cli.command {
        Command::Chunks { file, size } => {
            commands::chunks::run(&app, &file, size, &cli.format, use_color)?;
        }
        Command::Query { file, question, k, context } => {
            commands::query::run(&app, &file, &question, k, context, &cli.format, use_color)?;
        }
        Command::Stats { file } => {
            commands::stats::run(&app, &file, &cli.format)?;
        }
    }

    Ok(())
}

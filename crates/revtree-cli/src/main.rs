mod cmd_query;
mod cmd_render;
mod cmd_validate;
mod input;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "revtree")]
#[command(about = "Render, validate, and query revision tree documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log layout decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render revision tree documents to other formats
    Render {
        #[command(subcommand)]
        format: cmd_render::RenderFormat,
    },
    /// Validate a revision tree document
    Validate {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Query revision tree documents
    Query {
        #[command(subcommand)]
        op: cmd_query::QueryOp,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("REVTREE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render { format } => cmd_render::run(format),
        Commands::Validate { input } => cmd_validate::run(input),
        Commands::Query { op } => cmd_query::run(op, cli.pretty),
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use graph_hook::cli;

#[derive(Parser)]
#[command(
    name = "graph-hook",
    version,
    about = "Knowledge-graph context for AI coding assistant tool calls"
)]
struct Cli {
    /// More log output (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the host protocol on stdin/stdout
    Serve {
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// Augment one tool event read from stdin
    Hook {
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// Look up a single pattern in the graph
    Lookup {
        pattern: String,
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// Run a graph tool: list_repos, query, context, impact, detect_changes
    Tool {
        name: String,
        /// Tool arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// Show index presence and effective configuration
    Status {
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Cli::parse();

    let level = if opts.quiet {
        LevelFilter::ERROR
    } else {
        match opts.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match opts.command {
        Commands::Serve { cwd } => cli::serve::run_serve(cwd).await?,
        Commands::Hook { cwd } => cli::hook::run_hook(cwd).await?,
        Commands::Lookup { pattern, cwd } => cli::lookup::run_lookup(&pattern, cwd).await?,
        Commands::Tool { name, args, cwd } => {
            cli::tool::run_tool(&name, args.as_deref(), cwd).await?
        }
        Commands::Status { cwd } => cli::status::run_status(cwd).await?,
    }

    Ok(())
}

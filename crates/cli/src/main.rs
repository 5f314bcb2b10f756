mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version, about = "Static blog generator backed by a headless CMS", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Initialize new blog directory
    Init {
        /// Path to create blog directory
        path: PathBuf,

        /// Site title
        #[arg(long, default_value = "spacetraveling")]
        title: String,

        /// Content API endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Validate blog configuration
    Validate {
        /// Path to blog directory
        path: PathBuf,

        /// Also fetch the first page of posts from the CMS
        #[arg(long)]
        online: bool,
    },

    /// Preview site locally with on-demand post pages and hot reload
    Preview {
        /// Path to blog directory
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Serve built-in sample posts instead of querying the CMS
        #[arg(long)]
        offline: bool,
    },

    /// Build the static site
    Build {
        /// Path to blog directory
        path: PathBuf,

        /// Output directory for generated site
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List posts from the CMS feed
    Posts {
        /// Path to blog directory
        path: PathBuf,

        /// Maximum number of feed pages to load
        #[arg(long, default_value = "1")]
        pages: usize,

        /// Print the feed as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Init {
            path,
            title,
            endpoint,
        } => commands::init::run(path, title, endpoint).await,
        Command::Validate { path, online } => commands::validate::run(path, online).await,
        Command::Preview {
            path,
            port,
            offline,
        } => commands::preview::run(path, port, offline).await,
        Command::Build { path, output } => commands::build::run(path, output).await,
        Command::Posts { path, pages, json } => commands::posts::run(path, pages, json).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "spacetraveling", &mut io::stdout());
            Ok(())
        }
    }
}

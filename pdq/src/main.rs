//! pdq: PuppetDB Query - CLI for listing nodes and facts from PuppetDB.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "pdq")]
#[command(about = "PuppetDB Query - list nodes and facts matching a filter")]
#[command(version)]
struct Cli {
    /// PuppetDB base URL (overrides the config file and PUPPETDB_URL)
    #[arg(short = 'u', long = "url", global = true)]
    url: Option<String>,

    /// Config file (default: $PDQ_CONFIG or <config dir>/pdq/config.toml)
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List nodes matching a filter
    #[command(visible_alias = "n")]
    Nodes {
        /// Output format
        #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Filter terms (e.g., fact:osfamily=Debian resource:Class[Nginx] !name~^db)
        filter: Vec<String>,
    },

    /// Show facts for nodes matching a filter
    #[command(visible_alias = "f")]
    Facts {
        /// Fact to include (repeatable; default: all facts)
        #[arg(short = 'n', long = "fact")]
        facts: Vec<String>,

        /// Output format
        #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Filter terms selecting the nodes
        filter: Vec<String>,
    },

    /// Print the rendered query without contacting PuppetDB
    Render {
        /// Endpoint to render for
        #[arg(short = 'c', long = "context", value_enum, default_value_t = RenderContext::Nodes)]
        context: RenderContext,

        /// Filter terms
        filter: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RenderContext {
    /// Render for /nodes
    Nodes,
    /// Render for /facts
    Facts,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let target = commands::Target {
        url: cli.url,
        config: cli.config,
    };

    let result = match cli.command {
        Commands::Nodes { format, filter } => commands::nodes(&target, &filter, format),
        Commands::Facts { facts, format, filter } => commands::facts(&target, &facts, &filter, format),
        Commands::Render { context, filter } => commands::render(context, &filter),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

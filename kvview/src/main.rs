//! kvview: view log records stored in a key-value store.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

const ENVIRONMENT_HELP: &str = "\
Environment:
  KVROWS_ACCESS_TOKEN  Access token for managed stores (md:<database> URLs)
  KVROWS_ROOT          Directory holding config.toml and the default local store
  KVVIEW_LOG           Log filter for diagnostics on stderr (e.g. debug)";

#[derive(Parser)]
#[command(name = "kvview")]
#[command(about = "View logs and other records stored in a key-value store")]
#[command(version, after_help = ENVIRONMENT_HELP)]
struct Cli {
    /// Output JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Store URL: a DuckDB file path, file://<path>, :memory: or md:<database>
    #[arg(long)]
    url: Option<String>,

    /// Key prefix, comma-separated (e.g. logs,2024)
    #[arg(long)]
    prefix: Option<String>,

    /// Fields to hide, comma-separated
    #[arg(long)]
    exclude: Option<String>,

    /// Only show these fields, comma-separated (exclusive with --exclude)
    #[arg(long)]
    include: Option<String>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("KVVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let opts = commands::ViewOptions {
        json: cli.json,
        url: cli.url.as_deref(),
        prefix: cli.prefix.as_deref(),
        exclude: cli.exclude.as_deref(),
        include: cli.include.as_deref(),
    };

    if let Err(e) = commands::view(&opts) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

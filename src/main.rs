use clap::Parser;
use tracing_subscriber::EnvFilter;

use towerdocs::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    cli::run(cli).await
}

fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "towerdocs=debug,tower_http=debug"
    } else {
        "towerdocs=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}

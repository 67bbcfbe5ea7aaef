//! Command-line interface.

mod commands;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser, Debug)]
#[command(name = "towerdocs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tower design catalog and specification-sheet manager", long_about = None)]
pub struct Cli {
    /// Config file (skips auto-discovery)
    #[arg(short, long, global = true, env = "TOWERDOCS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory (database and local uploads)
    #[arg(long, global = true, env = "TOWERDOCS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Resolve relative config paths against the current directory
    #[arg(long, global = true)]
    pub cwd: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the web server
    Serve {
        /// Address to bind, e.g. 127.0.0.1:8080
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Create the database schema
    Init {
        /// Load the sample catalog when the database is empty
        #[arg(long)]
        seed: bool,
    },
    /// Show catalog statistics
    Stats,
    /// Print a bcrypt hash for ADMIN_PASSWORD
    HashPassword {
        /// Password to hash (read from stdin when omitted)
        password: Option<String>,
    },
}

/// Run a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings_with_options(LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data_dir: cli.data_dir,
    })
    .await;

    match cli.command {
        Commands::Serve { bind } => commands::serve::cmd_serve(settings, bind).await,
        Commands::Init { seed } => commands::init::cmd_init(&settings, seed).await,
        Commands::Stats => commands::stats::cmd_stats(&settings).await,
        Commands::HashPassword { password } => commands::password::cmd_hash_password(password),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "towerdocs",
            "serve",
            "--bind",
            "127.0.0.1:9000",
            "--data-dir",
            "/tmp/towers",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/towers")));
        match cli.command {
            Commands::Serve { bind } => assert_eq!(bind.as_deref(), Some("127.0.0.1:9000")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_init_seed_flag() {
        let cli = Cli::try_parse_from(["towerdocs", "init", "--seed"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { seed: true }));
    }
}

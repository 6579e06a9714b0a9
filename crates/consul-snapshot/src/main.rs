//! consul-snapshot - Consul KV, prepared query and ACL backups
//!
//! Entry point: parses the command line, sets up logging, runs the selected
//! command and turns its outcome into the process exit status.

mod cli;
mod commands;
mod health;
mod version;

use clap::Parser;
use consul_snapshot_core::Error;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Backup(args) => commands::backup::run(args).await,
        Commands::Restore(args) => commands::restore::run(args).await,
        Commands::Version(args) => commands::version::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            exit_code(&err)
        }
    }
}

/// 2 for a restore with per-key failures, 1 for everything else
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<Error>() {
        Some(Error::PartialRestore { .. }) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_restore_exits_with_two() {
        let err = anyhow::Error::new(Error::PartialRestore {
            failed: 3,
            succeeded: 7,
        });
        assert_eq!(exit_code(&err), ExitCode::from(2));
    }

    #[test]
    fn test_other_errors_exit_with_one() {
        let err = anyhow::Error::new(Error::Decrypt);
        assert_eq!(exit_code(&err), ExitCode::FAILURE);

        let err = anyhow::anyhow!("no storage bucket configured");
        assert_eq!(exit_code(&err), ExitCode::FAILURE);
    }

    #[test]
    fn test_context_keeps_partial_restore_visible() {
        use anyhow::Context;
        let result: std::result::Result<(), Error> = Err(Error::PartialRestore {
            failed: 1,
            succeeded: 0,
        });
        let err = result.context("restore failed").unwrap_err();
        assert_eq!(exit_code(&err), ExitCode::from(2));
    }
}

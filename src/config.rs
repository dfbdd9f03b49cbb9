//! Command line and environment configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::data::CELESTRAK_ACTIVE_URL;
use crate::propagation::PropagationTarget;

/// Satellite catalog ingestion and serving
#[derive(Debug, Parser)]
#[command(name = "spacedb-tracker")]
#[command(version)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "SPACEDB_DATABASE", default_value = "spacedb.sqlite3", global = true)]
    pub database: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch the catalog once, propagate it and store what is new
    Ingest(IngestArgs),
    /// Serve stored records over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Catalog endpoint returning a JSON array of OMM records
    #[arg(long, env = "SPACEDB_CATALOG_URL", default_value = CELESTRAK_ACTIVE_URL)]
    pub catalog_url: String,
    /// Read a local `.json` or `.json.gz` snapshot instead of the endpoint
    #[arg(long)]
    pub catalog_file: Option<PathBuf>,
    /// Instant the state vectors are computed for
    #[arg(long, value_enum, default_value_t = PropagationMode::Now)]
    pub propagate_to: PropagationMode,
    /// Records written per transaction
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,
    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl IngestArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long, env = "SPACEDB_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PropagationMode {
    /// Wall-clock time at the start of the run
    Now,
    /// Each element set's own epoch
    Epoch,
}

impl PropagationMode {
    /// Resolve to a target; `Now` is fixed once so a whole run shares one instant
    pub fn target(self) -> PropagationTarget {
        match self {
            Self::Now => PropagationTarget::Instant(chrono::Utc::now()),
            Self::Epoch => PropagationTarget::Epoch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_defaults() {
        let cli = Cli::try_parse_from(["spacedb-tracker", "ingest"]).unwrap();
        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.propagate_to, PropagationMode::Now);
        assert_eq!(args.batch_size, 500);
        assert_eq!(args.timeout(), Duration::from_secs(30));
        assert!(args.catalog_file.is_none());
    }

    #[test]
    fn ingest_flags() {
        let cli = Cli::try_parse_from([
            "spacedb-tracker",
            "--database",
            "/tmp/x.sqlite3",
            "ingest",
            "--catalog-file",
            "active.json.gz",
            "--propagate-to",
            "epoch",
            "--batch-size",
            "20",
        ])
        .unwrap();
        assert_eq!(cli.database, PathBuf::from("/tmp/x.sqlite3"));
        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.catalog_file, Some(PathBuf::from("active.json.gz")));
        assert_eq!(args.propagate_to.target(), PropagationTarget::Epoch);
        assert_eq!(args.batch_size, 20);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(Cli::try_parse_from(["spacedb-tracker", "ingest", "--batch-size", "0"]).is_err());
    }

    #[test]
    fn serve_bind_parses() {
        let cli = Cli::try_parse_from(["spacedb-tracker", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind.port(), 9000);
    }
}

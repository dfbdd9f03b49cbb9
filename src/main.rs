//! SpaceDB tracker entry point

use anyhow::{Context, Result};
use clap::Parser;

use spacedb_tracker::api;
use spacedb_tracker::config::{Cli, Commands, IngestArgs, ServeArgs};
use spacedb_tracker::data::{CatalogSource, FileCatalog, HttpCatalog};
use spacedb_tracker::ingest;
use spacedb_tracker::storage::Storage;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("Starting SpaceDB tracker...");

    let storage = Storage::open(&cli.database)
        .with_context(|| format!("failed to open database {:?}", cli.database))?;

    match cli.command {
        Commands::Ingest(args) => run_ingest(args, storage),
        Commands::Serve(args) => run_serve(args, storage),
    }
}

fn run_ingest(args: IngestArgs, mut storage: Storage) -> Result<()> {
    let source: Box<dyn CatalogSource> = match &args.catalog_file {
        Some(path) => Box::new(FileCatalog::new(path)),
        None => Box::new(HttpCatalog::new(args.catalog_url.as_str(), args.timeout())?),
    };

    let batch_size = usize::try_from(args.batch_size).context("batch size too large")?;
    let report = ingest::run(
        source.as_ref(),
        &mut storage,
        args.propagate_to.target(),
        batch_size,
    )
    .context("ingestion failed")?;

    storage.close().context("failed to close database")?;
    log::info!(
        "Stored {} new element sets and {} new state vectors",
        report.satellites.inserted,
        report.space_objects.inserted
    );
    Ok(())
}

fn run_serve(args: ServeArgs, storage: Storage) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(api::serve(args.bind, storage))
}

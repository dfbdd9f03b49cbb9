//! One bounded ingestion run: fetch, extract, write
//!
//! The catalog is fetched once and fully extracted before anything is
//! written. A bad record therefore leaves the database untouched. Writes go
//! out in fixed-size batches, each its own transaction.

use indicatif::{ProgressBar, ProgressStyle};

use crate::data::{extract_satellites, space_object_from, CatalogSource, SpaceObject};
use crate::error::{ExtractError, TrackerError};
use crate::propagation::PropagationTarget;
use crate::storage::{save_or_skip, Record, Storage, WriteReport};

/// Totals of one run, per table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub fetched: usize,
    pub satellites: WriteReport,
    pub space_objects: WriteReport,
}

/// Run one ingestion against `storage`
pub fn run(
    source: &dyn CatalogSource,
    storage: &mut Storage,
    target: PropagationTarget,
    batch_size: usize,
) -> Result<IngestReport, TrackerError> {
    log::info!("Ingesting catalog from {}", source.describe());
    let raw = source.fetch()?;

    let satellites = extract_satellites(&raw).map_err(ExtractError::from)?;
    let space_objects = satellites
        .iter()
        .map(|elements| space_object_from(elements, target))
        .collect::<Result<Vec<SpaceObject>, _>>()?;
    log::info!(
        "Extracted {} element sets and {} state vectors",
        satellites.len(),
        space_objects.len()
    );

    let batch_size = batch_size.max(1);
    let batches = satellites.len().div_ceil(batch_size) + space_objects.len().div_ceil(batch_size);
    let progress = ProgressBar::new(batches as u64);
    progress.set_style(
        ProgressStyle::with_template("{elapsed_precise} {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );

    let report = IngestReport {
        fetched: raw.len(),
        satellites: write_batches(&satellites, storage, batch_size, &progress)?,
        space_objects: write_batches(&space_objects, storage, batch_size, &progress)?,
    };
    progress.finish_and_clear();

    log::info!(
        "Ingestion done: {} records fetched; satellites {} new, {} known; space objects {} new, {} known",
        report.fetched,
        report.satellites.inserted,
        report.satellites.skipped + report.satellites.conflicts,
        report.space_objects.inserted,
        report.space_objects.skipped + report.space_objects.conflicts,
    );
    Ok(report)
}

fn write_batches<T: Record>(
    records: &[T],
    storage: &mut Storage,
    batch_size: usize,
    progress: &ProgressBar,
) -> Result<WriteReport, TrackerError> {
    progress.set_message(T::TABLE);
    let mut total = WriteReport::default();
    for batch in records.chunks(batch_size) {
        let report = save_or_skip(batch, storage)?;
        log::debug!(
            "{} batch: {} inserted, {} skipped",
            T::TABLE,
            report.inserted,
            report.skipped
        );
        total.absorb(report);
        progress.inc(1);
    }
    Ok(total)
}

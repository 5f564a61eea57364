//! Upload entry points: document in, stored students and standings out.
//!
//! [`ingest`] is the primary API. It resolves the input, reads the selected
//! pages through pdfium, streams the extracted records into storage and
//! re-ranks the population. [`ingest_pages`] runs the same core over any
//! page source, which is how callers with their own PDF reader (and the
//! tests) drive it. [`extract`] is a dry run that never touches storage.

use crate::config::IngestConfig;
use crate::error::GradesheetError;
use crate::output::{ExtractionOutput, IngestOutput, IngestStats, PageReport};
use crate::pipeline::assemble::PageContent;
use crate::pipeline::document::DocumentPipeline;
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::pdf;
use crate::store::StudentStore;
use crate::upsert::upsert_records;
use std::time::Instant;
use tracing::{info, warn};

/// Ingest a PDF file or URL into `store`.
///
/// # Returns
/// `Ok(IngestOutput)` when at least one record was extracted, even if every
/// one of them was a duplicate.
///
/// # Errors
/// - invalid input or not a PDF ([`GradesheetError::NotAPdf`])
/// - no page yielded a record ([`GradesheetError::NoRecordsFound`])
/// - the document became unreadable part-way; students stored before the
///   failure stay stored and ranked
/// - storage failures
pub async fn ingest<S>(
    input: impl AsRef<str>,
    config: &IngestConfig,
    store: &mut S,
) -> Result<IngestOutput, GradesheetError>
where
    S: StudentStore + ?Sized,
{
    let total_start = Instant::now();
    let input = input.as_ref();
    info!("Ingesting result sheet: {}", input);

    let resolved = input::resolve_input(input, config.download_timeout_secs).await?;
    ingest_resolved(&resolved, config, store, total_start).await
}

/// Ingest an uploaded document held in memory.
///
/// `name` is the client-side file name; only its base name is used.
pub async fn ingest_bytes<S>(
    name: &str,
    bytes: &[u8],
    config: &IngestConfig,
    store: &mut S,
) -> Result<IngestOutput, GradesheetError>
where
    S: StudentStore + ?Sized,
{
    let total_start = Instant::now();
    info!("Ingesting upload '{}' ({} bytes)", name, bytes.len());

    let resolved = input::resolve_bytes(name, bytes)?;
    ingest_resolved(&resolved, config, store, total_start).await
}

/// Synchronous wrapper around [`ingest`].
///
/// Creates a temporary tokio runtime internally.
pub fn ingest_sync<S>(
    input: impl AsRef<str>,
    config: &IngestConfig,
    store: &mut S,
) -> Result<IngestOutput, GradesheetError>
where
    S: StudentStore + ?Sized,
{
    tokio::runtime::Runtime::new()
        .map_err(|e| GradesheetError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(ingest(input, config, store))
}

/// Run extraction, upsert and ranking over an arbitrary page source.
///
/// `total_pages` is the number of pages the source will offer; it feeds
/// progress events and statistics.
pub fn ingest_pages<S, I>(
    pages: I,
    total_pages: usize,
    config: &IngestConfig,
    store: &mut S,
) -> Result<IngestOutput, GradesheetError>
where
    S: StudentStore + ?Sized,
    I: IntoIterator<Item = Result<PageContent, GradesheetError>>,
{
    let start = Instant::now();
    let mut pipeline = DocumentPipeline::new(pages, total_pages, config);

    let mut source_error = None;
    let records = pipeline.by_ref().map_while(|r| match r {
        Ok(record) => Some(record),
        Err(e) => {
            source_error = Some(e);
            None
        }
    });
    let upsert = upsert_records(store, records, config.tie_break)?;

    if let Some(e) = source_error {
        warn!(
            "Document failed after {} students were stored: {}",
            upsert.inserted.len(),
            e
        );
        return Err(e);
    }
    if upsert.records_seen == 0 {
        return Err(GradesheetError::NoRecordsFound {
            pages: pipeline.reports().len(),
        });
    }

    let dropped = pipeline.subject_rows_dropped();
    let pages = pipeline.into_reports();
    let elapsed = start.elapsed().as_millis() as u64;

    let mut stats = page_stats(&pages, total_pages);
    stats.records_extracted = upsert.records_seen;
    stats.students_inserted = upsert.inserted.len();
    stats.duplicates_skipped = upsert.duplicates.len();
    stats.subjects_inserted = upsert.subjects_inserted;
    stats.subject_rows_dropped = dropped;
    stats.store_duration_ms = elapsed;
    stats.total_duration_ms = elapsed;

    info!(
        "Ingested {} records: {} new, {} duplicates, {} students ranked",
        upsert.records_seen,
        upsert.inserted.len(),
        upsert.duplicates.len(),
        upsert.standings.len()
    );

    Ok(IngestOutput {
        records_extracted: upsert.records_seen,
        inserted: upsert.inserted,
        duplicates: upsert.duplicates,
        standings: upsert.standings,
        pages,
        stats,
    })
}

/// Extract records from a PDF file or URL without storing them.
pub async fn extract(
    input: impl AsRef<str>,
    config: &IngestConfig,
) -> Result<ExtractionOutput, GradesheetError> {
    let total_start = Instant::now();
    let resolved = input::resolve_input(input.as_ref(), config.download_timeout_secs).await?;

    let read_start = Instant::now();
    let doc = pdf::read_pages(resolved.path(), config).await?;
    let read_ms = read_start.elapsed().as_millis() as u64;

    let mut out = extract_pages(doc.pages, doc.selected, config)?;
    out.stats.extract_duration_ms = read_ms;
    out.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(out)
}

/// Run the document pipeline over a page source and collect the records.
///
/// Zero records is not an error here; a page-source failure is.
pub fn extract_pages<I>(
    pages: I,
    total_pages: usize,
    config: &IngestConfig,
) -> Result<ExtractionOutput, GradesheetError>
where
    I: IntoIterator<Item = Result<PageContent, GradesheetError>>,
{
    let mut pipeline = DocumentPipeline::new(pages, total_pages, config);
    let records = pipeline.by_ref().collect::<Result<Vec<_>, _>>()?;

    let dropped = pipeline.subject_rows_dropped();
    let pages = pipeline.into_reports();
    let mut stats = page_stats(&pages, total_pages);
    stats.records_extracted = records.len();
    stats.subject_rows_dropped = dropped;

    Ok(ExtractionOutput {
        records,
        pages,
        stats,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn ingest_resolved<S>(
    resolved: &ResolvedInput,
    config: &IngestConfig,
    store: &mut S,
    total_start: Instant,
) -> Result<IngestOutput, GradesheetError>
where
    S: StudentStore + ?Sized,
{
    let read_start = Instant::now();
    let doc = pdf::read_pages(resolved.path(), config).await?;
    let read_ms = read_start.elapsed().as_millis() as u64;
    info!(
        "Read {} of {} pages in {}ms",
        doc.pages.len(),
        doc.document_pages,
        read_ms
    );

    let mut out = ingest_pages(doc.pages, doc.selected, config, store)?;
    out.stats.extract_duration_ms = read_ms;
    out.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(out)
}

fn page_stats(pages: &[PageReport], total_pages: usize) -> IngestStats {
    let extracted = pages.iter().filter(|p| p.is_extracted()).count();
    IngestStats {
        total_pages,
        pages_extracted: extracted,
        pages_skipped: pages.len() - extracted,
        ..IngestStats::default()
    }
}

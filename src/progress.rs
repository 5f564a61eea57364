//! Progress-callback trait for per-page ingestion events.
//!
//! Inject an [`Arc<dyn IngestProgressCallback>`] via
//! [`crate::config::IngestConfigBuilder::progress_callback`] to receive
//! events as the document pipeline walks each page.
//!
//! # Example
//!
//! ```rust
//! use edgequake_gradesheet::{IngestConfig, IngestProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     extracted: Arc<AtomicUsize>,
//! }
//!
//! impl IngestProgressCallback for CountingCallback {
//!     fn on_page_extracted(&self, page_num: usize, total_pages: usize, roll_no: &str, subjects: usize) {
//!         self.extracted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} ({} subjects)", page_num, total_pages, roll_no, subjects);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     extracted: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = IngestConfig::builder()
//!     .progress_callback(counter as Arc<dyn IngestProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the document pipeline as it processes each page.
///
/// Pages are processed strictly in document order on a single thread, but
/// the config holding the callback may be shared, so implementations must be
/// `Send + Sync`. All methods default to no-ops.
pub trait IngestProgressCallback: Send + Sync {
    /// Called once after the document is opened.
    ///
    /// # Arguments
    /// * `total_pages` - number of pages that will be scanned
    fn on_ingest_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is handed to the page assembler.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called for each student record a page produced.
    ///
    /// # Arguments
    /// * `page_num` - 1-indexed page number
    /// * `total_pages` - pages being scanned
    /// * `roll_no` - natural key of the extracted student
    /// * `subjects` - accepted grade-table rows
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, roll_no: &str, subjects: usize) {
        let _ = (page_num, total_pages, roll_no, subjects);
    }

    /// Called when a page yields no record.
    ///
    /// # Arguments
    /// * `reason` - human-readable [`crate::error::PageMiss`] description
    fn on_page_skipped(&self, page_num: usize, total_pages: usize, reason: &str) {
        let _ = (page_num, total_pages, reason);
    }

    /// Called once after every page has been attempted.
    ///
    /// # Arguments
    /// * `total_pages` - pages scanned
    /// * `records_extracted` - student records produced
    fn on_ingest_complete(&self, total_pages: usize, records_extracted: usize) {
        let _ = (total_pages, records_extracted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl IngestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::IngestConfig`].
pub type ProgressCallback = Arc<dyn IngestProgressCallback>;

//! # edgequake-gradesheet
//!
//! Turn semester result sheets (PDF) into stored student records, ranks and
//! subject statistics.
//!
//! Each page of a result sheet carries one student summary (roll number,
//! name, father's name, branch, semester, SGPA) and one grade table. The
//! crate reads the page text and rebuilds the tables from positioned text,
//! pulls out the summary fields and subject rows, stores new students in
//! SQLite, and re-ranks the whole population after every upload.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file, URL or uploaded bytes; check %PDF
//!  ├─ 2. Read      page text + positioned runs via pdfium (spawn_blocking)
//!  ├─ 3. Layout    rebuild tables from runs
//!  ├─ 4. Assemble  summary fields + first grade table → StudentRecord
//!  ├─ 5. Upsert    insert-only by roll number, commit per student
//!  └─ 6. Rank      CGPA and rank for every stored student
//! ```
//!
//! Aggregation queries ([`topper`], [`subject_averages`],
//! [`student_report`]) read the same store independently.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_gradesheet::{ingest, IngestConfig, SqliteStore};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = SqliteStore::open(Path::new("gradesheet.sqlite"))?;
//!     let config = IngestConfig::default();
//!     let output = ingest("results-sem5.pdf", &config, &mut store).await?;
//!     println!("{} records extracted, {} new", output.records_extracted, output.inserted.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gradesheet` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-gradesheet = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod aggregate;
pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod ranking;
pub mod record;
pub mod store;
pub mod upsert;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use aggregate::{student_report, subject_averages, topper};
pub use config::{IngestConfig, IngestConfigBuilder, LayoutConfig, PageSelection, TableHeaders, TieBreak};
pub use error::{FieldError, GradesheetError, PageMiss, StoreError, StudentField};
pub use ingest::{extract, extract_pages, ingest, ingest_bytes, ingest_pages, ingest_sync};
pub use output::{ExtractionOutput, IngestOutput, IngestStats, PageReport, PageStatus, UpsertReport};
pub use pipeline::assemble::PageContent;
pub use pipeline::document::DocumentPipeline;
pub use progress::{IngestProgressCallback, NoopProgressCallback, ProgressCallback};
pub use ranking::{rank_population, recompute_standings};
pub use record::{
    PersistedStudent, PersistedSubject, Standing, StudentRecord, StudentReport, SubjectAverage, SubjectRecord,
};
pub use store::{SqliteStore, StudentStore};
pub use upsert::upsert_records;

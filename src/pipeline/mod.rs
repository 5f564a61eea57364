//! Pipeline stages for result-sheet extraction.
//!
//! Each submodule implements one step. Everything after [`pdf`] is pure
//! and works on plain strings, so it can be tested without pdfium.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pdf ──▶ layout ──▶ assemble ──▶ document
//! (path/URL) (pdfium) (tables)  (fields+table) (page loop)
//! ```
//!
//! 1. [`input`]    resolve the upload to a local file and check the PDF magic
//! 2. [`pdf`]      read page text and positioned runs in `spawn_blocking`
//! 3. [`layout`]   group runs into lines, cells and table regions
//! 4. [`fields`]   labelled summary fields, all-or-nothing per page
//! 5. [`table`]    pick the grade table by its headers and parse its rows
//! 6. [`assemble`] combine fields and subjects into `StudentRecord`s
//! 7. [`document`] walk the pages lazily and record what each one produced

pub mod assemble;
pub mod document;
pub mod fields;
pub mod input;
pub mod layout;
pub mod pdf;
pub mod table;

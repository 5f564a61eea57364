//! Document source: read page text and tabular regions through pdfium.
//!
//! pdfium is a blocking C library, so the whole document is read inside
//! `tokio::task::spawn_blocking` and handed back as plain [`PageContent`]
//! values. Page failures are recorded in order; the first one ends the read
//! because later pages of a damaged document are not trustworthy.

use crate::config::{IngestConfig, LayoutConfig, PageSelection};
use crate::error::GradesheetError;
use crate::pipeline::assemble::PageContent;
use crate::pipeline::layout::{detect_tables, TextRun};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Env var naming a pdfium library file or the directory holding it.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Pages read from one document, in selection order.
#[derive(Debug)]
pub struct DocumentPages {
    /// Page count of the whole document.
    pub document_pages: usize,
    /// Pages the selection asked for.
    pub selected: usize,
    /// One entry per page read. A trailing `Err` marks where reading stopped.
    pub pages: Vec<Result<PageContent, GradesheetError>>,
}

/// Bind pdfium: `PDFIUM_LIB_PATH` first, then the working directory, then
/// the system library.
pub fn bind_pdfium() -> Result<Pdfium, GradesheetError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            let path = PathBuf::from(raw);
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| GradesheetError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// Read the selected pages of a PDF.
pub async fn read_pages(pdf_path: &Path, config: &IngestConfig) -> Result<DocumentPages, GradesheetError> {
    let path = pdf_path.to_path_buf();
    let password = config.password.clone();
    let selection = config.pages.clone();
    let layout = config.layout;

    tokio::task::spawn_blocking(move || {
        read_pages_blocking(&path, password.as_deref(), &selection, &layout)
    })
    .await
    .map_err(|e| GradesheetError::Internal(format!("PDF reader task panicked: {e}")))?
}

fn read_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    selection: &PageSelection,
    layout: &LayoutConfig,
) -> Result<DocumentPages, GradesheetError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(pdf_path, password.is_some(), e))?;

    let pages = document.pages();
    let document_pages = pages.len() as usize;
    let indices = selection.to_indices(document_pages);
    info!(
        "Opened {} ({} pages, {} selected)",
        pdf_path.display(),
        document_pages,
        indices.len()
    );

    if indices.is_empty() && document_pages > 0 {
        return Err(GradesheetError::PageOutOfRange {
            page: first_requested(selection),
            total: document_pages,
        });
    }

    let mut out = Vec::with_capacity(indices.len());
    for &idx in &indices {
        match read_page(&pages, idx, layout) {
            Ok(content) => {
                debug!(
                    "Page {}: {} chars, {} tables",
                    content.page_num,
                    content.text.len(),
                    content.tables.len()
                );
                out.push(Ok(content));
            }
            Err(e) => {
                warn!("{}; abandoning remaining pages", e);
                out.push(Err(e));
                break;
            }
        }
    }

    Ok(DocumentPages {
        document_pages,
        selected: indices.len(),
        pages: out,
    })
}

fn read_page(pages: &PdfPages<'_>, idx: usize, layout: &LayoutConfig) -> Result<PageContent, GradesheetError> {
    let failed = |e: PdfiumError| GradesheetError::PageReadFailed {
        page: idx + 1,
        detail: format!("{e:?}"),
    };

    let page = pages.get(idx as u16).map_err(failed)?;
    let text = page.text().map_err(failed)?;

    let runs: Vec<TextRun> = text
        .segments()
        .iter()
        .filter_map(|segment| {
            let content = segment.text();
            if content.trim().is_empty() {
                return None;
            }
            let bounds = segment.bounds();
            Some(TextRun {
                text: content,
                left: bounds.left().value,
                right: bounds.right().value,
                top: bounds.top().value,
                bottom: bounds.bottom().value,
            })
        })
        .collect();

    Ok(PageContent {
        page_num: idx + 1,
        text: text.all(),
        tables: detect_tables(&runs, layout),
    })
}

fn load_error(path: &Path, has_password: bool, e: PdfiumError) -> GradesheetError {
    let detail = format!("{e:?}");
    if detail.to_lowercase().contains("password") {
        if has_password {
            GradesheetError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            GradesheetError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        GradesheetError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

fn first_requested(selection: &PageSelection) -> usize {
    match selection {
        PageSelection::All => 1,
        PageSelection::Single(p) => *p,
        PageSelection::Range(start, _) => *start,
        PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
    }
}

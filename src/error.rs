//! Error types for the pdf2figs library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the extraction run for this PDF cannot
//!   proceed (unreadable input, rendering backend crashed, detection output
//!   missing). Returned as `Err(ExtractError)` from the top-level `extract*`
//!   functions.
//!
//! * [`FigureError`] — **Non-fatal**: a single figure could not be cropped
//!   (missing page raster, inverted boundary) but the rest of the figure
//!   list is fine. Collected in [`crate::extract::FigureExtraction::skipped`]
//!   so callers can inspect partial success rather than losing every valid
//!   figure to one bad entry.
//!
//! A PDF that yields zero valid figures is still a successful run with an
//! empty figure list, never an error.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2figs library.
///
/// Per-figure failures use [`FigureError`] and are stored in
/// [`crate::extract::FigureExtraction`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Reading or writing a workspace file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Backend errors ────────────────────────────────────────────────────
    /// The rendering backend terminated abnormally.
    #[error("Rendering failed at {dpi} DPI: {detail}")]
    RenderFailed { dpi: u32, detail: String },

    /// The two rendering sets disagree on page count, so detection
    /// coordinates cannot be mapped onto crop rasters.
    #[error("Rendering sets disagree on page count: {low} pages at detection DPI, {high} at crop DPI")]
    PageCountMismatch { low: usize, high: usize },

    /// The caption/figure-location tool terminated abnormally.
    #[error("Caption tool failed: {detail}")]
    CaptionToolFailed { detail: String },

    /// The learned figure detector terminated abnormally.
    #[error("Figure detector failed: {detail}")]
    DetectorFailed { detail: String },

    /// A backend reported success but its declared output file is absent.
    #[error("Backend output missing: '{path}'")]
    MissingOutput { path: PathBuf },

    /// The detection document could not be parsed at all.
    ///
    /// Per-entry schema problems degrade to `unknown` fields and are
    /// filtered by the normalizer; this variant fires only when the
    /// document is not valid JSON of the expected shape.
    #[error("Malformed detection document '{path}': {source}")]
    MalformedDetections {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single figure.
///
/// The cropper skips the affected figure, logs the condition, and keeps
/// processing the rest of the list.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FigureError {
    /// The high-resolution page raster for this figure does not exist.
    #[error("Figure '{name}' on page {page}: page raster not found at '{path}'")]
    MissingPageImage {
        page: usize,
        name: String,
        path: PathBuf,
    },

    /// The entry's 0-based page index falls outside the rendered set.
    #[error("Figure '{name}': page index {page} outside rendered set of {total} pages")]
    PageOutOfRange {
        page: usize,
        name: String,
        total: usize,
    },

    /// The entry has no boundary rectangle to crop.
    #[error("Figure '{name}' on page {page}: no boundary rectangle")]
    MissingBoundary { page: usize, name: String },

    /// The boundary rectangle is empty or inverted after scaling.
    #[error("Figure '{name}' on page {page}: degenerate boundary ({x1},{y1})-({x2},{y2})")]
    DegenerateBoundary {
        page: usize,
        name: String,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
    },

    /// Opening or writing the image failed.
    #[error("Figure '{name}' on page {page}: crop failed: {detail}")]
    CropFailed {
        page: usize,
        name: String,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_mismatch_display() {
        let e = ExtractError::PageCountMismatch { low: 3, high: 2 };
        let msg = e.to_string();
        assert!(msg.contains("3 pages"), "got: {msg}");
        assert!(msg.contains('2'), "got: {msg}");
    }

    #[test]
    fn not_a_pdf_display() {
        let e = ExtractError::NotAPdf {
            path: PathBuf::from("/tmp/cat.png"),
            magic: *b"\x89PNG",
        };
        assert!(e.to_string().contains("cat.png"));
    }

    #[test]
    fn missing_page_image_display() {
        let e = FigureError::MissingPageImage {
            page: 4,
            name: "2".into(),
            path: PathBuf::from("/out/page0005.png"),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 4"));
        assert!(msg.contains("page0005.png"));
    }

    #[test]
    fn degenerate_boundary_display() {
        let e = FigureError::DegenerateBoundary {
            page: 0,
            name: "1".into(),
            x1: 100,
            y1: 100,
            x2: 100,
            y2: 50,
        };
        assert!(e.to_string().contains("(100,100)-(100,50)"));
    }
}

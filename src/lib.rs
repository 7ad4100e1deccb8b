//! # pdf2figs
//!
//! Extract figures, tables, and captions from scientific PDFs.
//!
//! Plain text extraction loses exactly the content that makes a paper a
//! paper: its figures. This crate renders each PDF page as a raster image,
//! asks two detection backends — a caption-location tool and a learned
//! bounding-box predictor — where the figures are, and cuts the regions out
//! of a higher-resolution rendering, producing one cropped PNG per figure
//! plus a normalized JSON record per PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Stage      hash the bytes (SHA-1), copy into {out}/{digest}/
//!  ├─ 2. Render     rasterise all pages twice: detection DPI + crop DPI
//!  ├─ 3. Captions   caption/figure-location tool → raw output document
//!  ├─ 4. Detect     learned model merges boxes with captions → figures.json
//!  ├─ 5. Normalize  drop unidentified entries, rescale low→high DPI coords
//!  └─ 6. Crop       cut each region from its high-res page raster
//! ```
//!
//! Workspaces are content-addressed: the digest of the PDF bytes names the
//! directory, so concurrent extractions of distinct PDFs never collide and
//! re-extracting the same PDF is idempotent at the filesystem level.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2figs::{extract, CommandCaptionTool, CommandFigureDetector, ExtractionConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .caption_tool(Arc::new(CommandCaptionTool::new("pdffigures2")))
//!         .detector(Arc::new(CommandFigureDetector::new("deepfigures-detect")))
//!         .build()?;
//!     let extraction = extract("paper.pdf", "output", &config).await?;
//!     for figure in &extraction.figures {
//!         println!("{} {} → {}", figure.figure_type, figure.name, figure.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2figs` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2figs = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod extract;
pub mod identity;
pub mod model;
pub mod pipeline;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{
    CaptionTool, CommandCaptionTool, CommandFigureDetector, FigureDetector, PageRenderer,
    PdfiumRenderer,
};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, ServiceDirs};
pub use error::{ExtractError, FigureError};
pub use extract::{
    collect_figures, extract, extract_all, extract_blocking, extract_sync, ExtractionStats,
    FigureExtraction,
};
pub use identity::pdf_identity;
pub use model::{Boundary, ExtractionResult, FigureType, RegionEntry};
pub use pipeline::crop::CroppedFigure;
pub use workspace::Workspace;

//! Per-PDF workspace: a deterministic directory tree keyed by content hash.
//!
//! Every artifact of one extraction run lives under `{parent}/{identity}`:
//! the staged PDF copy, both rendering sets, the raw caption-tool output,
//! the detector output, and the final cropped figures. Because the root is
//! keyed by the PDF's content hash, concurrent extractions of *distinct*
//! PDFs never collide, and re-extracting the same PDF lands in the same
//! place. Layout is pure path arithmetic — the orchestrator owns directory
//! creation, and cleanup is an explicit external step.

use crate::error::ExtractError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Sub-directory holding page rasters (both DPI sets, distinguished by filename).
pub const RENDERINGS_DIR: &str = "page-renderings";
/// Sub-directory for the raw caption-tool output document.
pub const CAPTIONS_DIR: &str = "pdffigures-output";
/// Sub-directory for the learned detector's JSON output.
pub const DETECTIONS_DIR: &str = "deepfigures-output";
/// Sub-directory for cropped figure images and the normalized result.
pub const FIGURES_DIR: &str = "figure-images";

/// The named paths of one extraction run.
///
/// Built by [`Workspace::layout`], which is a pure function of its inputs:
/// equal `(identity, pdf_name, parent_dir)` always yields equal paths, so
/// callers may check for existing output before re-running expensive stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    /// Hex content digest of the PDF; sole key for workspace isolation.
    pub identity: String,
    /// `{parent}/{identity}` — every other path lives under this root.
    pub root: PathBuf,
    /// Staged copy of the source PDF.
    pub pdf: PathBuf,
    /// Page rasters at both resolutions.
    pub renderings: PathBuf,
    /// Raw caption-tool output.
    pub captions: PathBuf,
    /// Learned detector output.
    pub detections: PathBuf,
    /// Cropped figure images plus `figures.json`.
    pub figures: PathBuf,
}

impl Workspace {
    /// Derive the workspace paths for `identity` under `parent_dir`.
    ///
    /// No filesystem access happens here.
    pub fn layout(identity: &str, pdf_name: &str, parent_dir: &Path) -> Self {
        let root = parent_dir.join(identity);
        Self {
            identity: identity.to_string(),
            pdf: root.join(pdf_name),
            renderings: root.join(RENDERINGS_DIR),
            captions: root.join(CAPTIONS_DIR),
            detections: root.join(DETECTIONS_DIR),
            figures: root.join(FIGURES_DIR),
            root,
        }
    }

    /// Create the root and all sub-directories.
    pub(crate) fn create_dirs(&self) -> Result<(), ExtractError> {
        for dir in [
            &self.root,
            &self.renderings,
            &self.captions,
            &self.detections,
            &self.figures,
        ] {
            std::fs::create_dir_all(dir).map_err(|e| ExtractError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// True once all five sub-paths exist on disk.
    pub fn is_complete(&self) -> bool {
        self.pdf.exists()
            && self.renderings.exists()
            && self.captions.exists()
            && self.detections.exists()
            && self.figures.exists()
    }
}

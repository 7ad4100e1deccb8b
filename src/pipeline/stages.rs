//! The extraction state machine.
//!
//! Each stage is its own type holding everything accumulated so far, and
//! advancing consumes the previous stage:
//!
//! ```text
//! Staged → Rendered → CaptionsExtracted → RegionsDetected
//! ```
//!
//! There is no partial resume within a run: any stage error aborts the
//! whole run (cleanup of the half-populated workspace is an external
//! responsibility). Staging copies the source PDF into the workspace
//! before anything else, so every later stage reads the immutable staged
//! copy — a caller mutating or deleting the original mid-run cannot
//! corrupt the pipeline.

use crate::backend::{CaptionTool, FigureDetector, PageRenderer};
use crate::error::ExtractError;
use crate::identity::pdf_identity;
use crate::model::ExtractionResult;
use crate::workspace::Workspace;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Verify the file starts with the `%PDF` magic bytes.
fn validate_pdf(path: &Path) -> Result<(), ExtractError> {
    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(ExtractError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// The PDF has been hashed and copied into its workspace.
#[derive(Debug)]
pub struct Staged {
    pub workspace: Workspace,
}

impl Staged {
    /// Hash the PDF, lay out and create the workspace, and stage the copy.
    pub fn stage(pdf_path: &Path, parent_dir: &Path) -> Result<Staged, ExtractError> {
        validate_pdf(pdf_path)?;
        let identity = pdf_identity(pdf_path)?;
        let pdf_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let workspace = Workspace::layout(&identity, &pdf_name, parent_dir);
        workspace.create_dirs()?;
        std::fs::copy(pdf_path, &workspace.pdf).map_err(|e| ExtractError::Io {
            path: workspace.pdf.clone(),
            source: e,
        })?;

        info!(
            "Staged {} → {}",
            pdf_path.display(),
            workspace.root.display()
        );
        Ok(Staged { workspace })
    }

    /// Render both resolution sets and check they agree on page count.
    pub fn render(
        self,
        renderer: &dyn PageRenderer,
        detection_dpi: u32,
        crop_dpi: u32,
    ) -> Result<Rendered, ExtractError> {
        let low_res_pages =
            renderer.render(&self.workspace.pdf, &self.workspace.renderings, detection_dpi)?;
        let hi_res_pages =
            renderer.render(&self.workspace.pdf, &self.workspace.renderings, crop_dpi)?;

        // A count mismatch would desynchronise page indices from rasters
        // for every downstream crop.
        if low_res_pages.len() != hi_res_pages.len() {
            return Err(ExtractError::PageCountMismatch {
                low: low_res_pages.len(),
                high: hi_res_pages.len(),
            });
        }

        debug!("Rendered {} pages at both resolutions", low_res_pages.len());
        Ok(Rendered {
            workspace: self.workspace,
            low_res_pages,
            hi_res_pages,
        })
    }
}

/// Both rendering sets exist with equal page counts.
#[derive(Debug)]
pub struct Rendered {
    pub workspace: Workspace,
    /// Detection-DPI rasters, index = 0-based page.
    pub low_res_pages: Vec<PathBuf>,
    /// Crop-DPI rasters, index = 0-based page.
    pub hi_res_pages: Vec<PathBuf>,
}

impl Rendered {
    /// Run the caption/figure-location tool against the staged PDF.
    pub fn extract_captions(
        self,
        tool: &dyn CaptionTool,
    ) -> Result<CaptionsExtracted, ExtractError> {
        let captions_path = tool.extract(&self.workspace.pdf, &self.workspace.captions)?;
        debug!("Caption tool output at {}", captions_path.display());
        Ok(CaptionsExtracted {
            workspace: self.workspace,
            low_res_pages: self.low_res_pages,
            hi_res_pages: self.hi_res_pages,
            captions_path,
        })
    }
}

/// The caption tool has produced its raw output document.
#[derive(Debug)]
pub struct CaptionsExtracted {
    pub workspace: Workspace,
    pub low_res_pages: Vec<PathBuf>,
    pub hi_res_pages: Vec<PathBuf>,
    pub captions_path: PathBuf,
}

impl CaptionsExtracted {
    /// Run the learned detector over the low-res rasters and caption output.
    pub fn detect_regions(
        self,
        detector: &dyn FigureDetector,
    ) -> Result<RegionsDetected, ExtractError> {
        let detections_path = detector.extract_figures_json(
            &self.workspace.pdf,
            &self.low_res_pages,
            &self.captions_path,
            &self.workspace.detections,
        )?;
        debug!("Detector output at {}", detections_path.display());
        Ok(RegionsDetected {
            workspace: self.workspace,
            low_res_pages: self.low_res_pages,
            hi_res_pages: self.hi_res_pages,
            captions_path: self.captions_path,
            detections_path,
        })
    }
}

/// All backends have run; the raw detection document is on disk.
#[derive(Debug)]
pub struct RegionsDetected {
    pub workspace: Workspace,
    pub low_res_pages: Vec<PathBuf>,
    pub hi_res_pages: Vec<PathBuf>,
    pub captions_path: PathBuf,
    pub detections_path: PathBuf,
}

impl RegionsDetected {
    /// Parse the detector's raw output document.
    pub fn load_detections(&self) -> Result<ExtractionResult, ExtractError> {
        ExtractionResult::load(&self.detections_path)
    }
}

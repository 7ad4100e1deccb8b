//! Cropper: map normalized entries onto high-resolution rasters and persist
//! the cut-out images.
//!
//! Every failure in here is local to one figure: a missing page raster, an
//! out-of-range page index, or a degenerate rectangle skips that entry with
//! a warning and the rest of the list keeps processing. One bad figure must
//! never discard the other valid figures of the same PDF.

use crate::error::FigureError;
use crate::model::{ExtractionResult, FigureType, RegionEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One successfully persisted figure image.
#[derive(Debug, Clone, Serialize)]
pub struct CroppedFigure {
    /// 1-based page number, matching the renderer's file naming.
    pub page: usize,
    pub figure_type: FigureType,
    pub name: String,
    /// Where the cropped image was written.
    pub path: PathBuf,
}

/// What the crop pass produced: persisted figures plus the per-figure
/// conditions that were skipped over.
#[derive(Debug, Default)]
pub struct CropOutcome {
    pub cropped: Vec<CroppedFigure>,
    pub skipped: Vec<FigureError>,
}

/// Artifact filename for one figure.
///
/// Encodes type, 1-based page number, and name, so artifacts from many
/// figures on one PDF never collide.
pub fn artifact_name(figure_type: FigureType, page_number: usize, name: &str) -> String {
    format!("{figure_type}_page{page_number:04}_{figure_type}_{name}.png")
}

/// Crop every identified entry of `result` from its high-resolution raster
/// into `figures_dir`.
///
/// `hi_res_pages` is the crop-DPI rendering set, index = 0-based page.
/// Boundaries must already be in crop-DPI coordinates (see
/// [`crate::pipeline::normalize`]).
pub fn crop_figures(
    result: &ExtractionResult,
    hi_res_pages: &[PathBuf],
    figures_dir: &Path,
) -> CropOutcome {
    let mut outcome = CropOutcome::default();
    for entry in result.entries() {
        match crop_entry(entry, hi_res_pages, figures_dir) {
            Ok(Some(figure)) => outcome.cropped.push(figure),
            // Metadata-only entry; nothing to materialize.
            Ok(None) => {}
            Err(e) => {
                warn!("Skipping figure: {e}");
                outcome.skipped.push(e);
            }
        }
    }
    outcome
}

fn crop_entry(
    entry: &RegionEntry,
    hi_res_pages: &[PathBuf],
    figures_dir: &Path,
) -> Result<Option<CroppedFigure>, FigureError> {
    if !entry.is_identified() {
        debug!(
            "Not materializing entry on page {}: type={} name={}",
            entry.page,
            entry.figure_type,
            entry.display_name()
        );
        return Ok(None);
    }
    let name = entry.display_name().to_string();

    let boundary = entry.boundary.ok_or_else(|| FigureError::MissingBoundary {
        page: entry.page,
        name: name.clone(),
    })?;

    let page_image = hi_res_pages
        .get(entry.page)
        .ok_or_else(|| FigureError::PageOutOfRange {
            page: entry.page,
            name: name.clone(),
            total: hi_res_pages.len(),
        })?;
    if !page_image.exists() {
        return Err(FigureError::MissingPageImage {
            page: entry.page,
            name,
            path: page_image.clone(),
        });
    }

    // Left/top inclusive, right/bottom exclusive, origin top-left.
    let (x1, y1, x2, y2) = boundary.to_pixels();
    if x1 >= x2 || y1 >= y2 {
        return Err(FigureError::DegenerateBoundary {
            page: entry.page,
            name,
            x1,
            y1,
            x2,
            y2,
        });
    }

    let page_number = entry.rendered_page_number();
    let output_path = figures_dir.join(artifact_name(entry.figure_type, page_number, &name));

    let image = image::open(page_image).map_err(|e| FigureError::CropFailed {
        page: entry.page,
        name: name.clone(),
        detail: format!("open {}: {e}", page_image.display()),
    })?;
    let cropped = image.crop_imm(x1, y1, x2 - x1, y2 - y1);
    cropped
        .save(&output_path)
        .map_err(|e| FigureError::CropFailed {
            page: entry.page,
            name: name.clone(),
            detail: format!("save {}: {e}", output_path.display()),
        })?;

    debug!(
        "Cropped {} {} from page {} → {}",
        entry.figure_type,
        name,
        page_number,
        output_path.display()
    );
    Ok(Some(CroppedFigure {
        page: page_number,
        figure_type: entry.figure_type,
        name,
        path: output_path,
    }))
}

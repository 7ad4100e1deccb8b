//! Top-level extraction entry points.
//!
//! Within one PDF the pipeline is strictly sequential — every stage depends
//! on the previous stage's filesystem output — so the whole run executes as
//! one blocking task, moved off the async executor with
//! `tokio::task::spawn_blocking`. Across PDFs, runs parallelise safely
//! because workspaces are keyed by content identity; concurrent runs on the
//! *same* PDF are not safe without external serialization by identity.
//!
//! Retry and timeout policy live in the encompassing caller, never here:
//! backend calls block until they finish or fail.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, FigureError};
use crate::model::ExtractionResult;
use crate::pipeline::crop::{crop_figures, CroppedFigure};
use crate::pipeline::normalize::normalize;
use crate::pipeline::stages::Staged;
use crate::workspace::Workspace;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Filename of the normalized result document inside `figure-images/`.
pub const RESULT_FILENAME: &str = "figures.json";

/// Everything one extraction run produced.
#[derive(Debug, Serialize)]
pub struct FigureExtraction {
    /// Content digest of the PDF; also the workspace directory name.
    pub identity: String,
    pub workspace: Workspace,
    /// The normalized result document (also persisted as
    /// `figure-images/figures.json`).
    pub result: ExtractionResult,
    /// Figure images written to disk.
    pub figures: Vec<CroppedFigure>,
    /// Per-figure conditions that were skipped over.
    pub skipped: Vec<FigureError>,
    pub stats: ExtractionStats,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    pub page_count: usize,
    /// Entries in the raw detection document before filtering.
    pub figures_detected: usize,
    pub figures_cropped: usize,
    pub figures_skipped: usize,
    pub render_duration_ms: u64,
    pub detection_duration_ms: u64,
    pub crop_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Extract figures from one PDF.
///
/// Stages the PDF under `{parent_dir}/{identity}`, renders both resolution
/// sets, runs the two detection backends, normalizes the detections, and
/// crops every identified figure.
///
/// # Errors
/// Fatal only: unreadable/invalid input, a backend failure during
/// rendering or detection, or an unparseable detection document. Per-figure
/// problems are collected in [`FigureExtraction::skipped`] instead — a run
/// with zero valid figures still returns `Ok`.
pub async fn extract(
    pdf_path: impl AsRef<Path>,
    parent_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<FigureExtraction, ExtractError> {
    let pdf_path = pdf_path.as_ref().to_path_buf();
    let parent_dir = parent_dir.as_ref().to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || extract_blocking(&pdf_path, &parent_dir, &config))
        .await
        .map_err(|e| ExtractError::Internal(format!("Extraction task panicked: {e}")))?
}

/// Blocking implementation of [`extract`].
pub fn extract_blocking(
    pdf_path: &Path,
    parent_dir: &Path,
    config: &ExtractionConfig,
) -> Result<FigureExtraction, ExtractError> {
    let total_start = Instant::now();
    info!("Starting extraction: {}", pdf_path.display());

    let staged = Staged::stage(pdf_path, parent_dir)?;

    let render_start = Instant::now();
    let rendered = staged.render(
        config.renderer.as_ref(),
        config.detection_dpi,
        config.crop_dpi,
    )?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    let page_count = rendered.hi_res_pages.len();
    info!("Rendered {page_count} pages in {render_duration_ms}ms");

    let detection_start = Instant::now();
    let detected = rendered
        .extract_captions(config.caption_tool.as_ref())?
        .detect_regions(config.detector.as_ref())?;
    let detection_duration_ms = detection_start.elapsed().as_millis() as u64;

    let raw = detected.load_detections()?;
    let figures_detected = raw.figures.len();
    let result = normalize(&raw, config.scale_factor());

    let crop_start = Instant::now();
    let outcome = crop_figures(&result, &detected.hi_res_pages, &detected.workspace.figures);
    let crop_duration_ms = crop_start.elapsed().as_millis() as u64;

    result.save(&detected.workspace.figures.join(RESULT_FILENAME))?;

    let stats = ExtractionStats {
        page_count,
        figures_detected,
        figures_cropped: outcome.cropped.len(),
        figures_skipped: outcome.skipped.len(),
        render_duration_ms,
        detection_duration_ms,
        crop_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Extraction complete: {}/{} figures cropped, {}ms total",
        stats.figures_cropped, figures_detected, stats.total_duration_ms
    );

    Ok(FigureExtraction {
        identity: detected.workspace.identity.clone(),
        workspace: detected.workspace,
        result,
        figures: outcome.cropped,
        skipped: outcome.skipped,
        stats,
    })
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    pdf_path: impl AsRef<Path>,
    parent_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<FigureExtraction, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(pdf_path.as_ref(), parent_dir.as_ref(), config))
}

/// Extract figures from many PDFs concurrently.
///
/// Results are returned paired with their input path, in completion order.
/// Distinct PDFs never contend for workspace paths; passing byte-identical
/// PDFs concurrently is the caller's race to manage.
pub async fn extract_all(
    pdf_paths: &[PathBuf],
    parent_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
    concurrency: usize,
) -> Vec<(PathBuf, Result<FigureExtraction, ExtractError>)> {
    let parent_dir = parent_dir.as_ref().to_path_buf();
    stream::iter(pdf_paths.iter().cloned().map(|pdf| {
        let parent = parent_dir.clone();
        let config = config.clone();
        async move {
            let result = extract(&pdf, &parent, &config).await;
            (pdf, result)
        }
    }))
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await
}

/// Move the produced figure images into `{final_dir}/{identity}/`.
///
/// Returns the new paths. The workspace keeps everything else (renderings,
/// raw tool output, result document); deleting it afterwards is the
/// caller's decision.
pub fn collect_figures(
    extraction: &FigureExtraction,
    final_dir: &Path,
) -> Result<Vec<PathBuf>, ExtractError> {
    let target_dir = final_dir.join(&extraction.identity);
    std::fs::create_dir_all(&target_dir).map_err(|e| ExtractError::Io {
        path: target_dir.clone(),
        source: e,
    })?;

    let mut moved = Vec::with_capacity(extraction.figures.len());
    for figure in &extraction.figures {
        let file_name = figure.path.file_name().ok_or_else(|| {
            ExtractError::Internal(format!("figure path has no file name: {}", figure.path.display()))
        })?;
        let dest = target_dir.join(file_name);
        // rename fails across filesystems; fall back to copy + remove.
        if std::fs::rename(&figure.path, &dest).is_err() {
            std::fs::copy(&figure.path, &dest).map_err(|e| ExtractError::Io {
                path: dest.clone(),
                source: e,
            })?;
            if let Err(e) = std::fs::remove_file(&figure.path) {
                warn!("Could not remove {}: {e}", figure.path.display());
            }
        }
        moved.push(dest);
    }
    Ok(moved)
}

//! Backend traits and default adapters.
//!
//! The pipeline never talks to a renderer or detector directly; it goes
//! through three narrow capability traits so concrete backends stay
//! swappable via configuration:
//!
//! * [`PageRenderer`] — rasterise PDF pages at a given DPI into ordered,
//!   1-based-numbered image files.
//! * [`CaptionTool`] — run the caption/figure-location tool against a PDF,
//!   producing its raw output document.
//! * [`FigureDetector`] — merge learned bounding-box predictions with the
//!   caption output into the extraction-result JSON.
//!
//! [`PdfiumRenderer`] is the in-process default. The two detection backends
//! are external programs in every deployment we know of, so their default
//! adapters ([`CommandCaptionTool`], [`CommandFigureDetector`]) shell out
//! and verify the declared output file exists before reporting success.

use crate::error::ExtractError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Filename the figure detector is expected to produce in its output dir.
pub const DETECTIONS_FILENAME: &str = "figures.json";

/// Rasterise PDF pages at a given DPI into per-page image files.
///
/// The returned paths are ordered by page; the file for page *i* (0-based)
/// sits at index *i* and its filename encodes the 1-based page number.
pub trait PageRenderer: Send + Sync {
    fn render(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        dpi: u32,
    ) -> Result<Vec<PathBuf>, ExtractError>;
}

/// Extract geometric figure/table/caption candidates from a PDF.
pub trait CaptionTool: Send + Sync {
    /// Returns the path of the raw output document.
    fn extract(&self, pdf_path: &Path, output_dir: &Path) -> Result<PathBuf, ExtractError>;
}

/// Predict figure bounding boxes and merge them with caption output.
pub trait FigureDetector: Send + Sync {
    /// Returns the path of the extraction-result JSON document.
    fn extract_figures_json(
        &self,
        pdf_path: &Path,
        low_res_pages: &[PathBuf],
        captions_path: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf, ExtractError>;
}

// ── Pdfium renderer ──────────────────────────────────────────────────────

/// Default [`PageRenderer`] backed by pdfium.
///
/// Pages are rendered at `dpi / 72` of their natural point size and saved
/// as `{stem}-dpi{dpi}-page{NNNN}.png`, so the two rendering sets of one
/// PDF share a directory without colliding.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRenderer;

impl PdfiumRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        dpi: u32,
    ) -> Result<Vec<PathBuf>, ExtractError> {
        let pdfium = Pdfium::default();
        let document =
            pdfium
                .load_pdf_from_file(pdf_path, None)
                .map_err(|e| ExtractError::RenderFailed {
                    dpi,
                    detail: format!("{e:?}"),
                })?;

        let stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

        let pages = document.pages();
        let mut paths = Vec::with_capacity(pages.len() as usize);
        for (index, page) in pages.iter().enumerate() {
            let bitmap =
                page.render_with_config(&render_config)
                    .map_err(|e| ExtractError::RenderFailed {
                        dpi,
                        detail: format!("page {}: {e:?}", index + 1),
                    })?;
            let image = bitmap.as_image();
            let path = output_dir.join(format!("{stem}-dpi{dpi}-page{:04}.png", index + 1));
            image.save(&path).map_err(|e| ExtractError::RenderFailed {
                dpi,
                detail: format!("saving page {}: {e}", index + 1),
            })?;
            debug!(
                "Rendered page {} at {} DPI → {}x{} px",
                index + 1,
                dpi,
                image.width(),
                image.height()
            );
            paths.push(path);
        }

        info!(
            "Rendered {} pages at {} DPI into {}",
            paths.len(),
            dpi,
            output_dir.display()
        );
        Ok(paths)
    }
}

// ── Command adapters ─────────────────────────────────────────────────────

/// Run a configured external command and surface spawn/exit failures.
fn run_tool(mut cmd: Command, describe: &str) -> Result<(), String> {
    debug!("Running {describe}: {cmd:?}");
    let output = cmd
        .output()
        .map_err(|e| format!("failed to spawn {describe}: {e}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{describe} exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }
    Ok(())
}

/// [`CaptionTool`] adapter that shells out to an external program.
///
/// Invocation: `program [extra_args..] <pdf_path> <output_dir>`. The tool
/// must write `{output_dir}/{pdf_stem}.json`.
#[derive(Debug, Clone)]
pub struct CommandCaptionTool {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandCaptionTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append a fixed argument placed before the PDF and output paths.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

impl CaptionTool for CommandCaptionTool {
    fn extract(&self, pdf_path: &Path, output_dir: &Path) -> Result<PathBuf, ExtractError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.extra_args).arg(pdf_path).arg(output_dir);
        run_tool(cmd, "caption tool").map_err(|detail| ExtractError::CaptionToolFailed { detail })?;

        let stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let expected = output_dir.join(format!("{stem}.json"));
        if !expected.exists() {
            return Err(ExtractError::MissingOutput { path: expected });
        }
        Ok(expected)
    }
}

/// [`FigureDetector`] adapter that shells out to an external program.
///
/// Invocation: `program [extra_args..] <pdf_path> <renderings_dir>
/// <captions_path> <output_dir>`, where `renderings_dir` is the directory
/// holding the low-resolution page rasters. The program must write
/// `{output_dir}/figures.json`.
#[derive(Debug, Clone)]
pub struct CommandFigureDetector {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandFigureDetector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append a fixed argument placed before the positional paths.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

impl FigureDetector for CommandFigureDetector {
    fn extract_figures_json(
        &self,
        pdf_path: &Path,
        low_res_pages: &[PathBuf],
        captions_path: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf, ExtractError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.extra_args).arg(pdf_path);
        if let Some(renderings_dir) = low_res_pages.first().and_then(|p| p.parent()) {
            cmd.arg(renderings_dir);
        }
        cmd.arg(captions_path).arg(output_dir);
        run_tool(cmd, "figure detector")
            .map_err(|detail| ExtractError::DetectorFailed { detail })?;

        let expected = output_dir.join(DETECTIONS_FILENAME);
        if !expected.exists() {
            return Err(ExtractError::MissingOutput { path: expected });
        }
        Ok(expected)
    }
}

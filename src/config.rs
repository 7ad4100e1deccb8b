//! Configuration types for figure extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Backends are injected as trait
//! objects so tests and alternative deployments can swap the renderer or
//! either detection tool without touching the pipeline.
//!
//! [`ServiceDirs`] groups the three directories an encompassing service
//! works with. The core itself takes all paths as parameters and never
//! reads process-wide path state; `ServiceDirs` exists so callers pass an
//! explicit struct at the boundary instead of relying on globals.

use crate::backend::{CaptionTool, FigureDetector, PageRenderer, PdfiumRenderer};
use crate::error::ExtractError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// DPI of the detection rendering set when none is configured.
pub const DEFAULT_DETECTION_DPI: u32 = 100;
/// DPI of the cropping rendering set when none is configured.
pub const DEFAULT_CROP_DPI: u32 = 200;

/// Configuration for one or more extraction runs.
///
/// # Example
/// ```rust,no_run
/// use pdf2figs::{CommandCaptionTool, CommandFigureDetector, ExtractionConfig};
/// use std::sync::Arc;
///
/// let config = ExtractionConfig::builder()
///     .detection_dpi(100)
///     .crop_dpi(200)
///     .caption_tool(Arc::new(CommandCaptionTool::new("pdffigures2")))
///     .detector(Arc::new(CommandFigureDetector::new("deepfigures-detect")))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// DPI of the low-resolution rendering set, used only for detection.
    /// Default: 100.
    pub detection_dpi: u32,

    /// DPI of the high-resolution rendering set, used only for cropping.
    /// Default: 200.
    ///
    /// The detection→crop coordinate scale is always derived from these two
    /// values, so changing either keeps cropping correct.
    pub crop_dpi: u32,

    /// Rendering backend. Default: [`PdfiumRenderer`].
    pub renderer: Arc<dyn PageRenderer>,

    /// Caption/figure-location tool backend. Required.
    pub caption_tool: Arc<dyn CaptionTool>,

    /// Learned bounding-box detector backend. Required.
    pub detector: Arc<dyn FigureDetector>,
}

impl ExtractionConfig {
    /// Create a new builder.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::default()
    }

    /// The low-DPI → high-DPI coordinate scale factor.
    ///
    /// Exactly 2.0 in the default 100/200 configuration, but always derived
    /// from the configured values, never hard-coded.
    pub fn scale_factor(&self) -> f64 {
        f64::from(self.crop_dpi) / f64::from(self.detection_dpi)
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("detection_dpi", &self.detection_dpi)
            .field("crop_dpi", &self.crop_dpi)
            .field("renderer", &"<dyn PageRenderer>")
            .field("caption_tool", &"<dyn CaptionTool>")
            .field("detector", &"<dyn FigureDetector>")
            .finish()
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Default)]
pub struct ExtractionConfigBuilder {
    detection_dpi: Option<u32>,
    crop_dpi: Option<u32>,
    renderer: Option<Arc<dyn PageRenderer>>,
    caption_tool: Option<Arc<dyn CaptionTool>>,
    detector: Option<Arc<dyn FigureDetector>>,
}

impl ExtractionConfigBuilder {
    pub fn detection_dpi(mut self, dpi: u32) -> Self {
        self.detection_dpi = Some(dpi);
        self
    }

    pub fn crop_dpi(mut self, dpi: u32) -> Self {
        self.crop_dpi = Some(dpi);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn caption_tool(mut self, tool: Arc<dyn CaptionTool>) -> Self {
        self.caption_tool = Some(tool);
        self
    }

    pub fn detector(mut self, detector: Arc<dyn FigureDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let detection_dpi = self.detection_dpi.unwrap_or(DEFAULT_DETECTION_DPI);
        let crop_dpi = self.crop_dpi.unwrap_or(DEFAULT_CROP_DPI);
        if detection_dpi == 0 || crop_dpi == 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "DPI values must be non-zero, got detection={detection_dpi} crop={crop_dpi}"
            )));
        }
        let caption_tool = self
            .caption_tool
            .ok_or_else(|| ExtractError::InvalidConfig("caption_tool is required".into()))?;
        let detector = self
            .detector
            .ok_or_else(|| ExtractError::InvalidConfig("detector is required".into()))?;

        Ok(ExtractionConfig {
            detection_dpi,
            crop_dpi,
            renderer: self
                .renderer
                .unwrap_or_else(|| Arc::new(PdfiumRenderer::new())),
            caption_tool,
            detector,
        })
    }
}

/// The three directories an encompassing service owns.
///
/// `upload_dir` receives incoming PDFs, `output_dir` parents the per-PDF
/// workspaces, and `final_dir` collects finished figure images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDirs {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub final_dir: PathBuf,
}

impl ServiceDirs {
    pub fn new(
        upload_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        final_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
            final_dir: final_dir.into(),
        }
    }

    /// Create all three directories if they do not exist yet.
    pub fn create_all(&self) -> Result<(), ExtractError> {
        for dir in [&self.upload_dir, &self.output_dir, &self.final_dir] {
            std::fs::create_dir_all(dir).map_err(|e| ExtractError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use std::path::{Path, PathBuf};

    struct NoopCaptions;
    impl CaptionTool for NoopCaptions {
        fn extract(&self, _pdf: &Path, _out: &Path) -> Result<PathBuf, ExtractError> {
            unimplemented!("config tests never invoke backends")
        }
    }

    struct NoopDetector;
    impl FigureDetector for NoopDetector {
        fn extract_figures_json(
            &self,
            _pdf: &Path,
            _pages: &[PathBuf],
            _captions: &Path,
            _out: &Path,
        ) -> Result<PathBuf, ExtractError> {
            unimplemented!("config tests never invoke backends")
        }
    }

    fn builder_with_backends() -> ExtractionConfigBuilder {
        ExtractionConfig::builder()
            .caption_tool(Arc::new(NoopCaptions))
            .detector(Arc::new(NoopDetector))
    }

    #[test]
    fn default_scale_factor_is_two() {
        let config = builder_with_backends().build().unwrap();
        assert_eq!(config.detection_dpi, 100);
        assert_eq!(config.crop_dpi, 200);
        assert_eq!(config.scale_factor(), 2.0);
    }

    #[test]
    fn scale_factor_follows_configured_dpis() {
        let config = builder_with_backends()
            .detection_dpi(72)
            .crop_dpi(300)
            .build()
            .unwrap();
        assert!((config.scale_factor() - 300.0 / 72.0).abs() < 1e-12);
    }

    #[test]
    fn zero_dpi_rejected() {
        let err = builder_with_backends().detection_dpi(0).build().unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }

    #[test]
    fn missing_detector_rejected() {
        let err = ExtractionConfig::builder()
            .caption_tool(Arc::new(NoopCaptions))
            .build()
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));
    }
}

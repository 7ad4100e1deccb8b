//! Data model for detection output: region entries, boundaries, and the
//! normalized extraction result document.
//!
//! The learned detector emits one JSON document per PDF in this shape:
//!
//! ```json
//! {
//!   "figures": [
//!     { "page": 0,
//!       "figure_boundary": { "x1": 10.0, "y1": 20.0, "x2": 100.0, "y2": 200.0 },
//!       "figure_type": "figure",
//!       "name": "1" }
//!   ],
//!   "raw_pdffigures_output": {
//!     "regionless-captions": [
//!       { "page": 2, "figure_type": "caption", "name": "3" }
//!     ]
//!   }
//! }
//! ```
//!
//! Parsing is deliberately tolerant: a missing boundary becomes `None`, a
//! missing or unrecognised `figure_type` becomes [`FigureType::Unknown`],
//! and a missing `name` stays `None`. Entries degraded this way are
//! metadata-only — the normalizer filters them before any crop happens.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A rectangle in the coordinate space of one rendering set.
///
/// `(x1, y1)` is the top-left corner, `(x2, y2)` the bottom-right, origin
/// top-left, units = pixels at the rendering's DPI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Boundary {
    /// Uniformly scale all four coordinates by `factor`.
    ///
    /// This is the low-DPI → high-DPI coordinate mapping: the factor is the
    /// ratio of the two rendering DPIs, applied identically to every corner.
    pub fn scaled(&self, factor: f64) -> Boundary {
        Boundary {
            x1: self.x1 * factor,
            y1: self.y1 * factor,
            x2: self.x2 * factor,
            y2: self.y2 * factor,
        }
    }

    /// Convert to an integer pixel rectangle `(x1, y1, x2, y2)`.
    ///
    /// Non-integer coordinates round half-up (`f64::round`, which is
    /// half-away-from-zero — identical for the non-negative values seen
    /// here); negative coordinates clamp to zero.
    pub fn to_pixels(&self) -> (u32, u32, u32, u32) {
        let px = |v: f64| v.round().max(0.0) as u32;
        (px(self.x1), px(self.y1), px(self.x2), px(self.y2))
    }
}

/// Classification of a detected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureType {
    #[serde(alias = "Figure")]
    Figure,
    #[serde(alias = "Table")]
    Table,
    /// A caption detected without an associated figure region.
    #[serde(alias = "Caption")]
    Caption,
    /// Anything the tools could not classify. Never materialized as a crop.
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for FigureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FigureType::Figure => "figure",
            FigureType::Table => "table",
            FigureType::Caption => "caption",
            FigureType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One detected figure, table, or caption candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    /// 0-based page index, as emitted by the detection tools.
    pub page: usize,

    /// Rectangle in the low-resolution coordinate space (high-resolution
    /// after normalization). Absent for regionless captions — consumers
    /// must tolerate the missing key.
    #[serde(default, alias = "figure_boundary", skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Boundary>,

    #[serde(default)]
    pub figure_type: FigureType,

    /// Tool-assigned label, e.g. "1" for "Figure 1".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RegionEntry {
    /// Whether both type and name are known.
    ///
    /// Unidentified entries are metadata-only: they survive in the result
    /// document but are never cropped.
    pub fn is_identified(&self) -> bool {
        self.figure_type != FigureType::Unknown
            && self.name.as_deref().is_some_and(|n| n != "unknown")
    }

    /// The label, or "unknown" when the tool assigned none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }

    /// 1-based page number matching the renderer's file naming.
    ///
    /// Raw detection JSON is 0-based; rendered filenames are 1-based. The
    /// offset is applied here and nowhere else.
    pub fn rendered_page_number(&self) -> usize {
        self.page + 1
    }
}

/// The per-PDF extraction result document: identified figures plus the
/// caption-only entries that came back without a region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub figures: Vec<RegionEntry>,

    #[serde(default)]
    pub raw_pdffigures_output: RawPdffiguresOutput,
}

/// The caption-tool section carried through the detector's output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPdffiguresOutput {
    #[serde(default, rename = "regionless-captions")]
    pub regionless_captions: Vec<RegionEntry>,
}

impl ExtractionResult {
    /// Parse a detection document from disk.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| ExtractError::MalformedDetections {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Persist the document as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ExtractError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ExtractError::Internal(format!("serialize result: {e}")))?;
        std::fs::write(path, json).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// All entries the cropper considers: figures, then regionless captions.
    pub fn entries(&self) -> impl Iterator<Item = &RegionEntry> {
        self.figures
            .iter()
            .chain(self.raw_pdffigures_output.regionless_captions.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_figure_boundary_alias() {
        let json = r#"{
            "figures": [
                { "page": 0,
                  "figure_boundary": { "x1": 1.0, "y1": 2.0, "x2": 3.0, "y2": 4.0 },
                  "figure_type": "figure",
                  "name": "1" }
            ]
        }"#;
        let result: ExtractionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.figures.len(), 1);
        let b = result.figures[0].boundary.unwrap();
        assert_eq!(b, Boundary { x1: 1.0, y1: 2.0, x2: 3.0, y2: 4.0 });
    }

    #[test]
    fn tolerates_missing_keys() {
        // Regionless caption: no boundary key at all, capitalised type.
        let json = r#"{
            "figures": [ { "page": 3, "figure_type": "Table", "name": "2" } ],
            "raw_pdffigures_output": {
                "regionless-captions": [ { "page": 5, "name": "4" } ]
            }
        }"#;
        let result: ExtractionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.figures[0].figure_type, FigureType::Table);
        assert!(result.figures[0].boundary.is_none());
        let caption = &result.raw_pdffigures_output.regionless_captions[0];
        assert_eq!(caption.figure_type, FigureType::Unknown);
        assert_eq!(caption.display_name(), "4");
    }

    #[test]
    fn unrecognised_type_degrades_to_unknown() {
        let json = r#"{ "figures": [ { "page": 0, "figure_type": "equation", "name": "1" } ] }"#;
        let result: ExtractionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.figures[0].figure_type, FigureType::Unknown);
        assert!(!result.figures[0].is_identified());
    }

    #[test]
    fn identification_rules() {
        let entry = |figure_type, name: Option<&str>| RegionEntry {
            page: 0,
            boundary: None,
            figure_type,
            name: name.map(str::to_string),
        };
        assert!(entry(FigureType::Figure, Some("1")).is_identified());
        assert!(!entry(FigureType::Unknown, Some("1")).is_identified());
        assert!(!entry(FigureType::Figure, None).is_identified());
        assert!(!entry(FigureType::Figure, Some("unknown")).is_identified());
    }

    #[test]
    fn page_number_offset_law() {
        let mut entry = RegionEntry {
            page: 0,
            boundary: None,
            figure_type: FigureType::Figure,
            name: Some("1".into()),
        };
        assert_eq!(entry.rendered_page_number(), 1);
        entry.page = 5;
        assert_eq!(entry.rendered_page_number(), 6);
    }

    #[test]
    fn boundary_pixel_rounding_is_half_up() {
        let b = Boundary { x1: 10.4, y1: 10.5, x2: 20.6, y2: -1.0 };
        assert_eq!(b.to_pixels(), (10, 11, 21, 0));
    }

    #[test]
    fn serialized_regionless_caption_omits_boundary_key() {
        let result = ExtractionResult {
            figures: vec![],
            raw_pdffigures_output: RawPdffiguresOutput {
                regionless_captions: vec![RegionEntry {
                    page: 1,
                    boundary: None,
                    figure_type: FigureType::Caption,
                    name: Some("2".into()),
                }],
            },
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("regionless-captions"));
        assert!(!json.contains("boundary"));
    }

    #[test]
    fn round_trips_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("figures.json");
        let result = ExtractionResult {
            figures: vec![RegionEntry {
                page: 2,
                boundary: Some(Boundary { x1: 0.0, y1: 0.0, x2: 10.0, y2: 10.0 }),
                figure_type: FigureType::Figure,
                name: Some("3".into()),
            }],
            raw_pdffigures_output: RawPdffiguresOutput::default(),
        };
        result.save(&path).unwrap();
        assert_eq!(ExtractionResult::load(&path).unwrap(), result);
    }
}

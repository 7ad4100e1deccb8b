//! Region normalizer: one figure list out of heterogeneous detection output.
//!
//! Two jobs, both geometry-only:
//!
//! * **Filter** — figure entries whose type or name is unknown carry no
//!   usable identity and are dropped from the figure list.
//! * **Rescale** — detection ran against the low-resolution rendering set,
//!   cropping runs against the high-resolution one, so every boundary is
//!   multiplied by the ratio of the two DPIs. The ratio comes from the
//!   configured values (exactly 2.0 in the default 100→200 setup), never
//!   from a constant.
//!
//! Page numbers are never touched here. Regionless captions pass through
//! unfiltered — they are part of the result document even when
//! unidentified, and having no boundary they can never reach the cropper's
//! output anyway.

use crate::model::{ExtractionResult, RawPdffiguresOutput, RegionEntry};
use tracing::debug;

/// Rewrite `raw` into the normalized extraction result.
///
/// `scale` is the crop-DPI / detection-DPI ratio. A document yielding zero
/// identified figures normalizes to an empty list — that is still success.
pub fn normalize(raw: &ExtractionResult, scale: f64) -> ExtractionResult {
    let figures: Vec<RegionEntry> = raw
        .figures
        .iter()
        .filter(|entry| {
            let keep = entry.is_identified();
            if !keep {
                debug!(
                    "Dropping unidentified entry on page {}: type={} name={}",
                    entry.page,
                    entry.figure_type,
                    entry.display_name()
                );
            }
            keep
        })
        .map(|entry| rescale(entry, scale))
        .collect();

    let regionless_captions = raw
        .raw_pdffigures_output
        .regionless_captions
        .iter()
        .map(|entry| rescale(entry, scale))
        .collect();

    debug!(
        "Normalized {}/{} figures at scale {scale}",
        figures.len(),
        raw.figures.len()
    );

    ExtractionResult {
        figures,
        raw_pdffigures_output: RawPdffiguresOutput {
            regionless_captions,
        },
    }
}

fn rescale(entry: &RegionEntry, scale: f64) -> RegionEntry {
    RegionEntry {
        page: entry.page,
        boundary: entry.boundary.map(|b| b.scaled(scale)),
        figure_type: entry.figure_type,
        name: entry.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Boundary, FigureType};

    fn figure(page: usize, boundary: Option<Boundary>) -> RegionEntry {
        RegionEntry {
            page,
            boundary,
            figure_type: FigureType::Figure,
            name: Some("1".into()),
        }
    }

    #[test]
    fn scaling_is_linear() {
        let b = Boundary { x1: 10.0, y1: 20.0, x2: 100.0, y2: 200.0 };
        let raw = ExtractionResult {
            figures: vec![figure(0, Some(b))],
            raw_pdffigures_output: RawPdffiguresOutput::default(),
        };
        let normalized = normalize(&raw, 2.0);
        assert_eq!(
            normalized.figures[0].boundary.unwrap(),
            Boundary { x1: 20.0, y1: 40.0, x2: 200.0, y2: 400.0 }
        );
    }

    #[test]
    fn scaling_is_reversible_within_float_tolerance() {
        let b = Boundary { x1: 10.0, y1: 20.0, x2: 100.0, y2: 200.0 };
        let scale = 300.0 / 72.0;
        let restored = b.scaled(scale).scaled(1.0 / scale);
        for (got, want) in [
            (restored.x1, b.x1),
            (restored.y1, b.y1),
            (restored.x2, b.x2),
            (restored.y2, b.y2),
        ] {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
    }

    #[test]
    fn unidentified_figures_dropped() {
        let raw = ExtractionResult {
            figures: vec![
                figure(0, None),
                RegionEntry {
                    page: 1,
                    boundary: None,
                    figure_type: FigureType::Unknown,
                    name: Some("2".into()),
                },
                RegionEntry {
                    page: 2,
                    boundary: None,
                    figure_type: FigureType::Table,
                    name: None,
                },
            ],
            raw_pdffigures_output: RawPdffiguresOutput::default(),
        };
        let normalized = normalize(&raw, 2.0);
        assert_eq!(normalized.figures.len(), 1);
        assert_eq!(normalized.figures[0].page, 0);
    }

    #[test]
    fn page_numbers_never_mutated() {
        let raw = ExtractionResult {
            figures: vec![figure(7, Some(Boundary { x1: 1.0, y1: 1.0, x2: 2.0, y2: 2.0 }))],
            raw_pdffigures_output: RawPdffiguresOutput {
                regionless_captions: vec![RegionEntry {
                    page: 3,
                    boundary: None,
                    figure_type: FigureType::Unknown,
                    name: None,
                }],
            },
        };
        let normalized = normalize(&raw, 4.0);
        assert_eq!(normalized.figures[0].page, 7);
        assert_eq!(
            normalized.raw_pdffigures_output.regionless_captions[0].page,
            3
        );
    }

    #[test]
    fn regionless_captions_pass_through_unfiltered() {
        let raw = ExtractionResult {
            figures: vec![],
            raw_pdffigures_output: RawPdffiguresOutput {
                regionless_captions: vec![RegionEntry {
                    page: 0,
                    boundary: None,
                    figure_type: FigureType::Unknown,
                    name: None,
                }],
            },
        };
        let normalized = normalize(&raw, 2.0);
        assert_eq!(
            normalized.raw_pdffigures_output.regionless_captions.len(),
            1
        );
    }

    #[test]
    fn empty_document_is_still_success() {
        let normalized = normalize(&ExtractionResult::default(), 2.0);
        assert!(normalized.figures.is_empty());
    }
}

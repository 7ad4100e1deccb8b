//! Pipeline stages for figure extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. switch rendering backend) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! stage ──▶ render ──▶ captions ──▶ detect ──▶ normalize ──▶ crop
//! (hash +   (low +     (caption     (learned   (filter +     (pixel crop
//!  copy)     high DPI)  tool)        model)     rescale)      + persist)
//! ```
//!
//! 1. [`stages`]    — the typed state machine sequencing the external
//!    backends: `Staged → Rendered → CaptionsExtracted → RegionsDetected`.
//!    A stage having completed is a type-level fact, not a null-check.
//! 2. [`normalize`] — turn the heterogeneous detection output into one
//!    figure list, rewriting coordinates for the resolution mismatch.
//! 3. [`crop`]      — map each normalized entry onto its high-resolution
//!    page raster, crop, and persist the image.

pub mod crop;
pub mod normalize;
pub mod stages;

//! Tunable thresholds for the triage pipeline.
//!
//! Every default reproduces the conformance-suite conventions the skip registry was written
//! against; callers only need to touch these when re-calibrating against a different renderer.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Pixel-diff boundaries for [`crate::Severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    /// First pixel count that is `moderate` rather than `minor`.
    pub moderate_from: u64,
    /// First pixel count that is `major` rather than `moderate`.
    pub major_from: u64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            moderate_from: 500,
            major_from: 5000,
        }
    }
}

/// Pixel-diff boundaries for [`crate::FailureCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryThresholds {
    /// Diffs at or below this count are anti-aliasing noise, whatever the features say.
    pub noise_max: u64,
    /// Feature-free diffs below this count are attributed to font rasterization.
    pub font_difference_below: u64,
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self {
            noise_max: 100,
            font_difference_below: 1000,
        }
    }
}

/// Thresholds for classifying a rendered diff raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffThresholds {
    pub anti_aliasing_below: u64,
    pub uniform_offset_min_pixels: u64,
    /// Minimum share of the bounding box that must be covered by differing pixels.
    pub uniform_offset_density: f64,
    /// Share of the whole raster above which the diff is treated as a missing element.
    pub missing_element_ratio: f64,
}

impl Default for DiffThresholds {
    fn default() -> Self {
        Self {
            anti_aliasing_below: 100,
            uniform_offset_min_pixels: 100,
            uniform_offset_density: 0.8,
            missing_element_ratio: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageOptions {
    pub severity: SeverityThresholds,
    pub category: CategoryThresholds,
    pub diff: DiffThresholds,
    /// How far (in test ordinals) a neighbour may be to count as related.
    pub related_window: u32,
    pub related_limit: usize,
    /// Load and analyze the actual/expected/diff PNGs named in a transcript during batch triage.
    pub analyze_artifacts: bool,
}

impl Default for TriageOptions {
    fn default() -> Self {
        Self {
            severity: SeverityThresholds::default(),
            category: CategoryThresholds::default(),
            diff: DiffThresholds::default(),
            related_window: 5,
            related_limit: 5,
            analyze_artifacts: false,
        }
    }
}

impl TriageOptions {
    /// Parses options from JSON. Missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#![forbid(unsafe_code)]

//! Headless triage model for SVG conformance-suite failures.
//!
//! Everything here is a pure function of its inputs: transcripts and skip registries are
//! parsed from text, SVG sources are inspected in memory, and nothing touches the filesystem.
//! Raster analysis and the batch pipeline live in the `svgtriage` crate.

pub mod categorize;
pub mod detect;
pub mod error;
pub mod features;
pub mod guidance;
pub mod model;
pub mod options;
pub mod rank;
pub mod report;
pub mod skips;
pub mod transcript;

pub use categorize::{Categorizer, skip_comment};
pub use detect::{DetectionReport, FeatureDetector};
pub use error::{Error, Result};
pub use features::{Feature, FeatureCategory, FeatureRegistry};
pub use guidance::{GuidanceCategory, implementation_hints, search_keywords};
pub use model::{
    CategoryReport, FailureCategory, FailureClassification, ParseWarning, Severity, SkipEntry,
    TestResult, TestStatus, TestSummary,
};
pub use options::{CategoryThresholds, DiffThresholds, SeverityThresholds, TriageOptions};
pub use rank::{RankSignal, RankedFile, rank_files};
pub use report::{
    CATCH_ALL_CATEGORY, MissingFeature, PriorityFeature, group_by_category,
    identify_missing_features, next_priority_feature, rank_missing_features, related_tests,
};
pub use skips::{SkipRegistry, format_skip_entry};
pub use transcript::{ComparisonArtifacts, ParsedTranscript, parse_transcript};

#[cfg(test)]
mod tests;

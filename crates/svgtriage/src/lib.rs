#![forbid(unsafe_code)]

//! Triage pipeline for SVG conformance-suite failures.
//!
//! [`Triage`] bundles a [`FeatureRegistry`] with [`TriageOptions`] and exposes the
//! operations a CI job or a human needs after a red run: analyze one failing test, triage a
//! whole transcript, report per-category progress against the skip registry, and suggest
//! skip lines and implementation starting points.
//!
//! The headless model is re-exported from `svgtriage-core`.
//!
//! Set `SVGTRIAGE_TIMING=1` to print per-phase timings of batch runs to stderr.

pub use svgtriage_core::*;

mod analyze;
mod batch;
pub mod raster;
mod source;

pub use analyze::{AnalysisSummary, AnalyzeRequest, ImagePaths, TestAnalysis};
pub use batch::{BatchTriage, CategoryTotals, TriagedFailure};
pub use source::{DirSvgSource, NoSvgSource, SvgSource};

use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error(transparent)]
    Core(#[from] svgtriage_core::Error),
    #[error(transparent)]
    Raster(#[from] raster::RasterError),
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;

impl From<&TriageError> for raster::AnalysisError {
    fn from(err: &TriageError) -> Self {
        use raster::{AnalysisError, AnalysisErrorKind};
        match err {
            TriageError::Raster(err) => AnalysisError::from(err),
            TriageError::ReadFile { .. } => {
                AnalysisError::new(AnalysisErrorKind::Io, err.to_string())
            }
            TriageError::Core(_) => AnalysisError::new(AnalysisErrorKind::Decode, err.to_string()),
        }
    }
}

fn timing_enabled() -> bool {
    static ENABLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *ENABLED.get_or_init(|| match std::env::var("SVGTRIAGE_TIMING").as_deref() {
        Ok("1") | Ok("true") => true,
        _ => false,
    })
}

/// Loads [`TriageOptions`] from a JSON file.
pub fn load_options(path: &Path) -> TriageResult<TriageOptions> {
    let text = std::fs::read_to_string(path).map_err(|source| TriageError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(TriageOptions::from_json(&text)?)
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReportOutput {
    pub report: CategoryReport,
    /// Missing features among this category's skip entries, most tests first.
    pub missing_features: Vec<MissingFeature>,
    pub next_priority: Option<PriorityFeature>,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipSuggestion {
    pub test_name: String,
    pub category: FailureCategory,
    pub skip_comment: String,
    /// The complete registry line, ready to paste.
    pub skip_line: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown_features: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImplementationGuidance {
    pub feature: String,
    pub category: Option<GuidanceCategory>,
    pub file_patterns: Vec<&'static str>,
    pub search_keywords: Vec<String>,
    pub hints: Vec<String>,
    pub ranked_files: Vec<RankedFile>,
}

#[derive(Debug, Clone)]
pub struct Triage {
    registry: FeatureRegistry,
    options: TriageOptions,
}

impl Default for Triage {
    fn default() -> Self {
        Self::new(FeatureRegistry::resvg_text_defaults(), TriageOptions::default())
    }
}

impl Triage {
    pub fn new(registry: FeatureRegistry, options: TriageOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn options(&self) -> &TriageOptions {
        &self.options
    }

    pub fn detector(&self) -> FeatureDetector<'_> {
        FeatureDetector::new(&self.registry)
    }

    pub fn categorizer(&self) -> Categorizer<'_> {
        Categorizer::new(&self.registry, &self.options)
    }

    pub fn detect_features(&self, svg: &str) -> DetectionReport {
        self.detector().detect_with_report(svg)
    }

    /// Progress of one category prefix in a transcript, plus what its skip entries say is
    /// missing. The skip registry text is parsed fresh on every call.
    pub fn category_report(
        &self,
        category: &str,
        transcript: &str,
        skip_registry: Option<&str>,
    ) -> CategoryReportOutput {
        let parsed = parse_transcript(transcript);
        let report = report::category_report(&parsed.results, category);
        let mut warnings = parsed.warnings;

        let (missing_features, next_priority) = match skip_registry {
            Some(text) => {
                let skips = SkipRegistry::parse(text);
                warnings.extend(skips.warnings().iter().cloned());
                let missing = identify_missing_features(&skips, Some(category));
                (rank_missing_features(&missing), next_priority_feature(&missing))
            }
            None => (Vec::new(), None),
        };

        tracing::debug!(
            category,
            total = report.total,
            passing = report.passing,
            missing = missing_features.len(),
            "category report"
        );
        CategoryReportOutput {
            report,
            missing_features,
            next_priority,
            warnings,
        }
    }

    /// Builds the registry line for a test from feature names. Names the registry does not
    /// know are left out of the comment and reported back.
    pub fn suggest_skip<S: AsRef<str>>(
        &self,
        test_name: &str,
        feature_names: &[S],
        category: FailureCategory,
    ) -> SkipSuggestion {
        let (features, unknown_features) = self.categorizer().resolve_features(feature_names);
        let skip_comment = skip_comment(category, &features);
        SkipSuggestion {
            test_name: test_name.to_string(),
            category,
            skip_line: format_skip_entry(test_name, &skip_comment),
            skip_comment,
            unknown_features,
        }
    }

    /// Where to start implementing `feature_name`: file patterns for its category, search
    /// keywords, hints, and the candidate files ranked by relevance.
    pub fn guidance<S: AsRef<str>>(
        &self,
        feature_name: &str,
        candidate_files: &[S],
    ) -> ImplementationGuidance {
        let category = guidance::guidance_category_for(&self.registry, feature_name);
        let (file_patterns, hints) = match category {
            Some(c) => (
                c.file_patterns().to_vec(),
                implementation_hints(feature_name, c),
            ),
            None => (Vec::new(), Vec::new()),
        };
        ImplementationGuidance {
            feature: feature_name.to_string(),
            category,
            file_patterns,
            search_keywords: search_keywords(feature_name),
            hints,
            ranked_files: rank_files(candidate_files, feature_name),
        }
    }
}

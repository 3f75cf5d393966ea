use crate::raster::{AnalysisError, DiffInputs, DiffOutcome, analyze_diff_files};
use crate::{NoSvgSource, SvgSource, Triage, timing_enabled};
use indexmap::IndexMap;
use serde::Serialize;
use std::time::Instant;
use svgtriage_core::{
    ComparisonArtifacts, FailureCategory, ParseWarning, ParsedTranscript, Severity, TestStatus,
    format_skip_entry, parse_transcript,
};

/// Group key for failures without any detected feature.
const NO_FEATURE_GROUP: &str = "other";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub not_implemented: usize,
    pub threshold_needed: usize,
    pub font_difference: usize,
    pub bug: usize,
}

impl CategoryTotals {
    pub fn record(&mut self, category: FailureCategory) {
        *self.slot(category) += 1;
    }

    pub fn get(&self, category: FailureCategory) -> usize {
        match category {
            FailureCategory::NotImplemented => self.not_implemented,
            FailureCategory::ThresholdNeeded => self.threshold_needed,
            FailureCategory::FontDifference => self.font_difference,
            FailureCategory::Bug => self.bug,
        }
    }

    fn slot(&mut self, category: FailureCategory) -> &mut usize {
        match category {
            FailureCategory::NotImplemented => &mut self.not_implemented,
            FailureCategory::ThresholdNeeded => &mut self.threshold_needed,
            FailureCategory::FontDifference => &mut self.font_difference,
            FailureCategory::Bug => &mut self.bug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriagedFailure {
    pub test: String,
    pub pixel_diff: u64,
    pub features: Vec<String>,
    pub category: FailureCategory,
    pub severity: Severity,
    pub suggested_skip: String,
    /// False when neither the transcript nor the [`SvgSource`] had the test's SVG; the
    /// classification then ignores features.
    pub svg_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_degraded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<AnalysisError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_analysis: Option<DiffOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchTriage {
    pub total_failures: usize,
    pub failures: Vec<TriagedFailure>,
    /// Test names keyed by their first detected feature.
    pub grouped_by_feature: IndexMap<String, Vec<String>>,
    pub summary: CategoryTotals,
    /// Failed tests without a pixel-diff annotation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unclassified: Vec<String>,
    pub warnings: Vec<ParseWarning>,
}

fn diff_inputs(artifacts: &ComparisonArtifacts) -> Option<DiffInputs> {
    Some(DiffInputs {
        actual: artifacts.actual.as_ref()?.into(),
        expected: artifacts.expected.as_ref()?.into(),
        diff: artifacts.diff.as_ref()?.into(),
    })
}

impl Triage {
    /// Triage every failing test of a transcript using only the SVG embedded in it.
    pub fn batch_triage(&self, transcript: &str) -> BatchTriage {
        self.batch_triage_with(transcript, &NoSvgSource)
    }

    /// Triage every failing test of a transcript. SVG embedded in the transcript wins over
    /// `source`. No single test can fail the batch: source and image problems are recorded on
    /// the affected failure.
    pub fn batch_triage_with(&self, transcript: &str, source: &dyn SvgSource) -> BatchTriage {
        let timing = timing_enabled();
        let total_start = timing.then(Instant::now);

        let parsed = parse_transcript(transcript);
        let parse = total_start.map(|s| s.elapsed());

        let classify_start = timing.then(Instant::now);
        let mut failures = Vec::new();
        let mut unclassified = Vec::new();
        for result in parsed
            .results
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
        {
            match result.pixel_diff {
                Some(pixel_diff) => {
                    failures.push(self.triage_failure(
                        &result.test_name,
                        pixel_diff,
                        &parsed,
                        source,
                    ));
                }
                None => {
                    tracing::debug!(test = %result.test_name, "failed without a pixel diff");
                    unclassified.push(result.test_name.clone());
                }
            }
        }
        let classify = classify_start.map(|s| s.elapsed());

        let mut grouped_by_feature: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut summary = CategoryTotals::default();
        for failure in &failures {
            let key = failure
                .features
                .first()
                .map(String::as_str)
                .unwrap_or(NO_FEATURE_GROUP);
            grouped_by_feature
                .entry(key.to_string())
                .or_default()
                .push(failure.test.clone());
            summary.record(failure.category);
        }

        if let Some(start) = total_start {
            eprintln!(
                "[triage-timing] tests={} failures={} total={:?} parse={:?} classify={:?} input_bytes={}",
                parsed.results.len(),
                failures.len(),
                start.elapsed(),
                parse.unwrap_or_default(),
                classify.unwrap_or_default(),
                transcript.len(),
            );
        }

        BatchTriage {
            total_failures: failures.len(),
            failures,
            grouped_by_feature,
            summary,
            unclassified,
            warnings: parsed.warnings,
        }
    }

    fn triage_failure(
        &self,
        test_name: &str,
        pixel_diff: u64,
        parsed: &ParsedTranscript,
        source: &dyn SvgSource,
    ) -> TriagedFailure {
        let mut source_error = None;
        let svg = match parsed.svg_sources.get(test_name) {
            Some(svg) => Some(svg.clone()),
            None => source.svg_for(test_name).unwrap_or_else(|err| {
                tracing::warn!(test = test_name, error = %err, "failed to load svg source");
                source_error = Some(AnalysisError::from(&err));
                None
            }),
        };

        let (features, detection_degraded) = match svg.as_deref() {
            Some(svg) => {
                let report = self.detect_features(svg);
                (report.features, report.degraded)
            }
            None => (Vec::new(), None),
        };
        let classification = self.categorizer().classify(pixel_diff, features);

        let diff_analysis = if self.options.analyze_artifacts {
            parsed
                .artifacts
                .get(test_name)
                .and_then(diff_inputs)
                .map(|inputs| {
                    let outcome = analyze_diff_files(&inputs, &self.options.diff);
                    if let DiffOutcome::Failed(err) = &outcome {
                        tracing::warn!(
                            test = test_name,
                            error = %err.message,
                            "diff analysis failed"
                        );
                    }
                    outcome
                })
        } else {
            None
        };

        TriagedFailure {
            test: test_name.to_string(),
            pixel_diff,
            features: classification
                .features
                .iter()
                .map(|f| f.name.clone())
                .collect(),
            category: classification.category,
            severity: classification.severity,
            suggested_skip: format_skip_entry(test_name, &classification.suggested_skip_comment),
            svg_available: svg.is_some(),
            detection_degraded,
            source_error,
            diff_analysis,
        }
    }
}

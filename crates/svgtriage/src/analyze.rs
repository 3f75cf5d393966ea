use crate::Triage;
use crate::raster::{
    AnalysisError, AnalysisErrorKind, DiffInputs, DiffOutcome, ImageEntry, ImageRole,
    analyze_diff_files, inspect_image,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use svgtriage_core::{FailureClassification, format_skip_entry, related_tests};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePaths {
    pub actual: Option<PathBuf>,
    pub expected: Option<PathBuf>,
    pub diff: Option<PathBuf>,
}

impl ImagePaths {
    pub fn is_empty(&self) -> bool {
        self.actual.is_none() && self.expected.is_none() && self.diff.is_none()
    }

    /// The complete triple, `None` when no path was given, or an error when only some were.
    pub fn diff_inputs(&self) -> Result<Option<DiffInputs>, AnalysisError> {
        match (&self.actual, &self.expected, &self.diff) {
            (Some(actual), Some(expected), Some(diff)) => Ok(Some(DiffInputs {
                actual: actual.clone(),
                expected: expected.clone(),
                diff: diff.clone(),
            })),
            (None, None, None) => Ok(None),
            _ => Err(AnalysisError::new(
                AnalysisErrorKind::MissingInput,
                "diff analysis needs actual, expected and diff images",
            )),
        }
    }

    fn roles(&self) -> impl Iterator<Item = (ImageRole, &PathBuf)> + '_ {
        [
            (ImageRole::Actual, self.actual.as_ref()),
            (ImageRole::Expected, self.expected.as_ref()),
            (ImageRole::Diff, self.diff.as_ref()),
        ]
        .into_iter()
        .filter_map(|(role, path)| path.map(|p| (role, p)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub test_name: String,
    pub svg_content: String,
    pub pixel_diff: u64,
    #[serde(default)]
    pub images: ImagePaths,
    /// Test names to search for neighbours of `test_name`.
    #[serde(default)]
    pub known_tests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub feature_count: usize,
    pub primary_feature: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestAnalysis {
    pub test_name: String,
    pub pixel_diff: u64,
    #[serde(flatten)]
    pub classification: FailureClassification,
    pub suggested_skip: String,
    pub analysis: AnalysisSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_degraded: Option<String>,
    pub related_tests: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_analysis: Option<DiffOutcome>,
}

impl Triage {
    /// Classifies one failing test from its SVG source and pixel diff. Supplied image paths
    /// are inspected and, when all three are present, analyzed; image problems are reported
    /// in the result.
    pub fn analyze_test(&self, request: &AnalyzeRequest) -> TestAnalysis {
        let detection = self.detect_features(&request.svg_content);
        let classification = self
            .categorizer()
            .classify(request.pixel_diff, detection.features);

        let analysis = AnalysisSummary {
            feature_count: classification.features.len(),
            primary_feature: classification
                .features
                .first()
                .map(|f| f.description.clone())
                .unwrap_or_else(|| "None detected".to_string()),
            recommendation: classification.category.recommendation().to_string(),
        };

        let related = related_tests(
            &request.test_name,
            &request.known_tests,
            self.options.related_window,
            self.options.related_limit,
        );

        let images = request
            .images
            .roles()
            .map(|(role, path)| inspect_image(role, path))
            .collect();
        let diff_analysis = match request.images.diff_inputs() {
            Ok(Some(inputs)) => Some(analyze_diff_files(&inputs, &self.options.diff)),
            Ok(None) => None,
            Err(err) => Some(DiffOutcome::Failed(err)),
        };

        TestAnalysis {
            test_name: request.test_name.clone(),
            pixel_diff: request.pixel_diff,
            suggested_skip: format_skip_entry(
                &request.test_name,
                &classification.suggested_skip_comment,
            ),
            classification,
            analysis,
            detection_degraded: detection.degraded,
            related_tests: related,
            images,
            diff_analysis,
        }
    }
}

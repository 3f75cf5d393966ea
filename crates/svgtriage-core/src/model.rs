use crate::features::Feature;
use crate::transcript::extract_test_prefix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// Outcome of one test execution observed in a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_name: String,
    pub status: TestStatus,
    /// Only ever set for [`TestStatus::Failed`].
    pub pixel_diff: Option<u64>,
    pub category_prefix: Option<String>,
}

impl TestResult {
    /// Builds a result, deriving the category prefix from the test name.
    ///
    /// A pixel diff attached to a non-failing verdict is discarded.
    pub fn new(test_name: impl Into<String>, status: TestStatus, pixel_diff: Option<u64>) -> Self {
        let test_name = test_name.into();
        let category_prefix = extract_test_prefix(&test_name).map(str::to_string);
        let pixel_diff = match status {
            TestStatus::Failed => pixel_diff,
            TestStatus::Passed | TestStatus::Skipped => None,
        };
        Self {
            test_name,
            status,
            pixel_diff,
            category_prefix,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub completion_rate: f64,
}

impl TestSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            passed: 0,
            failed: 0,
            skipped: 0,
            completion_rate: 0.0,
        };
        for r in results {
            match r.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::Skipped => summary.skipped += 1,
            }
        }
        summary.completion_rate = completion_rate(summary.passed, summary.total);
        summary
    }
}

/// `passed / total`, or `0.0` for an empty run.
pub fn completion_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipEntry {
    pub test_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    NotImplemented,
    ThresholdNeeded,
    FontDifference,
    Bug,
}

impl FailureCategory {
    pub const ALL: [FailureCategory; 4] = [
        FailureCategory::NotImplemented,
        FailureCategory::ThresholdNeeded,
        FailureCategory::FontDifference,
        FailureCategory::Bug,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::NotImplemented => "not_implemented",
            FailureCategory::ThresholdNeeded => "threshold_needed",
            FailureCategory::FontDifference => "font_difference",
            FailureCategory::Bug => "bug",
        }
    }

    /// What a human should do next with a failure of this category.
    pub fn recommendation(self) -> &'static str {
        match self {
            FailureCategory::NotImplemented => "Skip - feature not implemented",
            FailureCategory::ThresholdNeeded => "Adjust threshold",
            FailureCategory::FontDifference => "Skip - expected font difference",
            FailureCategory::Bug => "Investigate - possible bug",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_implemented" => Ok(Self::NotImplemented),
            "threshold_needed" => Ok(Self::ThresholdNeeded),
            "font_difference" => Ok(Self::FontDifference),
            "bug" => Ok(Self::Bug),
            other => Err(format!("unknown failure category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureClassification {
    pub category: FailureCategory,
    pub severity: Severity,
    pub features: Vec<Feature>,
    pub suggested_skip_comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    pub total: usize,
    pub passing: usize,
    pub failing: usize,
    pub skipped: usize,
    pub completion_rate: f64,
    pub test_results: Vec<TestResult>,
}

impl CategoryReport {
    pub fn empty(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            total: 0,
            passing: 0,
            failing: 0,
            skipped: 0,
            completion_rate: 0.0,
            test_results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: TestResult) {
        match result.status {
            TestStatus::Passed => self.passing += 1,
            TestStatus::Failed => self.failing += 1,
            TestStatus::Skipped => self.skipped += 1,
        }
        self.test_results.push(result);
        self.total = self.test_results.len();
        self.completion_rate = completion_rate(self.passing, self.total);
    }
}

/// Input that was recognised but could not be folded into a result.
///
/// Parsers never fail on malformed lines; they report them here and continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// A test started but no verdict followed before the next test or end of input.
    UnterminatedTest { test_name: String, line: usize },
    /// A pixel-diff annotation outside of any running test.
    StrayDiffAnnotation { line: usize },
    /// An `SVG Content for` block that never saw its closing `---`.
    UnterminatedSvgBlock { line: usize },
    /// An `SVG Content for` block that could not be attributed to a test.
    OrphanSvgBlock { line: usize },
    /// A skip-marker call that does not match the registry record grammar.
    MalformedSkipEntry { line: usize, text: String },
}

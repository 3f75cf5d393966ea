//! File relevance ranking: which source files most likely host a feature's implementation.
//!
//! Scoring is a fixed table of weighted predicates. Every predicate that fires is recorded on
//! the result so a ranking can be audited after the fact.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankSignal {
    /// The punctuation-normalized feature name occurs in the path.
    FeatureName,
    /// The path mentions a feature-category keyword.
    CategoryKeyword,
    /// The path looks like a component (implementation) file.
    Component,
    /// The path is a header.
    Header,
    /// The path looks like a test.
    TestFile,
}

impl RankSignal {
    pub fn weight(self) -> f64 {
        match self {
            RankSignal::FeatureName => 0.5,
            RankSignal::CategoryKeyword => 0.3,
            RankSignal::Component => 0.2,
            RankSignal::Header => 0.1,
            RankSignal::TestFile => -0.3,
        }
    }
}

/// Keywords drawn from the guidance categories (`text_styling`, `text_positioning`, ...).
const CATEGORY_KEYWORDS: &[&str] = &["text", "styling", "positioning", "elements", "layout"];
const COMPONENT_MARKER: &str = "component";
const HEADER_EXTENSIONS: &[&str] = &[".h", ".hh", ".hpp"];
const TEST_MARKER: &str = "test";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFile {
    pub path: String,
    /// Clamped to `[0, 1]`, rounded to two decimals.
    pub confidence: f64,
    pub signals: Vec<RankSignal>,
}

/// Lowercases and drops `_`, `-` and whitespace.
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn signals_for(path: &str, feature_key: &str) -> Vec<RankSignal> {
    let lower = path.to_lowercase();
    let mut signals = Vec::new();

    if !feature_key.is_empty() && squash(path).contains(feature_key) {
        signals.push(RankSignal::FeatureName);
    }
    if CATEGORY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        signals.push(RankSignal::CategoryKeyword);
    }
    if lower.contains(COMPONENT_MARKER) {
        signals.push(RankSignal::Component);
    }
    if HEADER_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        signals.push(RankSignal::Header);
    }
    if lower.contains(TEST_MARKER) {
        signals.push(RankSignal::TestFile);
    }
    signals
}

pub fn score_file(path: &str, feature_name: &str) -> RankedFile {
    let signals = signals_for(path, &squash(feature_name));
    let raw: f64 = signals.iter().map(|s| s.weight()).sum();
    let confidence = (raw.clamp(0.0, 1.0) * 100.0).round() / 100.0;
    RankedFile {
        path: path.to_string(),
        confidence,
        signals,
    }
}

/// Scores every candidate and sorts by descending confidence. Ties keep input order.
pub fn rank_files<S: AsRef<str>>(files: &[S], feature_name: &str) -> Vec<RankedFile> {
    let mut ranked: Vec<RankedFile> = files
        .iter()
        .map(|f| score_file(f.as_ref(), feature_name))
        .collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked
}

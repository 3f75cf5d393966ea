//! Aggregation over parsed results: per-category completion and missing-feature impact.

use crate::model::{CategoryReport, TestResult};
use crate::skips::SkipRegistry;
use crate::transcript::extract_test_prefix;
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Report key for tests whose names carry no category prefix.
pub const CATCH_ALL_CATEGORY: &str = "other";

fn re_not_implemented() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"Not impl:\s*[`<]?([^>`]+)[>`]?").unwrap())
}

fn re_test_ordinal() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"^([a-z]+-[a-z]+)-(\d+)\.svg$").unwrap())
}

fn category_key(result: &TestResult) -> &str {
    result
        .category_prefix
        .as_deref()
        .unwrap_or(CATCH_ALL_CATEGORY)
}

/// Groups results by category prefix, in first-seen order.
pub fn group_by_category(results: &[TestResult]) -> IndexMap<String, CategoryReport> {
    let mut reports: IndexMap<String, CategoryReport> = IndexMap::new();
    for result in results {
        let key = category_key(result);
        reports
            .entry(key.to_string())
            .or_insert_with(|| CategoryReport::empty(key))
            .push(result.clone());
    }
    reports
}

/// The report for one category; empty (zero totals) when nothing matched.
pub fn category_report(results: &[TestResult], category: &str) -> CategoryReport {
    let mut report = CategoryReport::empty(category);
    for result in results.iter().filter(|r| category_key(r) == category) {
        report.push(result.clone());
    }
    report
}

/// The feature token of a `Not impl: ...` skip reason, without its backticks or angle brackets.
pub fn missing_feature_token(reason: &str) -> Option<String> {
    let caps = re_not_implemented().captures(reason)?;
    let token = caps.get(1)?.as_str().trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Groups skipped tests by the feature their skip reason says is missing.
///
/// With a `category`, only tests whose prefix equals it are considered. Keys and test lists
/// follow registry order.
pub fn identify_missing_features(
    skips: &SkipRegistry,
    category: Option<&str>,
) -> IndexMap<String, Vec<String>> {
    let mut features: IndexMap<String, Vec<String>> = IndexMap::new();
    for (test_name, reason) in skips.iter() {
        if let Some(category) = category {
            if extract_test_prefix(test_name) != Some(category) {
                continue;
            }
        }
        if let Some(feature) = missing_feature_token(reason) {
            features
                .entry(feature)
                .or_default()
                .push(test_name.to_string());
        }
    }
    features
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingFeature {
    pub feature: String,
    pub test_count: usize,
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityFeature {
    pub feature: String,
    pub test_count: usize,
}

/// All missing features by descending impact; equal counts keep first-encountered order.
pub fn rank_missing_features(features: &IndexMap<String, Vec<String>>) -> Vec<MissingFeature> {
    let mut ranked: Vec<MissingFeature> = features
        .iter()
        .map(|(feature, tests)| MissingFeature {
            feature: feature.clone(),
            test_count: tests.len(),
            tests: tests.clone(),
        })
        .collect();
    ranked.sort_by(|a, b| b.test_count.cmp(&a.test_count));
    ranked
}

/// The feature blocking the most tests; the first one encountered wins a tie.
pub fn next_priority_feature(
    features: &IndexMap<String, Vec<String>>,
) -> Option<PriorityFeature> {
    let mut best: Option<(&String, usize)> = None;
    for (feature, tests) in features {
        if best.is_none_or(|(_, count)| tests.len() > count) {
            best = Some((feature, tests.len()));
        }
    }
    best.map(|(feature, test_count)| PriorityFeature {
        feature: feature.clone(),
        test_count,
    })
}

fn test_ordinal(test_name: &str) -> Option<(&str, u32)> {
    let caps = re_test_ordinal().captures(test_name)?;
    let prefix = caps.get(1)?.as_str();
    let ordinal = caps.get(2)?.as_str().parse().ok()?;
    Some((prefix, ordinal))
}

/// Known tests in the same category whose ordinal lies within `window` of `test_name`'s,
/// nearest first. Names outside the naming convention have no relatives.
pub fn related_tests<S: AsRef<str>>(
    test_name: &str,
    known_tests: &[S],
    window: u32,
    limit: usize,
) -> Vec<String> {
    let Some((prefix, ordinal)) = test_ordinal(test_name) else {
        return Vec::new();
    };

    let mut candidates: Vec<(u32, &str)> = Vec::new();
    for name in known_tests.iter().map(AsRef::as_ref) {
        if name == test_name || candidates.iter().any(|(_, n)| *n == name) {
            continue;
        }
        let Some((other_prefix, other_ordinal)) = test_ordinal(name) else {
            continue;
        };
        let distance = ordinal.abs_diff(other_ordinal);
        if other_prefix == prefix && distance <= window {
            candidates.push((distance, name));
        }
    }
    candidates.sort_by_key(|(distance, _)| *distance);
    candidates
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.to_string())
        .collect()
}

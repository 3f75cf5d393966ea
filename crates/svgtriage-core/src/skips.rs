//! Parser for the persisted skip registry.
//!
//! Entries look like `{"e-text-002.svg", Params::Skip()},  // Not impl: dx attribute` and may
//! wrap after the test name, so the registry is scanned as a whole rather than per line. The
//! reason comment must sit on the line that closes the entry, and entries on lines starting
//! with `//` are inactive.

use crate::model::{ParseWarning, SkipEntry};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const SKIP_MARKER: &str = "Params::Skip()";

fn re_skip_entry() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| {
        Regex::new(r#"\{"([^"]+)",\s*Params::Skip\(\)\},[ \t]*//[ \t]*(\S[^\n]*)"#).unwrap()
    })
}

fn is_commented_out(text: &str, idx: usize) -> bool {
    let line_start = text[..idx].rfind('\n').map_or(0, |i| i + 1);
    text[line_start..idx].trim_start().starts_with("//")
}

/// Test name to skip reason, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipRegistry {
    entries: IndexMap<String, String>,
    warnings: Vec<ParseWarning>,
}

impl SkipRegistry {
    /// Parses registry text. A repeated test name keeps the reason of its last occurrence.
    pub fn parse(text: &str) -> Self {
        let mut entries: IndexMap<String, String> = IndexMap::new();
        let mut covered: Vec<std::ops::Range<usize>> = Vec::new();

        for caps in re_skip_entry().captures_iter(text) {
            let (Some(all), Some(name), Some(reason)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            covered.push(all.range());
            if is_commented_out(text, all.start()) {
                continue;
            }
            entries.insert(name.as_str().to_string(), reason.as_str().trim().to_string());
        }

        let mut warnings = Vec::new();
        for (idx, _) in text.match_indices(SKIP_MARKER) {
            if covered.iter().any(|r| r.contains(&idx)) || is_commented_out(text, idx) {
                continue;
            }
            let line = text[..idx].matches('\n').count() + 1;
            let line_text = text.lines().nth(line - 1).unwrap_or_default().trim();
            tracing::debug!(line, text = line_text, "malformed skip entry");
            warnings.push(ParseWarning::MalformedSkipEntry {
                line,
                text: line_text.to_string(),
            });
        }

        Self { entries, warnings }
    }

    pub fn get(&self, test_name: &str) -> Option<&str> {
        self.entries.get(test_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(name, reason)| (name.as_str(), reason.as_str()))
    }

    pub fn entries(&self) -> Vec<SkipEntry> {
        self.iter()
            .map(|(test_name, reason)| SkipEntry {
                test_name: test_name.to_string(),
                reason: reason.to_string(),
            })
            .collect()
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }
}

/// Formats a registry line for `test_name` with the given reason comment.
pub fn format_skip_entry(test_name: &str, comment: &str) -> String {
    format!("{{\"{test_name}\", {SKIP_MARKER}}},  // {comment}")
}

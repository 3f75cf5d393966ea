//! Parser for conformance-suite test transcripts (gtest output from the resvg image
//! comparison fixture).
//!
//! Recognised line shapes:
//!
//! ```text
//! [ RUN      ] ResvgTest/e_text_002
//! [  COMPARE ] e-text-002.svg: FAIL (1234 pixels differ, with 100 max)
//! Actual rendering: /tmp/e-text-002.png
//! Expected: resvg-test-suite/png/e-text-002.png
//! Diff: /tmp/diff_e-text-002.png
//! [  FAILED  ] ResvgTest/e_text_002
//! ```
//!
//! plus `SVG Content for ...` blocks terminated by a `---` line. Everything else is tool
//! chatter and is ignored.

use crate::model::{ParseWarning, TestResult, TestStatus, TestSummary};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn re_run() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"\[\s*RUN\s*\].*ResvgTest/(\w+)").unwrap())
}

fn re_ok() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"\[\s*OK\s*\]").unwrap())
}

fn re_failed() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"\[\s*FAILED\s*\]").unwrap())
}

fn re_pixel_diff() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"(\d+)\s+pixels?\s+differ").unwrap())
}

fn re_test_prefix() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"^([a-z]+-[a-z]+)-\d+\.svg$").unwrap())
}

fn re_svg_header_name() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"SVG Content for\s+([\w.-]+?)(?:\.svg)?:?\s*$").unwrap())
}

const COMPARE_MARKER: &str = "[  COMPARE ]";
const SVG_BLOCK_MARKER: &str = "SVG Content for";

/// Maps a gtest parameter id (`e_text_002`) to the on-disk test file name (`e-text-002.svg`).
pub fn normalize_test_id(raw: &str) -> String {
    format!("{}.svg", raw.replace('_', "-"))
}

/// Extracts the two-token category prefix of a conformance test file name.
///
/// `"e-text-002.svg"` yields `Some("e-text")`; names outside the
/// `<letters>-<letters>-<digits>.svg` convention yield `None`.
pub fn extract_test_prefix(test_name: &str) -> Option<&str> {
    re_test_prefix()
        .captures(test_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Image files the comparison fixture wrote for a failing test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonArtifacts {
    pub actual: Option<String>,
    pub expected: Option<String>,
    pub diff: Option<String>,
}

impl ComparisonArtifacts {
    pub fn is_complete(&self) -> bool {
        self.actual.is_some() && self.expected.is_some() && self.diff.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTranscript {
    /// One result per verdict, in verdict order.
    pub results: Vec<TestResult>,
    pub summary: TestSummary,
    /// Embedded SVG sources keyed by test name.
    pub svg_sources: IndexMap<String, String>,
    pub artifacts: IndexMap<String, ComparisonArtifacts>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedTranscript {
    pub fn result(&self, test_name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.test_name == test_name)
    }
}

struct RunningTest {
    name: String,
    pixel_diff: Option<u64>,
    line: usize,
}

struct SvgBlock {
    test_name: Option<String>,
    lines: Vec<String>,
    line: usize,
}

/// Folds a transcript into per-test results.
///
/// A test that starts but never reaches a verdict is dropped and reported as
/// [`ParseWarning::UnterminatedTest`]; interrupted runs are common and must not poison the
/// remaining results.
pub fn parse_transcript(text: &str) -> ParsedTranscript {
    let mut results: Vec<TestResult> = Vec::new();
    let mut svg_sources: IndexMap<String, String> = IndexMap::new();
    let mut artifacts: IndexMap<String, ComparisonArtifacts> = IndexMap::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();

    let mut current: Option<RunningTest> = None;
    let mut block: Option<SvgBlock> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(open) = block.as_mut() {
            if line.trim() == "---" {
                // A `---` directly after the header opens the block rather than closing it.
                if open.lines.is_empty() {
                    continue;
                }
                if let Some(done) = block.take() {
                    finish_svg_block(done, &mut svg_sources, &mut warnings);
                }
            } else {
                open.lines.push(line.to_string());
            }
            continue;
        }

        if line.contains(SVG_BLOCK_MARKER) {
            let test_name = current
                .as_ref()
                .map(|t| t.name.clone())
                .or_else(|| svg_header_test_name(line))
                .or_else(|| results.last().map(|r| r.test_name.clone()));
            block = Some(SvgBlock {
                test_name,
                lines: Vec::new(),
                line: line_no,
            });
            continue;
        }

        let mut verdict: Option<TestStatus> = None;
        if let Some(caps) = re_run().captures(line) {
            if let Some(prev) = current.take() {
                tracing::debug!(
                    test = %prev.name,
                    line = prev.line,
                    "test started without a verdict"
                );
                warnings.push(ParseWarning::UnterminatedTest {
                    test_name: prev.name,
                    line: prev.line,
                });
            }
            let name = normalize_test_id(&caps[1]);
            tracing::trace!(test = %name, line = line_no, "test started");
            current = Some(RunningTest {
                name,
                pixel_diff: None,
                line: line_no,
            });
        } else if re_ok().is_match(line) && current.is_some() {
            verdict = Some(TestStatus::Passed);
        } else if re_failed().is_match(line) && current.is_some() {
            verdict = Some(TestStatus::Failed);
        } else if line.contains(COMPARE_MARKER) && line.contains("FAIL") {
            let count = re_pixel_diff()
                .captures(line)
                .and_then(|c| c[1].parse::<u64>().ok());
            match (current.as_mut(), count) {
                (Some(test), Some(count)) => test.pixel_diff = Some(count),
                (None, Some(_)) => {
                    warnings.push(ParseWarning::StrayDiffAnnotation { line: line_no })
                }
                (_, None) => {}
            }
        } else if line.contains("SKIPPED") && current.is_some() {
            verdict = Some(TestStatus::Skipped);
        } else if let Some(test) = current.as_ref() {
            record_artifact(line, &test.name, &mut artifacts);
        }

        if let Some(status) = verdict {
            if let Some(test) = current.take() {
                tracing::trace!(test = %test.name, ?status, "test finished");
                results.push(TestResult::new(test.name, status, test.pixel_diff));
            }
        }
    }

    if let Some(test) = current {
        warnings.push(ParseWarning::UnterminatedTest {
            test_name: test.name,
            line: test.line,
        });
    }
    if let Some(open) = block {
        warnings.push(ParseWarning::UnterminatedSvgBlock { line: open.line });
    }

    let summary = TestSummary::from_results(&results);
    ParsedTranscript {
        results,
        summary,
        svg_sources,
        artifacts,
        warnings,
    }
}

fn svg_header_test_name(line: &str) -> Option<String> {
    let caps = re_svg_header_name().captures(line.trim_end())?;
    let raw = caps.get(1)?.as_str();
    Some(normalize_test_id(raw))
}

fn finish_svg_block(
    block: SvgBlock,
    svg_sources: &mut IndexMap<String, String>,
    warnings: &mut Vec<ParseWarning>,
) {
    match block.test_name {
        Some(name) => {
            svg_sources.insert(name, block.lines.join("\n"));
        }
        None => warnings.push(ParseWarning::OrphanSvgBlock { line: block.line }),
    }
}

fn record_artifact(
    line: &str,
    test_name: &str,
    artifacts: &mut IndexMap<String, ComparisonArtifacts>,
) {
    let line = line.trim();
    let (slot, path) = if let Some(p) = line.strip_prefix("Actual rendering:") {
        (0, p)
    } else if let Some(p) = line.strip_prefix("Expected:") {
        (1, p)
    } else if let Some(p) = line.strip_prefix("Diff:") {
        (2, p)
    } else {
        return;
    };
    let path = path.trim();
    // gtest assertion output also starts lines with `Expected:`; only image paths count.
    if !path.to_ascii_lowercase().ends_with(".png") {
        return;
    }
    let entry = artifacts.entry(test_name.to_string()).or_default();
    let target = match slot {
        0 => &mut entry.actual,
        1 => &mut entry.expected,
        _ => &mut entry.diff,
    };
    *target = Some(path.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_test_prefix_follows_naming_convention() {
        assert_eq!(extract_test_prefix("e-text-002.svg"), Some("e-text"));
        assert_eq!(extract_test_prefix("a-transform-001.svg"), Some("a-transform"));
        assert_eq!(extract_test_prefix("a-fill-opacity-004.svg"), None);
        assert_eq!(extract_test_prefix("custom-test.svg"), None);
        assert_eq!(extract_test_prefix("invalid"), None);
    }

    #[test]
    fn normalize_test_id_uses_hyphens_and_svg_suffix() {
        assert_eq!(normalize_test_id("e_text_002"), "e-text-002.svg");
    }

    #[test]
    fn passing_compare_lines_are_not_diff_annotations() {
        let transcript = "\
[ RUN      ] ResvgTest/e_text_001
[  COMPARE ] e-text-001.svg: PASS (12 pixels differ, out of 100 max)
[       OK ] ResvgTest/e_text_001
";
        let parsed = parse_transcript(transcript);
        assert_eq!(parsed.results[0].status, TestStatus::Passed);
        assert_eq!(parsed.results[0].pixel_diff, None);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn unterminated_tests_are_dropped_with_a_warning() {
        let transcript = "\
[ RUN      ] ResvgTest/e_text_001
[ RUN      ] ResvgTest/e_text_002
[       OK ] ResvgTest/e_text_002
[ RUN      ] ResvgTest/e_text_003
[  COMPARE ] e-text-003.svg: FAIL (77 pixels differ, with 0 max)
";
        let parsed = parse_transcript(transcript);
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].test_name, "e-text-002.svg");
        assert_eq!(
            parsed.warnings,
            vec![
                ParseWarning::UnterminatedTest {
                    test_name: "e-text-001.svg".to_string(),
                    line: 1,
                },
                ParseWarning::UnterminatedTest {
                    test_name: "e-text-003.svg".to_string(),
                    line: 4,
                },
            ]
        );
    }

    #[test]
    fn stray_diff_annotation_is_reported() {
        let transcript = "[  COMPARE ] e-text-009.svg: FAIL (10 pixels differ, with 0 max)\n";
        let parsed = parse_transcript(transcript);
        assert!(parsed.results.is_empty());
        assert_eq!(
            parsed.warnings,
            vec![ParseWarning::StrayDiffAnnotation { line: 1 }]
        );
    }

    #[test]
    fn skipped_verdicts_are_recognised() {
        let transcript = "\
[ RUN      ] ResvgTest/e_text_010
[  SKIPPED ] ResvgTest/e_text_010
";
        let parsed = parse_transcript(transcript);
        assert_eq!(parsed.results[0].status, TestStatus::Skipped);
        assert_eq!(parsed.summary.skipped, 1);
    }

    #[test]
    fn svg_blocks_and_artifacts_attach_to_the_running_test() {
        let transcript = "\
[ RUN      ] ResvgTest/e_text_020
[  COMPARE ] e-text-020.svg: FAIL (4321 pixels differ, with 100 max)
Actual rendering: /tmp/e-text-020.png
Expected: resvg-test-suite/png/e-text-020.png
Diff: /tmp/diff_e-text-020.png
SVG Content for e-text-020.svg:
---
<svg xmlns=\"http://www.w3.org/2000/svg\">
  <text>hi</text>
</svg>
---
[  FAILED  ] ResvgTest/e_text_020
";
        let parsed = parse_transcript(transcript);
        assert_eq!(parsed.results[0].pixel_diff, Some(4321));
        assert_eq!(
            parsed.svg_sources.get("e-text-020.svg").map(String::as_str),
            Some("<svg xmlns=\"http://www.w3.org/2000/svg\">\n  <text>hi</text>\n</svg>")
        );
        let artifacts = &parsed.artifacts["e-text-020.svg"];
        assert!(artifacts.is_complete());
        assert_eq!(artifacts.diff.as_deref(), Some("/tmp/diff_e-text-020.png"));
    }

    #[test]
    fn svg_block_after_verdict_uses_header_name() {
        let transcript = "\
[ RUN      ] ResvgTest/e_text_001
[       OK ] ResvgTest/e_text_001
SVG Content for e-text-030.svg:
<svg/>
---
";
        let parsed = parse_transcript(transcript);
        assert_eq!(
            parsed.svg_sources.get("e-text-030.svg").map(String::as_str),
            Some("<svg/>")
        );
    }

    #[test]
    fn gtest_expectation_lines_are_not_artifacts() {
        let transcript = "\
[ RUN      ] ResvgTest/e_text_040
Expected: goldenImage.width
[  FAILED  ] ResvgTest/e_text_040
";
        let parsed = parse_transcript(transcript);
        assert!(parsed.artifacts.is_empty());
        assert_eq!(parsed.results[0].pixel_diff, None);
    }

    #[test]
    fn unterminated_svg_block_is_reported() {
        let transcript = "\
[ RUN      ] ResvgTest/e_text_050
SVG Content for e-text-050.svg:
<svg>
";
        let parsed = parse_transcript(transcript);
        assert!(parsed.results.is_empty());
        assert!(
            parsed
                .warnings
                .contains(&ParseWarning::UnterminatedSvgBlock { line: 2 })
        );
    }
}

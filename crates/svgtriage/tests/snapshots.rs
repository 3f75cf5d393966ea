use serde_json::Value;
use std::path::{Path, PathBuf};
use svgtriage::{DirSvgSource, Triage};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

fn fixtures_root() -> PathBuf {
    workspace_root().join("fixtures")
}

fn list_transcripts(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "log"))
        .collect();
    out.sort();
    out
}

#[test]
fn transcripts_match_golden_snapshots() {
    let transcripts = list_transcripts(&fixtures_root().join("transcripts"));
    assert!(
        !transcripts.is_empty(),
        "no transcripts found under {}",
        fixtures_root().display()
    );

    let triage = Triage::default();
    let svg_dir = DirSvgSource::new(fixtures_root().join("svg"));
    for log_path in transcripts {
        let text = std::fs::read_to_string(&log_path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", log_path.display()));
        let batch = triage.batch_triage_with(&text, &svg_dir);
        let snapshot = serde_json::to_value(&batch)
            .unwrap_or_else(|e| panic!("failed to serialize {}: {e}", log_path.display()));

        let golden_path = log_path.with_extension("golden.json");
        let golden_text = std::fs::read_to_string(&golden_path).unwrap_or_else(|_| {
            panic!(
                "missing golden snapshot {} (generate with `cargo run -p xtask -- update-snapshots`)",
                golden_path.display()
            )
        });
        let golden: Value = serde_json::from_str(&golden_text)
            .unwrap_or_else(|e| panic!("invalid golden JSON {}: {e}", golden_path.display()));

        assert_eq!(
            snapshot,
            golden,
            "snapshot mismatch for {} (update with `cargo run -p xtask -- update-snapshots`)",
            log_path.display()
        );
    }
}

#[test]
fn skip_fixture_ranks_missing_features() {
    let path = fixtures_root().join("skips").join("resvg_text_skips.txt");
    let text = std::fs::read_to_string(&path).expect("read skip fixture");
    let triage = Triage::default();
    let transcript_path = fixtures_root().join("transcripts").join("e-text-run.log");
    let transcript = std::fs::read_to_string(&transcript_path).expect("read transcript fixture");

    let out = triage.category_report("e-text", &transcript, Some(&text));
    assert_eq!(out.report.total, 7);
    assert_eq!(out.report.passing, 1);
    assert_eq!(out.report.skipped, 1);

    let ranked: Vec<(&str, usize)> = out
        .missing_features
        .iter()
        .map(|m| (m.feature.as_str(), m.test_count))
        .collect();
    assert_eq!(
        ranked,
        [
            ("dx", 2),
            ("Multiple x values", 1),
            ("letter-spacing", 1),
            ("textPath", 1)
        ]
    );
    let next = out.next_priority.expect("a priority feature");
    assert_eq!((next.feature.as_str(), next.test_count), ("dx", 2));
    assert_eq!(out.warnings.len(), 1);
}

use crate::XtaskError;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use svgtriage::{DirSvgSource, Triage};

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
}

fn parse_filter(args: &[String]) -> Result<Option<String>, XtaskError> {
    let mut filter: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--filter" => {
                i += 1;
                filter = Some(args.get(i).ok_or(XtaskError::Usage)?.to_string());
            }
            "--help" | "-h" => return Err(XtaskError::Usage),
            _ => return Err(XtaskError::Usage),
        }
        i += 1;
    }
    Ok(filter)
}

fn list_transcripts(dir: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "log"))
        .collect();
    out.sort();
    if let Some(f) = filter {
        out.retain(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(f))
        });
    }
    out
}

/// Same inputs as `crates/svgtriage/tests/snapshots.rs`: default triage, SVG fallbacks from
/// `fixtures/svg`.
fn snapshot_for(
    log_path: &Path,
    triage: &Triage,
    svg_dir: &DirSvgSource,
) -> Result<JsonValue, XtaskError> {
    let text = fs::read_to_string(log_path).map_err(|source| XtaskError::ReadFile {
        path: log_path.display().to_string(),
        source,
    })?;
    let batch = triage.batch_triage_with(&text, svg_dir);
    Ok(serde_json::to_value(&batch)?)
}

pub(crate) fn update_snapshots(args: Vec<String>) -> Result<(), XtaskError> {
    let filter = parse_filter(&args)?;
    let root = fixtures_root();
    let transcripts = list_transcripts(&root.join("transcripts"), filter.as_deref());
    if transcripts.is_empty() {
        return Err(XtaskError::SnapshotUpdateFailed(format!(
            "no .log transcripts found under {}",
            root.join("transcripts").display()
        )));
    }

    let triage = Triage::default();
    let svg_dir = DirSvgSource::new(root.join("svg"));
    let mut failures = Vec::new();
    for log_path in transcripts {
        let snapshot = match snapshot_for(&log_path, &triage, &svg_dir) {
            Ok(v) => v,
            Err(err) => {
                failures.push(err.to_string());
                continue;
            }
        };
        let pretty = serde_json::to_string_pretty(&snapshot)?;
        let out_path = log_path.with_extension("golden.json");
        if let Err(source) = fs::write(&out_path, format!("{pretty}\n")) {
            failures.push(
                XtaskError::WriteFile {
                    path: out_path.display().to_string(),
                    source,
                }
                .to_string(),
            );
            continue;
        }
        println!("wrote {}", out_path.display());
    }

    if failures.is_empty() {
        return Ok(());
    }

    Err(XtaskError::SnapshotUpdateFailed(failures.join("\n")))
}

pub(crate) fn check_snapshots(args: Vec<String>) -> Result<(), XtaskError> {
    let filter = parse_filter(&args)?;
    let root = fixtures_root();
    let triage = Triage::default();
    let svg_dir = DirSvgSource::new(root.join("svg"));

    let transcripts = list_transcripts(&root.join("transcripts"), filter.as_deref());
    if transcripts.is_empty() {
        return Err(XtaskError::SnapshotCheckFailed(format!(
            "no .log transcripts matched under {}",
            root.join("transcripts").display()
        )));
    }

    let mut mismatches = Vec::new();
    for log_path in transcripts {
        let golden_path = log_path.with_extension("golden.json");
        let golden_text = match fs::read_to_string(&golden_path) {
            Ok(v) => v,
            Err(_) => {
                mismatches.push(format!("missing golden {}", golden_path.display()));
                continue;
            }
        };
        let golden: JsonValue = serde_json::from_str(&golden_text)?;
        if snapshot_for(&log_path, &triage, &svg_dir)? != golden {
            mismatches.push(format!("mismatch: {}", log_path.display()));
        }
    }

    if mismatches.is_empty() {
        return Ok(());
    }
    mismatches.push("(update with `cargo run -p xtask -- update-snapshots`)".to_string());
    Err(XtaskError::SnapshotCheckFailed(mismatches.join("\n")))
}

/// Golden files without a transcript next to them are never compared by the snapshot test.
pub(crate) fn check_orphaned_goldens() -> Result<(), XtaskError> {
    orphaned_goldens_in(&fixtures_root().join("transcripts"))
}

fn orphaned_goldens_in(dir: &Path) -> Result<(), XtaskError> {
    let entries = fs::read_dir(dir).map_err(|source| XtaskError::ReadFile {
        path: dir.display().to_string(),
        source,
    })?;

    let mut orphans: Vec<String> = entries
        .flatten()
        .map(|e| e.path())
        .filter_map(|p| {
            let name = p.file_name()?.to_str()?;
            let stem = name.strip_suffix(".golden.json")?;
            let log = p.with_file_name(format!("{stem}.log"));
            (!log.is_file()).then(|| p.display().to_string())
        })
        .collect();
    orphans.sort();

    if orphans.is_empty() {
        return Ok(());
    }
    Err(XtaskError::SnapshotCheckFailed(format!(
        "golden files without a transcript:\n{}",
        orphans.join("\n")
    )))
}

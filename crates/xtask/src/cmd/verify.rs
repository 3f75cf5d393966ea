use crate::XtaskError;
use crate::cmd;
use std::path::{Path, PathBuf};
use std::process::Command;

const CARGO_STEPS: &[(&str, &[&str])] = &[
    ("cargo fmt --check", &["fmt", "--check"]),
    ("cargo nextest run", &["nextest", "run", "--workspace"]),
];

fn run_cargo(workspace_root: &Path, what: &str, args: &[&str]) -> Result<(), XtaskError> {
    println!("\n== {what} ==");
    let status = Command::new("cargo")
        .args(args)
        .current_dir(workspace_root)
        .status()
        .map_err(|e| {
            XtaskError::VerifyFailed(format!("{what}: failed to spawn process: {e}"))
        })?;
    if !status.success() {
        return Err(XtaskError::VerifyFailed(format!("{what}: exited with {status}")));
    }
    Ok(())
}

/// Formatting, the workspace test suite, then fixture hygiene the tests cannot see (golden
/// files whose transcript was renamed or removed).
pub(crate) fn verify(args: Vec<String>) -> Result<(), XtaskError> {
    if !args.is_empty() {
        return Err(XtaskError::Usage);
    }

    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");
    for (what, cargo_args) in CARGO_STEPS {
        run_cargo(&workspace_root, what, cargo_args)?;
    }

    println!("\n== orphaned goldens ==");
    cmd::check_orphaned_goldens()
}

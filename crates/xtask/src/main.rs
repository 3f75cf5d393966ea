mod cmd;

#[derive(Debug, thiserror::Error)]
enum XtaskError {
    #[error("usage: xtask <command> ...")]
    Usage,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("verification failed:\n{0}")]
    VerifyFailed(String),
    #[error("snapshot update failed: {0}")]
    SnapshotUpdateFailed(String),
    #[error("snapshot check failed:\n{0}")]
    SnapshotCheckFailed(String),
}

fn print_help(topic: Option<&str>) {
    if let Some(topic) = topic.filter(|t| !t.trim().is_empty()) {
        println!("usage: xtask {topic} ...");
        println!();
        println!("Subcommands accept `--help`/`-h` and will show a usage error.");
        println!("See: `crates/xtask/src/main.rs` for the full argument grammar.");
        return;
    }

    println!("usage: xtask <command> ...");
    println!();
    println!("Commands:");
    println!("  verify              cargo fmt --check, cargo nextest run, orphaned golden check");
    println!("  update-snapshots    regenerate fixtures/transcripts/*.golden.json");
    println!("  check-snapshots     compare batch triage output with the goldens");
    println!();
    println!("Tips:");
    println!("  - `cargo run -p xtask -- update-snapshots --filter interrupted`");
    println!();
    println!("Topics:");
    println!("  xtask help <command>");
}

fn main() -> Result<(), XtaskError> {
    let mut args = std::env::args().skip(1);
    let Some(cmd_name) = args.next() else {
        return Err(XtaskError::Usage);
    };

    if matches!(cmd_name.as_str(), "--help" | "-h") {
        print_help(None);
        return Ok(());
    }
    if cmd_name == "help" {
        print_help(args.next().as_deref());
        return Ok(());
    }

    match cmd_name.as_str() {
        "verify" => cmd::verify(args.collect()),
        "update-snapshots" => cmd::update_snapshots(args.collect()),
        "check-snapshots" => cmd::check_snapshots(args.collect()),
        other => Err(XtaskError::UnknownCommand(other.to_string())),
    }
}

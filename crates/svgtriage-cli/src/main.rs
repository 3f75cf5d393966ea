use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use svgtriage::raster;
use svgtriage::{
    AnalyzeRequest, DirSvgSource, FailureCategory, FeatureRegistry, ImagePaths, NoSvgSource,
    Triage, TriageError, TriageOptions,
};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Triage(TriageError),
    Json(serde_json::Error),
    InvalidCategory(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Triage(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::InvalidCategory(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<TriageError> for CliError {
    fn from(value: TriageError) -> Self {
        Self::Triage(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Detect,
    Analyze,
    Triage,
    Report,
    Skip,
    Rank,
    Diff,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    inputs: Vec<String>,
    pretty: bool,
    options: Option<String>,
    test_name: Option<String>,
    pixel_diff: Option<u64>,
    images: ImagePaths,
    svg_dir: Option<String>,
    category: Option<String>,
    skips: Option<String>,
    features: Vec<String>,
}

fn usage() -> &'static str {
    "svgtriage-cli\n\
\n\
USAGE:\n\
  svgtriage-cli detect [<svg>|-]\n\
  svgtriage-cli analyze --pixel-diff <n> [--test-name <name>] [--actual <png>] [--expected <png>] [--diff <png>] [<svg>|-]\n\
  svgtriage-cli triage [--svg-dir <dir>] [<transcript>|-]\n\
  svgtriage-cli report --category <prefix> [--skips <file>] [<transcript>|-]\n\
  svgtriage-cli skip --category <category> [--feature <name>]... <test>\n\
  svgtriage-cli rank --feature <name> <path>...\n\
  svgtriage-cli diff --actual <png> --expected <png> --diff <png>\n\
\n\
COMMON OPTIONS:\n\
  --pretty             indent JSON output\n\
  --options <json>     load thresholds from a TriageOptions JSON file\n\
\n\
NOTES:\n\
  - If <svg>/<transcript> is omitted or '-', input is read from stdin.\n\
  - skip categories: not_implemented, threshold_needed, font_difference, bug.\n\
  - analyze uses the file name of <svg> as the test name unless --test-name is given.\n\
  - Set SVGTRIAGE_TIMING=1 to print batch timings to stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    let Some(command) = it.next() else {
        return Err(CliError::Usage(usage()));
    };
    args.command = match command.as_str() {
        "detect" => Command::Detect,
        "analyze" => Command::Analyze,
        "triage" => Command::Triage,
        "report" => Command::Report,
        "skip" => Command::Skip,
        "rank" => Command::Rank,
        "diff" => Command::Diff,
        _ => return Err(CliError::Usage(usage())),
    };

    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--pretty" => args.pretty = true,
            "--options" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.options = Some(path.clone());
            }
            "--test-name" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.test_name = Some(name.clone());
            }
            "--pixel-diff" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.pixel_diff = Some(n.parse::<u64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--actual" | "--expected" | "--diff" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let slot = match a.as_str() {
                    "--actual" => &mut args.images.actual,
                    "--expected" => &mut args.images.expected,
                    _ => &mut args.images.diff,
                };
                *slot = Some(PathBuf::from(path));
            }
            "--svg-dir" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.svg_dir = Some(dir.clone());
            }
            "--category" => {
                let Some(category) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.category = Some(category.clone());
            }
            "--skips" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.skips = Some(path.clone());
            }
            "--feature" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.features.push(name.clone());
            }
            "-" => args.inputs.push("-".to_string()),
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => args.inputs.push(path.to_string()),
        }
    }

    let max_inputs = match args.command {
        Command::Rank => usize::MAX,
        Command::Diff => 0,
        _ => 1,
    };
    if args.inputs.len() > max_inputs {
        return Err(CliError::Usage(usage()));
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn test_name_from_input(input: Option<&str>) -> String {
    input
        .filter(|p| *p != "-")
        .and_then(|p| std::path::Path::new(p).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn run(args: Args) -> Result<(), CliError> {
    let options = match args.options.as_deref() {
        Some(path) => svgtriage::load_options(std::path::Path::new(path))?,
        None => TriageOptions::default(),
    };
    let triage = Triage::new(FeatureRegistry::resvg_text_defaults(), options);
    let input = args.inputs.first().map(String::as_str);

    match args.command {
        Command::Detect => {
            let svg = read_input(input)?;
            write_json(&triage.detect_features(&svg), args.pretty)
        }
        Command::Analyze => {
            let Some(pixel_diff) = args.pixel_diff else {
                return Err(CliError::Usage(usage()));
            };
            let request = AnalyzeRequest {
                test_name: args
                    .test_name
                    .clone()
                    .unwrap_or_else(|| test_name_from_input(input)),
                svg_content: read_input(input)?,
                pixel_diff,
                images: args.images,
                known_tests: Vec::new(),
            };
            write_json(&triage.analyze_test(&request), args.pretty)
        }
        Command::Triage => {
            let transcript = read_input(input)?;
            let batch = match args.svg_dir.as_deref() {
                Some(dir) => triage.batch_triage_with(&transcript, &DirSvgSource::new(dir)),
                None => triage.batch_triage_with(&transcript, &NoSvgSource),
            };
            write_json(&batch, args.pretty)
        }
        Command::Report => {
            let Some(category) = args.category.as_deref() else {
                return Err(CliError::Usage(usage()));
            };
            let transcript = read_input(input)?;
            let skips = match args.skips.as_deref() {
                Some(path) => Some(std::fs::read_to_string(path)?),
                None => None,
            };
            let out = triage.category_report(category, &transcript, skips.as_deref());
            write_json(&out, args.pretty)
        }
        Command::Skip => {
            let (Some(category), Some(test_name)) = (args.category.as_deref(), input) else {
                return Err(CliError::Usage(usage()));
            };
            let category = category
                .parse::<FailureCategory>()
                .map_err(CliError::InvalidCategory)?;
            let suggestion = triage.suggest_skip(test_name, args.features.as_slice(), category);
            write_json(&suggestion, args.pretty)
        }
        Command::Rank => {
            let [feature] = args.features.as_slice() else {
                return Err(CliError::Usage(usage()));
            };
            if args.inputs.is_empty() {
                return Err(CliError::Usage(usage()));
            }
            write_json(&triage.guidance(feature, args.inputs.as_slice()), args.pretty)
        }
        Command::Diff => {
            let Some(inputs) = args.images.diff_inputs().ok().flatten() else {
                return Err(CliError::Usage(usage()));
            };
            let outcome = raster::analyze_diff_files(&inputs, &triage.options().diff);
            write_json(&outcome, args.pretty)
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        match err {
            CliError::Usage(msg) => {
                eprintln!("{msg}");
                std::process::exit(2);
            }
            err => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        }
    }
}

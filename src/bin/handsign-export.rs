//! Export the model and recorded gestures to timestamped files.

use std::path::PathBuf;

use handsign::config::{self, Settings};
use handsign::dataset::{GestureLibrary, export_timestamp_now};
use handsign::logging;

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportKind {
    Model,
    Dataset,
    All,
}

#[derive(Debug, Clone)]
struct CliOptions {
    out_dir: PathBuf,
    kind: ExportKind,
    library: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let settings = load_settings(options.config_path.as_ref())?;
    let root = match &options.library {
        Some(path) => path.clone(),
        None => settings
            .storage
            .library_root()
            .map_err(|err| err.to_string())?,
    };
    let library = GestureLibrary::open(root).map_err(|err| err.to_string())?;
    let stamp = export_timestamp_now().map_err(|err| err.to_string())?;

    match options.kind {
        ExportKind::Model => {
            let path = library
                .export_model(&options.out_dir, &stamp)
                .map_err(|err| err.to_string())?;
            println!("{}", path.display());
        }
        ExportKind::Dataset => {
            let export = library
                .export_dataset(&options.out_dir, &stamp)
                .map_err(|err| err.to_string())?;
            println!("{}", export.archive.display());
            println!("{}", export.csv.display());
        }
        ExportKind::All => {
            let path = library
                .export_all(&options.out_dir, &stamp)
                .map_err(|err| err.to_string())?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, String> {
    match path {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut out_dir: Option<PathBuf> = None;
    let mut kind = ExportKind::All;
    let mut library: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out_dir = Some(PathBuf::from(value));
            }
            "--kind" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--kind requires a value".to_string())?;
                kind = match value.as_str() {
                    "model" => ExportKind::Model,
                    "dataset" => ExportKind::Dataset,
                    "all" => ExportKind::All,
                    _ => return Err(format!("Invalid --kind value: {value}")),
                };
            }
            "--library" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--library requires a value".to_string())?;
                library = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let out_dir = out_dir.ok_or_else(|| "--out is required".to_string())?;
    Ok(CliOptions {
        out_dir,
        kind,
        library,
        config_path,
    })
}

fn help_text() -> String {
    [
        "handsign-export",
        "",
        "Usage:",
        "  handsign-export --out <dir> [options]",
        "",
        "Options:",
        "  --kind <model|dataset|all>  What to export (default: all).",
        "  --library <dir>             Gesture library root (default: from config).",
        "  --config <file>             Settings file (default: config.toml in the app dir).",
    ]
    .join("\n")
}

//! Record a gesture from a landmark frame stream and add it to the model.
//!
//! Frames are read one JSON array per line until the target frame count is
//! reached or the input ends.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use handsign::config::{self, Settings};
use handsign::dataset::GestureLibrary;
use handsign::landmarks::LandmarkFrame;
use handsign::logging;
use handsign::training::TrainingSession;

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone)]
struct CliOptions {
    label: String,
    input: Option<PathBuf>,
    library: Option<PathBuf>,
    config_path: Option<PathBuf>,
    target: Option<usize>,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let settings = load_settings(options.config_path.as_ref())?;
    let target = options
        .target
        .unwrap_or(settings.training.target_frame_count)
        .max(1);
    let root = match &options.library {
        Some(path) => path.clone(),
        None => settings
            .storage
            .library_root()
            .map_err(|err| err.to_string())?,
    };
    let library = GestureLibrary::open(root).map_err(|err| err.to_string())?;
    let loaded = library.load_classifier(settings.layout.feature_layout());
    if let Some(err) = &loaded.error {
        eprintln!("Existing model could not be loaded and will be replaced: {err}");
    }
    let mut classifier = loaded
        .classifier
        .with_soft_limit(settings.recognition.reference_soft_limit);

    let session = TrainingSession::start_recording(&options.label).map_err(|err| err.to_string())?;
    let reader: Box<dyn BufRead> = match &options.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).map_err(|err| format!("Failed to open {}: {err}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| format!("Failed to read input: {err}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: LandmarkFrame = serde_json::from_str(&line)
            .map_err(|err| format!("Invalid frame on line {}: {err}", line_no + 1))?;
        if frame.is_empty() {
            continue;
        }
        match session.append_frame(frame) {
            Some(count) if count >= target => break,
            Some(_) => {}
            None => break,
        }
    }

    let report = session
        .commit(&library, &mut classifier, settings.recognition.k)
        .map_err(|err| err.to_string())?;
    println!(
        "Recorded '{}': {} frames -> {}",
        report.label,
        report.samples_added,
        report.sample_file.display()
    );
    println!(
        "Model: {} samples -> {}",
        report.reference_size,
        report.model_file.display()
    );
    let recognized = report.self_check.label == report.label;
    println!(
        "Self-check: {} (confidence {:.3}){}",
        report.self_check.label,
        report.self_check.confidence,
        if recognized { "" } else { "  [not recognized]" }
    );
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
    let mut label: Option<String> = None;
    let mut input: Option<PathBuf> = None;
    let mut library: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut target: Option<usize> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--label" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--label requires a value".to_string())?;
                label = Some(value.clone());
            }
            "--input" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--input requires a value".to_string())?;
                input = Some(PathBuf::from(value));
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
            "--frames" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--frames requires a value".to_string())?;
                target = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --frames value: {value}"))?,
                );
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let label = label.ok_or_else(|| "--label is required".to_string())?;
    Ok(CliOptions {
        label,
        input,
        library,
        config_path,
        target,
    })
}

fn help_text() -> String {
    [
        "handsign-record",
        "",
        "Usage:",
        "  handsign-record --label <name> [options] < frames.jsonl",
        "",
        "Options:",
        "  --input <file>     Read frames from a file instead of stdin.",
        "  --frames <n>       Frames to record (default: training.target_frame_count).",
        "  --library <dir>    Gesture library root (default: from config).",
        "  --config <file>    Settings file (default: config.toml in the app dir).",
    ]
    .join("\n")
}

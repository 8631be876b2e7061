//! Recognize gestures from a stream of landmark frames.
//!
//! Reads one JSON frame per line (`[[x, y, z], ...]`) from a file or stdin and
//! prints one JSON outcome per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use handsign::config::{self, Settings};
use handsign::dataset::GestureLibrary;
use handsign::landmarks::LandmarkFrame;
use handsign::logging;
use handsign::recognizer::{RecognitionOutcome, spawn_recognizer};
use handsign::stabilizer::StabilizerEvent;

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config_path: Option<PathBuf>,
    library: Option<PathBuf>,
    input: Option<PathBuf>,
    k: Option<usize>,
    threshold: Option<f32>,
    latest_only: bool,
    events_only: bool,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut settings = load_settings(options.config_path.as_ref())?;
    if let Some(k) = options.k {
        settings.recognition.k = k;
    }
    if let Some(threshold) = options.threshold {
        settings.recognition.confidence_threshold = threshold;
    }
    let settings = settings.normalized();

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
        eprintln!("Model not loaded, recognizing against an empty reference set: {err}");
    }
    let classifier = loaded
        .classifier
        .with_soft_limit(settings.recognition.reference_soft_limit);
    let (mut handle, outcomes) =
        spawn_recognizer(classifier, &settings.recognition).map_err(|err| err.to_string())?;

    let reader: Box<dyn BufRead> = match &options.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).map_err(|err| format!("Failed to open {}: {err}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut submitted = 0u64;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| format!("Failed to read input: {err}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: LandmarkFrame = serde_json::from_str(&line)
            .map_err(|err| format!("Invalid frame on line {}: {err}", line_no + 1))?;
        let seq = submitted;
        submitted += 1;
        handle.submit_frame(seq, frame);
        if options.latest_only {
            for outcome in outcomes.try_iter() {
                print_outcome(&mut out, &outcome, options.events_only)?;
            }
        } else {
            wait_for(&outcomes, seq, &mut out, options.events_only)?;
        }
    }

    handle.shutdown();
    for outcome in outcomes.try_iter() {
        print_outcome(&mut out, &outcome, options.events_only)?;
    }
    Ok(())
}

fn wait_for(
    outcomes: &Receiver<RecognitionOutcome>,
    seq: u64,
    out: &mut impl Write,
    events_only: bool,
) -> Result<(), String> {
    loop {
        let outcome = outcomes
            .recv()
            .map_err(|_| "Recognition worker stopped unexpectedly".to_string())?;
        let done = outcome.seq() >= seq;
        print_outcome(out, &outcome, events_only)?;
        if done {
            return Ok(());
        }
    }
}

fn print_outcome(
    out: &mut impl Write,
    outcome: &RecognitionOutcome,
    events_only: bool,
) -> Result<(), String> {
    if events_only {
        let is_event = matches!(
            outcome,
            RecognitionOutcome::Success {
                event: StabilizerEvent::Confirmed { .. } | StabilizerEvent::PossibleGesture { .. },
                ..
            } | RecognitionOutcome::Error { .. }
        );
        if !is_event {
            return Ok(());
        }
    }
    let json = serde_json::to_string(outcome).map_err(|err| err.to_string())?;
    writeln!(out, "{json}").map_err(|err| err.to_string())
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, String> {
    match path {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--library" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--library requires a value".to_string())?;
                options.library = Some(PathBuf::from(value));
            }
            "--input" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--input requires a value".to_string())?;
                options.input = Some(PathBuf::from(value));
            }
            "--k" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--k requires a value".to_string())?;
                options.k = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --k value: {value}"))?,
                );
            }
            "--threshold" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--threshold requires a value".to_string())?;
                options.threshold = Some(
                    value
                        .parse::<f32>()
                        .map_err(|_| format!("Invalid --threshold value: {value}"))?,
                );
            }
            "--latest-only" => options.latest_only = true,
            "--events-only" => options.events_only = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "handsign",
        "",
        "Usage:",
        "  handsign [options] < frames.jsonl",
        "",
        "Options:",
        "  --input <file>       Read frames from a file instead of stdin.",
        "  --library <dir>      Gesture library root (default: from config).",
        "  --config <file>      Settings file (default: config.toml in the app dir).",
        "  --k <n>              Neighbors per prediction (default: 3).",
        "  --threshold <0..1>   Confidence needed to confirm a gesture (default: 0.85).",
        "  --latest-only        Drop frames that arrive while the worker is busy.",
        "  --events-only        Print only possible/confirmed gestures and errors.",
    ]
    .join("\n")
}

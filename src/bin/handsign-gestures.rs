//! List, delete and seed recorded gestures.

use std::path::PathBuf;
use std::time::SystemTime;

use handsign::config::{self, Settings};
use handsign::dataset::{DatasetError, GestureLibrary};
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

#[derive(Debug, Clone)]
enum Command {
    List,
    Last,
    Delete(String),
    Seed(PathBuf),
    Rebuild,
}

#[derive(Debug, Clone)]
struct CliOptions {
    command: Command,
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
    let layout = settings.layout.feature_layout();

    match options.command {
        Command::List => {
            let gestures = library.list_gestures().map_err(|err| err.to_string())?;
            if gestures.is_empty() {
                println!("No gestures recorded in {}", library.root().display());
            }
            for gesture in gestures {
                let frames = gesture
                    .frame_count()
                    .map(|count| count.to_string())
                    .unwrap_or_else(|| "unreadable".to_string());
                println!(
                    "{:<24} frames={:<10} modified={}",
                    gesture.label,
                    frames,
                    age_label(gesture.modified)
                );
            }
        }
        Command::Last => match library.last_recorded_gesture().map_err(|err| err.to_string())? {
            Some(label) => println!("{label}"),
            None => println!("No gestures recorded"),
        },
        Command::Delete(label) => match library.delete_gesture(&label, layout) {
            Ok(classifier) => println!(
                "Deleted '{label}'; model rebuilt with {} samples across {} gestures",
                classifier.len(),
                classifier.labels().len()
            ),
            Err(DatasetError::NoSamples { .. }) => {
                println!("Deleted '{label}'; no gestures remain, model removed")
            }
            Err(err) => return Err(err.to_string()),
        },
        Command::Seed(source) => {
            let report = library.seed_from(&source).map_err(|err| err.to_string())?;
            if !report.copied_anything() {
                println!("Library already populated; nothing seeded");
                return Ok(());
            }
            println!(
                "Seeded {} sample files{}",
                report.sample_files_copied,
                if report.model_copied { " and the model" } else { "" }
            );
            if !library.has_model() {
                rebuild(&library, layout)?;
            }
        }
        Command::Rebuild => rebuild(&library, layout)?,
    }
    Ok(())
}

fn rebuild(library: &GestureLibrary, layout: handsign::features::FeatureLayout) -> Result<(), String> {
    let classifier = library
        .rebuild_classifier(layout, None)
        .map_err(|err| err.to_string())?;
    if classifier.is_empty() {
        return Err("No readable sample files to build a model from".to_string());
    }
    classifier
        .save(&library.model_path())
        .map_err(|err| err.to_string())?;
    println!(
        "Model rebuilt with {} samples across {} gestures",
        classifier.len(),
        classifier.labels().len()
    );
    Ok(())
}

fn age_label(modified: Option<SystemTime>) -> String {
    let Some(modified) = modified else {
        return "unknown".to_string();
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) if age.as_secs() < 60 => format!("{}s ago", age.as_secs()),
        Ok(age) if age.as_secs() < 3_600 => format!("{}m ago", age.as_secs() / 60),
        Ok(age) if age.as_secs() < 86_400 => format!("{}h ago", age.as_secs() / 3_600),
        Ok(age) => format!("{}d ago", age.as_secs() / 86_400),
        Err(_) => "just now".to_string(),
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, String> {
    match path {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut command: Option<Command> = None;
    let mut library: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
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
            "list" => command = Some(Command::List),
            "last" => command = Some(Command::Last),
            "rebuild" => command = Some(Command::Rebuild),
            "delete" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "delete requires a label".to_string())?;
                command = Some(Command::Delete(value.clone()));
            }
            "seed" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "seed requires a directory".to_string())?;
                command = Some(Command::Seed(PathBuf::from(value)));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions {
        command: command.unwrap_or(Command::List),
        library,
        config_path,
    })
}

fn help_text() -> String {
    [
        "handsign-gestures",
        "",
        "Usage:",
        "  handsign-gestures [list|last|rebuild] [options]",
        "  handsign-gestures delete <label> [options]",
        "  handsign-gestures seed <bundled-library-dir> [options]",
        "",
        "Options:",
        "  --library <dir>    Gesture library root (default: from config).",
        "  --config <file>    Settings file (default: config.toml in the app dir).",
    ]
    .join("\n")
}

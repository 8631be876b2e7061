//! Evaluate the trained model against a shuffled share of the recorded frames.

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;

use handsign::config::{self, Settings};
use handsign::dataset::GestureLibrary;
use handsign::logging;
use handsign::ml::evaluate_holdout;

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
    library: Option<PathBuf>,
    config_path: Option<PathBuf>,
    k: Option<usize>,
    fraction: Option<f32>,
    seed: Option<u64>,
    json: bool,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let settings = load_settings(options.config_path.as_ref())?;
    let k = options.k.unwrap_or(settings.recognition.evaluation_k).max(1);
    let fraction = options
        .fraction
        .unwrap_or(settings.evaluation.holdout_fraction)
        .clamp(0.0, 1.0);
    let root = match &options.library {
        Some(path) => path.clone(),
        None => settings
            .storage
            .library_root()
            .map_err(|err| err.to_string())?,
    };
    let library = GestureLibrary::open(root).map_err(|err| err.to_string())?;
    let loaded = library.load_classifier(settings.layout.feature_layout());
    if let Some(err) = loaded.error {
        return Err(format!("Model could not be loaded: {err}"));
    }
    if loaded.classifier.is_empty() {
        return Err(format!(
            "No trained model in {}",
            library.root().display()
        ));
    }

    let mut rng = match options.seed.or(settings.evaluation.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let report = evaluate_holdout(&loaded.classifier, &library, k, fraction, &mut rng)
        .map_err(|err| err.to_string())?;

    if options.json {
        let json = serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "samples: {}  k: {}  holdout: {:.2}",
        report.test_samples, report.k, report.holdout_fraction
    );
    println!("accuracy: {:.4}", report.accuracy);
    for (idx, stats) in report.per_class.iter().enumerate() {
        println!(
            "class {:>2} {:<16}  precision={:.3}  recall={:.3}  f1={:.3}  support={}",
            idx, stats.label, stats.precision, stats.recall, stats.f1, stats.support
        );
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
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--library" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--library requires a value".to_string())?;
                options.library = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config_path = Some(PathBuf::from(value));
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
            "--fraction" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--fraction requires a value".to_string())?;
                options.fraction = Some(
                    value
                        .parse::<f32>()
                        .map_err(|_| format!("Invalid --fraction value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--json" => options.json = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "handsign-model-eval",
        "",
        "Usage:",
        "  handsign-model-eval [options]",
        "",
        "Options:",
        "  --k <n>             Neighbors per prediction (default: recognition.evaluation_k).",
        "  --fraction <0..1>   Share of each gesture used as test samples (default: 0.3).",
        "  --seed <n>          Shuffle seed (default: evaluation.seed or random).",
        "  --json              Print the report as JSON.",
        "  --library <dir>     Gesture library root (default: from config).",
        "  --config <file>     Settings file (default: config.toml in the app dir).",
    ]
    .join("\n")
}

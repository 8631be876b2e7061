//! Recognizer settings persisted as `config.toml` in the application root.
//!
//! Every value the recognition core depends on (thresholds, k, frame targets,
//! landmark layout) is injected from here so tests can run on small synthetic
//! layouts.

mod defaults;
mod errors;
mod io;
mod types;

pub use errors::ConfigError;
pub use io::{CONFIG_FILE_NAME, config_path, load_from, load_or_default, save, save_to_path};
pub use types::{
    EvaluationSettings, LayoutSettings, RecognitionSettings, Settings, StorageSettings,
    TrainingSettings,
};

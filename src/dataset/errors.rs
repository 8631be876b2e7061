use std::path::PathBuf;

use thiserror::Error;

use crate::error::ErrorKind;
use crate::labels::LabelError;
use crate::model_file::ModelFileError;

/// Errors raised while reading, rebuilding, seeding or exporting a gesture library.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to list directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid sample file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode samples for {label}: {source}")]
    Encode {
        label: String,
        source: serde_json::Error,
    },
    #[error("Failed to write archive {path}: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },
    #[error("Failed to format export timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error("Unknown gesture {0:?}")]
    UnknownGesture(String),
    #[error("No gesture samples remain in {path}")]
    NoSamples { path: PathBuf },
    #[error("No trained model at {path}")]
    MissingModel { path: PathBuf },
    #[error("Nothing to seed from {path}")]
    NothingToSeed { path: PathBuf },
    #[error(transparent)]
    Model(#[from] ModelFileError),
}

impl DatasetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CreateDir { .. }
            | Self::ReadDir { .. }
            | Self::Read { .. }
            | Self::Write { .. }
            | Self::Remove { .. }
            | Self::Copy { .. }
            | Self::Zip { .. } => ErrorKind::Io,
            Self::Parse { .. } | Self::Encode { .. } | Self::Timestamp(_) => ErrorKind::Format,
            Self::Label(err) => err.kind(),
            Self::UnknownGesture(_) => ErrorKind::Validation,
            Self::NoSamples { .. } | Self::MissingModel { .. } | Self::NothingToSeed { .. } => {
                ErrorKind::EmptyDataset
            }
            Self::Model(err) => err.kind(),
        }
    }
}

//! Binary reference-set model file.
//!
//! Layout, all integers and floats big-endian:
//!
//! ```text
//! i32 sample_count
//! i32 landmark_count
//! i32 coords_per_landmark
//! sample_count x {
//!     f32[landmark_count * coords_per_landmark]  features in extraction order
//!     i32 label_len
//!     u8[label_len]                               UTF-8 label, no terminator
//! }
//! ```
//!
//! `landmark_count` and `coords_per_landmark` act as the format version: a file
//! whose header does not match the expected layout is rejected. Saves go through a
//! temporary file in the same directory and are renamed into place, so an
//! interrupted save never leaves a truncated model behind.

use std::fs::File;
use std::io::{BufReader, ErrorKind as IoErrorKind, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::ErrorKind;
use crate::features::FeatureLayout;
use crate::fs_ops;
use crate::ml::TrainingSample;

/// File name of the model inside a gesture library.
pub const MODEL_FILE_NAME: &str = "gesture_model.ml";

const MAX_PREALLOCATED_SAMPLES: usize = 4_096;

/// Errors raised while reading or writing a model file.
#[derive(Debug, Error)]
pub enum ModelFileError {
    #[error("Failed to read model file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model file {path}: {reason}")]
    Format { path: PathBuf, reason: String },
    #[error("Refusing to write a model without samples to {path}")]
    Empty { path: PathBuf },
}

impl ModelFileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Read { .. } | Self::Write { .. } => ErrorKind::Io,
            Self::Format { .. } => ErrorKind::Format,
            Self::Empty { .. } => ErrorKind::EmptyDataset,
        }
    }
}

enum DecodeError {
    Io(std::io::Error),
    Format(String),
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == IoErrorKind::UnexpectedEof {
            Self::Format("file is truncated".to_string())
        } else {
            Self::Io(err)
        }
    }
}

/// Replace the model file at `path` with `samples`.
///
/// An empty sample set is rejected because the reader refuses files with zero
/// samples.
pub fn save(
    path: &Path,
    layout: FeatureLayout,
    samples: &[TrainingSample],
) -> Result<(), ModelFileError> {
    if samples.is_empty() {
        return Err(ModelFileError::Empty {
            path: path.to_path_buf(),
        });
    }
    let bytes = encode(layout, samples).map_err(|reason| ModelFileError::Format {
        path: path.to_path_buf(),
        reason,
    })?;
    fs_ops::write_atomic(path, &bytes).map_err(|source| ModelFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Read every sample from the model file at `path`, validating it against `layout`.
pub fn load(path: &Path, layout: FeatureLayout) -> Result<Vec<TrainingSample>, ModelFileError> {
    let file = File::open(path).map_err(|source| ModelFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&mut BufReader::new(file), layout).map_err(|err| match err {
        DecodeError::Io(source) => ModelFileError::Read {
            path: path.to_path_buf(),
            source,
        },
        DecodeError::Format(reason) => ModelFileError::Format {
            path: path.to_path_buf(),
            reason,
        },
    })
}

/// Serialize samples into the model file layout.
pub fn encode(layout: FeatureLayout, samples: &[TrainingSample]) -> Result<Vec<u8>, String> {
    let feature_len = layout.feature_len();
    let mut out = Vec::with_capacity(12 + samples.len() * (feature_len * 4 + 16));
    out.extend_from_slice(&to_i32(samples.len(), "sample count")?.to_be_bytes());
    out.extend_from_slice(&to_i32(layout.landmark_count, "landmark count")?.to_be_bytes());
    out.extend_from_slice(&to_i32(layout.coords_per_landmark, "coordinate count")?.to_be_bytes());
    for (index, sample) in samples.iter().enumerate() {
        if sample.features.len() != feature_len {
            return Err(format!(
                "sample {index} has {} features (expected {feature_len})",
                sample.features.len()
            ));
        }
        if sample.label.trim().is_empty() {
            return Err(format!("sample {index} has a blank label"));
        }
        for value in &sample.features {
            out.extend_from_slice(&value.to_be_bytes());
        }
        let label = sample.label.as_bytes();
        out.extend_from_slice(&to_i32(label.len(), "label length")?.to_be_bytes());
        out.extend_from_slice(label);
    }
    Ok(out)
}

fn decode(reader: &mut impl Read, layout: FeatureLayout) -> Result<Vec<TrainingSample>, DecodeError> {
    let sample_count = read_i32(reader)?;
    let landmark_count = read_i32(reader)?;
    let coords_per_landmark = read_i32(reader)?;
    let header_matches = usize::try_from(landmark_count).ok() == Some(layout.landmark_count)
        && usize::try_from(coords_per_landmark).ok() == Some(layout.coords_per_landmark);
    if sample_count <= 0 || !header_matches {
        return Err(DecodeError::Format(format!(
            "unsupported header: samples={sample_count}, landmarks={landmark_count}, coords={coords_per_landmark} (expected landmarks={}, coords={})",
            layout.landmark_count, layout.coords_per_landmark
        )));
    }

    let sample_count = sample_count as usize;
    let feature_len = layout.feature_len();
    let mut samples = Vec::with_capacity(sample_count.min(MAX_PREALLOCATED_SAMPLES));
    for index in 0..sample_count {
        let mut features = Vec::with_capacity(feature_len);
        for _ in 0..feature_len {
            features.push(read_f32(reader)?);
        }
        let label_len = read_i32(reader)?;
        if label_len <= 0 {
            return Err(DecodeError::Format(format!(
                "sample {index} has invalid label length {label_len}"
            )));
        }
        let mut label_bytes = Vec::new();
        reader
            .take(label_len as u64)
            .read_to_end(&mut label_bytes)?;
        if label_bytes.len() != label_len as usize {
            return Err(DecodeError::Format("file is truncated".to_string()));
        }
        let label = String::from_utf8(label_bytes).map_err(|_| {
            DecodeError::Format(format!("sample {index} label is not valid UTF-8"))
        })?;
        if label.trim().is_empty() {
            return Err(DecodeError::Format(format!("sample {index} has a blank label")));
        }
        samples.push(TrainingSample::new(features, label));
    }
    Ok(samples)
}

fn to_i32(value: usize, what: &str) -> Result<i32, String> {
    i32::try_from(value).map_err(|_| format!("{what} {value} does not fit the file format"))
}

fn read_i32(reader: &mut impl Read) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_f32(reader: &mut impl Read) -> std::io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_be_bytes(buf))
}

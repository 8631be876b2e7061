//! Gesture label validation.
//!
//! Labels name gesture classes and also name the per-gesture sample file
//! (`<label>.json`), so they must be non-blank and usable as a file stem.

use thiserror::Error;

use crate::error::ErrorKind;

/// Rejected gesture label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("Gesture label must not be blank")]
    Blank,
    #[error("Gesture label {0:?} cannot be used as a file name")]
    InvalidFileName(String),
}

impl LabelError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Check that `label` is non-blank and safe to use as a sample file stem.
pub fn validate_label(label: &str) -> Result<&str, LabelError> {
    if label.trim().is_empty() {
        return Err(LabelError::Blank);
    }
    let reserved = label == "." || label == "..";
    if reserved || label.chars().any(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(LabelError::InvalidFileName(label.to_string()));
    }
    Ok(label)
}

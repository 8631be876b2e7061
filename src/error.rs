//! Coarse error taxonomy reported to callers of the recognition core.
//!
//! Every module keeps its own `thiserror` enum with full context; `ErrorKind` is the
//! thread-agnostic summary carried in recognition outcomes and used by UIs to pick a
//! message.

use serde::{Deserialize, Serialize};

/// High-level category of a recognition-core failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Persisted data failed header or record validation.
    Format,
    /// Underlying read or write failure.
    Io,
    /// An operation needed samples and found none.
    EmptyDataset,
    /// A label or other caller input was rejected.
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Io => "io",
            Self::EmptyDataset => "empty_dataset",
            Self::Validation => "validation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

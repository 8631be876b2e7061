//! First-run seeding from a bundled gesture library.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::library::{GESTURE_DATA_DIR, GestureLibrary, SAMPLE_FILE_EXTENSION};
use super::DatasetError;
use crate::fs_ops;
use crate::model_file::MODEL_FILE_NAME;

/// Files copied by [`GestureLibrary::seed_from`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub model_copied: bool,
    pub sample_files_copied: usize,
}

impl SeedReport {
    pub fn copied_anything(&self) -> bool {
        self.model_copied || self.sample_files_copied > 0
    }
}

impl GestureLibrary {
    /// True when the model file is missing or empty, or no sample files exist.
    pub fn needs_seed(&self) -> Result<bool, DatasetError> {
        Ok(self.model_is_missing_or_empty() || self.sample_files()?.is_empty())
    }

    /// Copy the model and sample files from a bundled library at `source`.
    ///
    /// Existing sample files are never overwritten. A zero-length model file is
    /// replaced. Returns an empty report when the library is already populated and
    /// [`DatasetError::NothingToSeed`] when seeding was needed but nothing could be
    /// copied.
    pub fn seed_from(&self, source: &Path) -> Result<SeedReport, DatasetError> {
        if !self.needs_seed()? {
            return Ok(SeedReport::default());
        }
        let mut report = SeedReport::default();

        let source_model = source.join(MODEL_FILE_NAME);
        if self.model_is_missing_or_empty() && source_model.is_file() {
            let dest = self.model_path();
            fs_ops::copy_file_atomic(&source_model, &dest).map_err(|err| DatasetError::Copy {
                from: source_model.clone(),
                to: dest,
                source: err,
            })?;
            report.model_copied = true;
        }

        let source_data = source.join(GESTURE_DATA_DIR);
        let read_dir = match fs::read_dir(&source_data) {
            Ok(read_dir) => Some(read_dir),
            Err(err) => {
                warn!("No bundled gesture data at {}: {err}", source_data.display());
                None
            }
        };
        for entry in read_dir.into_iter().flatten() {
            let entry = entry.map_err(|err| DatasetError::ReadDir {
                path: source_data.clone(),
                source: err,
            })?;
            let path = entry.path();
            let is_sample = path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(SAMPLE_FILE_EXTENSION);
            if !is_sample {
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };
            let dest = self.data_dir().join(name);
            if dest.exists() {
                continue;
            }
            fs_ops::copy_file_atomic(&path, &dest).map_err(|err| DatasetError::Copy {
                from: path.clone(),
                to: dest.clone(),
                source: err,
            })?;
            report.sample_files_copied += 1;
        }

        if !report.copied_anything() {
            return Err(DatasetError::NothingToSeed {
                path: source.to_path_buf(),
            });
        }
        info!(
            "Seeded library from {} (model: {}, sample files: {})",
            source.display(),
            report.model_copied,
            report.sample_files_copied
        );
        Ok(report)
    }

    fn model_is_missing_or_empty(&self) -> bool {
        fs::metadata(self.model_path())
            .map(|meta| !meta.is_file() || meta.len() == 0)
            .unwrap_or(true)
    }
}

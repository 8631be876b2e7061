use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{info, warn};

use super::DatasetError;
use super::sample_file::{read_sample_file, write_sample_file};
use crate::features::FeatureLayout;
use crate::labels::validate_label;
use crate::landmarks::LandmarkFrame;
use crate::ml::KnnClassifier;
use crate::model_file::{MODEL_FILE_NAME, ModelFileError};

/// Directory holding one sample file per gesture.
pub const GESTURE_DATA_DIR: &str = "gesture_data";
/// Extension of per-gesture sample files.
pub const SAMPLE_FILE_EXTENSION: &str = "json";

/// Gesture library rooted at one directory: `gesture_model.ml` plus `gesture_data/`.
#[derive(Debug, Clone)]
pub struct GestureLibrary {
    root: PathBuf,
}

/// One recorded gesture on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEntry {
    pub label: String,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

impl GestureEntry {
    /// Frames in the sample file; `None` when the file could not be parsed.
    ///
    /// Reads the file on every call.
    pub fn frame_count(&self) -> Option<usize> {
        match read_sample_file(&self.path) {
            Ok(frames) => Some(frames.len()),
            Err(err) => {
                warn!("Skipping frame count for {}: {err}", self.path.display());
                None
            }
        }
    }
}

/// Classifier loaded at startup, with the load failure if there was one.
#[derive(Debug)]
pub struct LoadedClassifier {
    pub classifier: KnnClassifier,
    pub error: Option<ModelFileError>,
}

/// Everything an export needs to enumerate.
#[derive(Debug, Clone)]
pub struct LibraryArtifacts {
    pub model: Option<PathBuf>,
    pub gestures: Vec<GestureEntry>,
}

impl GestureLibrary {
    /// Open (and create if needed) the library at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let library = Self { root: root.into() };
        let data_dir = library.data_dir();
        fs::create_dir_all(&data_dir).map_err(|source| DatasetError::CreateDir {
            path: data_dir,
            source,
        })?;
        Ok(library)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(GESTURE_DATA_DIR)
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join(MODEL_FILE_NAME)
    }

    pub fn has_model(&self) -> bool {
        self.model_path().is_file()
    }

    /// Path of the sample file for `label`.
    pub fn sample_path(&self, label: &str) -> Result<PathBuf, DatasetError> {
        let label = validate_label(label)?;
        Ok(self
            .data_dir()
            .join(format!("{label}.{SAMPLE_FILE_EXTENSION}")))
    }

    /// Recorded gestures, most recently modified first.
    ///
    /// Only file metadata is read; sample files are parsed on demand through
    /// [`GestureEntry::frame_count`].
    pub fn list_gestures(&self) -> Result<Vec<GestureEntry>, DatasetError> {
        let mut entries: Vec<GestureEntry> = self
            .sample_files()?
            .into_iter()
            .map(|(label, path)| {
                let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok();
                GestureEntry {
                    label,
                    path,
                    modified,
                }
            })
            .collect();
        entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.label.cmp(&b.label)));
        Ok(entries)
    }

    /// Labels with a sample file, sorted.
    pub fn labels(&self) -> Result<Vec<String>, DatasetError> {
        Ok(self
            .sample_files()?
            .into_iter()
            .map(|(label, _)| label)
            .collect())
    }

    pub fn read_frames(&self, label: &str) -> Result<Vec<LandmarkFrame>, DatasetError> {
        let path = self.sample_path(label)?;
        if !path.is_file() {
            return Err(DatasetError::UnknownGesture(label.to_string()));
        }
        read_sample_file(&path)
    }

    /// Replace the sample file for `label` with `frames`.
    pub fn write_frames(
        &self,
        label: &str,
        frames: &[LandmarkFrame],
    ) -> Result<PathBuf, DatasetError> {
        let path = self.sample_path(label)?;
        write_sample_file(&path, label, frames)?;
        info!("Wrote {} frames for '{label}' to {}", frames.len(), path.display());
        Ok(path)
    }

    /// Label of the most recently modified sample file.
    pub fn last_recorded_gesture(&self) -> Result<Option<String>, DatasetError> {
        Ok(self
            .list_gestures()?
            .into_iter()
            .next()
            .map(|entry| entry.label))
    }

    /// Load the classifier from the model file.
    ///
    /// A missing file yields an empty classifier. Any other failure also yields an
    /// empty classifier and is reported in [`LoadedClassifier::error`].
    pub fn load_classifier(&self, layout: FeatureLayout) -> LoadedClassifier {
        let mut classifier = KnnClassifier::new(layout);
        let path = self.model_path();
        if !path.exists() {
            info!("No model at {}; starting with an empty reference set", path.display());
            return LoadedClassifier {
                classifier,
                error: None,
            };
        }
        let error = match classifier.load(&path) {
            Ok(_) => None,
            Err(err) => {
                warn!("Model load failed, continuing with an empty reference set: {err}");
                Some(err)
            }
        };
        LoadedClassifier { classifier, error }
    }

    /// Build a classifier from every sample file except `exclude`.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn rebuild_classifier(
        &self,
        layout: FeatureLayout,
        exclude: Option<&str>,
    ) -> Result<KnnClassifier, DatasetError> {
        let mut classifier = KnnClassifier::new(layout);
        for (label, path) in self.sample_files()? {
            if exclude == Some(label.as_str()) {
                continue;
            }
            let frames = match read_sample_file(&path) {
                Ok(frames) => frames,
                Err(err) => {
                    warn!("Skipping {} during rebuild: {err}", path.display());
                    continue;
                }
            };
            classifier.add_training_data(&label, &frames)?;
        }
        classifier.train();
        Ok(classifier)
    }

    /// Delete a gesture and rebuild the model from the remaining sample files.
    ///
    /// When no samples remain the model file is removed and
    /// [`DatasetError::NoSamples`] is returned.
    pub fn delete_gesture(
        &self,
        label: &str,
        layout: FeatureLayout,
    ) -> Result<KnnClassifier, DatasetError> {
        let path = self.sample_path(label)?;
        if !path.is_file() {
            return Err(DatasetError::UnknownGesture(label.to_string()));
        }
        fs::remove_file(&path).map_err(|source| DatasetError::Remove {
            path: path.clone(),
            source,
        })?;
        info!("Deleted gesture '{label}'; rebuilding model");

        let classifier = self.rebuild_classifier(layout, Some(label))?;
        if classifier.is_empty() {
            self.remove_model()?;
            return Err(DatasetError::NoSamples {
                path: self.data_dir(),
            });
        }
        classifier.save(&self.model_path())?;
        info!(
            "Rebuilt model with {} samples across {} gestures",
            classifier.len(),
            classifier.labels().len()
        );
        Ok(classifier)
    }

    pub fn artifacts(&self) -> Result<LibraryArtifacts, DatasetError> {
        Ok(LibraryArtifacts {
            model: self.has_model().then(|| self.model_path()),
            gestures: self.list_gestures()?,
        })
    }

    fn remove_model(&self) -> Result<(), DatasetError> {
        let path = self.model_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(DatasetError::Remove { path, source }),
        }
    }

    /// `(label, path)` for every `*.json` file in the data directory, sorted by label.
    pub(crate) fn sample_files(&self) -> Result<Vec<(String, PathBuf)>, DatasetError> {
        let dir = self.data_dir();
        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(DatasetError::ReadDir { path: dir, source }),
        };
        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| DatasetError::ReadDir {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(SAMPLE_FILE_EXTENSION) {
                continue;
            }
            let Some(label) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if validate_label(label).is_err() {
                continue;
            }
            files.push((label.to_string(), path));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}

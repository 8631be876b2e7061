//! Timestamped exports of the model and recorded samples.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::DatasetError;
use super::library::{GESTURE_DATA_DIR, GestureEntry, GestureLibrary};
use super::sample_file::read_sample_file;
use crate::fs_ops;
use crate::model_file::MODEL_FILE_NAME;

const CSV_HEADER: &str = "gesture_name,landmark_index,x,y,z\n";
const README_FILE_NAME: &str = "README.txt";

/// Files written by [`GestureLibrary::export_dataset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetExport {
    pub archive: PathBuf,
    pub csv: PathBuf,
}

/// `YYYYMMDD_HHMMSS` stamp used in export file names.
pub fn export_timestamp(now: OffsetDateTime) -> Result<String, DatasetError> {
    let format = format_description!("[year][month][day]_[hour][minute][second]");
    Ok(now.format(format)?)
}

/// Export stamp for the current local time, falling back to UTC.
pub fn export_timestamp_now() -> Result<String, DatasetError> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    export_timestamp(now)
}

impl GestureLibrary {
    /// Copy the model to `gesture_model_<stamp>.ml` in `out_dir`.
    pub fn export_model(&self, out_dir: &Path, stamp: &str) -> Result<PathBuf, DatasetError> {
        let model = self.require_model()?;
        let dest = out_dir.join(format!("gesture_model_{stamp}.ml"));
        fs_ops::copy_file_atomic(&model, &dest).map_err(|source| DatasetError::Copy {
            from: model,
            to: dest.clone(),
            source,
        })?;
        info!("Exported model to {}", dest.display());
        Ok(dest)
    }

    /// Write `gesture_dataset_<stamp>.zip` and `gesture_dataset_<stamp>.csv` to `out_dir`.
    pub fn export_dataset(&self, out_dir: &Path, stamp: &str) -> Result<DatasetExport, DatasetError> {
        let gestures = self.require_gestures()?;
        ensure_dir(out_dir)?;

        let archive = out_dir.join(format!("gesture_dataset_{stamp}.zip"));
        let mut entries = Vec::with_capacity(gestures.len());
        for gesture in &gestures {
            entries.push((file_name(&gesture.path), read_bytes(&gesture.path)?));
        }
        write_zip(&archive, &entries)?;

        let csv = out_dir.join(format!("gesture_dataset_{stamp}.csv"));
        let text = dataset_csv(&gestures);
        fs_ops::write_atomic(&csv, text.as_bytes()).map_err(|source| DatasetError::Write {
            path: csv.clone(),
            source,
        })?;
        info!(
            "Exported {} gestures to {} and {}",
            gestures.len(),
            archive.display(),
            csv.display()
        );
        Ok(DatasetExport { archive, csv })
    }

    /// Write `gesture_recognition_<stamp>.zip` holding the model, every sample
    /// file under `gesture_data/` and a README.
    pub fn export_all(&self, out_dir: &Path, stamp: &str) -> Result<PathBuf, DatasetError> {
        let model = self.require_model()?;
        let gestures = self.require_gestures()?;
        ensure_dir(out_dir)?;

        let mut entries = Vec::with_capacity(gestures.len() + 2);
        entries.push((MODEL_FILE_NAME.to_string(), read_bytes(&model)?));
        for gesture in &gestures {
            let name = format!("{GESTURE_DATA_DIR}/{}", file_name(&gesture.path));
            entries.push((name, read_bytes(&gesture.path)?));
        }
        entries.push((README_FILE_NAME.to_string(), readme(stamp, &gestures).into_bytes()));

        let archive = out_dir.join(format!("gesture_recognition_{stamp}.zip"));
        write_zip(&archive, &entries)?;
        info!("Exported model and dataset to {}", archive.display());
        Ok(archive)
    }

    fn require_model(&self) -> Result<PathBuf, DatasetError> {
        let path = self.model_path();
        if path.is_file() {
            Ok(path)
        } else {
            Err(DatasetError::MissingModel { path })
        }
    }

    fn require_gestures(&self) -> Result<Vec<GestureEntry>, DatasetError> {
        let mut gestures = self.list_gestures()?;
        if gestures.is_empty() {
            return Err(DatasetError::NoSamples {
                path: self.data_dir(),
            });
        }
        gestures.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(gestures)
    }
}

fn dataset_csv(gestures: &[GestureEntry]) -> String {
    let mut out = String::from(CSV_HEADER);
    for gesture in gestures {
        let frames = match read_sample_file(&gesture.path) {
            Ok(frames) => frames,
            Err(err) => {
                warn!("Leaving {} out of the CSV export: {err}", gesture.path.display());
                continue;
            }
        };
        let name = csv_field(&gesture.label);
        for frame in &frames {
            for (index, [x, y, z]) in frame.landmarks().iter().enumerate() {
                out.push_str(&format!("{name},{index},{x},{y},{z}\n"));
            }
        }
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn readme(stamp: &str, gestures: &[GestureEntry]) -> String {
    let labels: Vec<&str> = gestures.iter().map(|g| g.label.as_str()).collect();
    format!(
        "Hand gesture recognition export\n\
         \n\
         Contents:\n\
         1. {MODEL_FILE_NAME}: trained reference set, ready to load.\n\
         2. {GESTURE_DATA_DIR}/: one JSON sample file per recorded gesture.\n\
         \n\
         To reuse this model, copy {MODEL_FILE_NAME} and {GESTURE_DATA_DIR}/ into a gesture library directory.\n\
         \n\
         Gestures: {}\n\
         Exported: {stamp}\n",
        labels.join(", ")
    )
}

fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) -> Result<(), DatasetError> {
    let zip_err = |source: zip::result::ZipError| DatasetError::Zip {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(|source| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(temp);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in entries {
        zip.start_file(name.as_str(), options).map_err(zip_err)?;
        zip.write_all(data).map_err(|source| DatasetError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let temp = zip.finish().map_err(zip_err)?;
    temp.persist(path).map_err(|err| DatasetError::Write {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), DatasetError> {
    fs::create_dir_all(dir).map_err(|source| DatasetError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, DatasetError> {
    fs::read(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::features::FeatureLayout;
    use crate::landmarks::LandmarkFrame;
    use std::io::Read;
    use tempfile::tempdir;
    use time::macros::datetime;

    fn library_with_model(root: &Path) -> GestureLibrary {
        let library = GestureLibrary::open(root).unwrap();
        library
            .write_frames("hola", &[LandmarkFrame::new(vec![[0.5, 0.25, 1.0], [0.0, 1.0, 0.0]])])
            .unwrap();
        library
            .write_frames("chau", &[LandmarkFrame::new(vec![[0.1, 0.2, 0.3]; 21])])
            .unwrap();
        library
            .rebuild_classifier(FeatureLayout::default(), None)
            .unwrap()
            .save(&library.model_path())
            .unwrap();
        library
    }

    fn zip_names(path: &Path) -> Vec<String> {
        let file = fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn timestamp_is_compact() {
        let stamp = export_timestamp(datetime!(2024-03-05 07:08:09 UTC)).unwrap();
        assert_eq!(stamp, "20240305_070809");
    }

    #[test]
    fn export_model_copies_bytes() {
        let dir = tempdir().unwrap();
        let library = library_with_model(&dir.path().join("lib"));
        let out = library.export_model(&dir.path().join("out"), "20240101_000000").unwrap();
        assert!(out.ends_with("gesture_model_20240101_000000.ml"));
        assert_eq!(fs::read(out).unwrap(), fs::read(library.model_path()).unwrap());
    }

    #[test]
    fn export_dataset_writes_zip_and_csv() {
        let dir = tempdir().unwrap();
        let library = library_with_model(&dir.path().join("lib"));
        let export = library.export_dataset(&dir.path().join("out"), "stamp").unwrap();
        assert_eq!(zip_names(&export.archive), vec!["chau.json", "hola.json"]);

        let csv = fs::read_to_string(&export.csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("gesture_name,landmark_index,x,y,z"));
        assert_eq!(csv.lines().filter(|l| l.starts_with("chau,")).count(), 21);
        assert!(csv.contains("hola,0,0.5,0.25,1\n"));
        assert!(csv.contains("hola,1,0,1,0\n"));
    }

    #[test]
    fn export_all_bundles_model_samples_and_readme() {
        let dir = tempdir().unwrap();
        let library = library_with_model(&dir.path().join("lib"));
        let archive = library.export_all(&dir.path().join("out"), "stamp").unwrap();
        assert!(archive.ends_with("gesture_recognition_stamp.zip"));
        assert_eq!(
            zip_names(&archive),
            vec![
                "gesture_model.ml",
                "gesture_data/chau.json",
                "gesture_data/hola.json",
                "README.txt"
            ]
        );
        let file = fs::File::open(&archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let mut readme = String::new();
        zip.by_name("README.txt").unwrap().read_to_string(&mut readme).unwrap();
        assert!(readme.contains("Gestures: chau, hola"));
    }

    #[test]
    fn missing_model_fails_before_writing() {
        let dir = tempdir().unwrap();
        let library = GestureLibrary::open(dir.path().join("lib")).unwrap();
        library
            .write_frames("hola", &[LandmarkFrame::new(vec![[0.0; 3]])])
            .unwrap();
        let out = dir.path().join("out");
        let err = library.export_all(&out, "stamp").unwrap_err();
        assert!(matches!(err, DatasetError::MissingModel { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn empty_dataset_fails_before_writing() {
        let dir = tempdir().unwrap();
        let library = GestureLibrary::open(dir.path().join("lib")).unwrap();
        let out = dir.path().join("out");
        let err = library.export_dataset(&out, "stamp").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyDataset);
        assert!(!out.exists());
    }

    #[test]
    fn csv_fields_with_commas_are_quoted() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }
}

//! Per-gesture sample files (`gesture_data/<label>.json`).
//!
//! Each file holds a JSON array of records:
//! `[{"gesture_name": "hola", "landmarks": [[x, y, z], ...]}, ...]`.
//! `gesture_name` is always written and optional on read.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::DatasetError;
use crate::fs_ops;
use crate::landmarks::LandmarkFrame;

/// One recorded frame as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    #[serde(default)]
    pub gesture_name: Option<String>,
    pub landmarks: LandmarkFrame,
}

/// Read every frame from a sample file.
pub fn read_sample_file(path: &Path) -> Result<Vec<LandmarkFrame>, DatasetError> {
    let bytes = std::fs::read(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_records(&bytes).map_err(|source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(records.into_iter().map(|record| record.landmarks).collect())
}

/// Replace a sample file with `frames` recorded under `label`.
pub fn write_sample_file(
    path: &Path,
    label: &str,
    frames: &[LandmarkFrame],
) -> Result<(), DatasetError> {
    let bytes = encode_records(label, frames).map_err(|source| DatasetError::Encode {
        label: label.to_string(),
        source,
    })?;
    fs_ops::write_atomic(path, &bytes).map_err(|source| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_records(bytes: &[u8]) -> Result<Vec<SampleRecord>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

pub fn encode_records(label: &str, frames: &[LandmarkFrame]) -> Result<Vec<u8>, serde_json::Error> {
    #[derive(Serialize)]
    struct RecordRef<'a> {
        gesture_name: &'a str,
        landmarks: &'a LandmarkFrame,
    }
    let records: Vec<RecordRef<'_>> = frames
        .iter()
        .map(|landmarks| RecordRef {
            gesture_name: label,
            landmarks,
        })
        .collect();
    serde_json::to_vec(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn encoded_records_carry_gesture_name() {
        let frames = vec![LandmarkFrame::new(vec![[0.5, 0.25, 0.0]])];
        let bytes = encode_records("hola", &frames).unwrap();
        let json = String::from_utf8(bytes).unwrap();
        assert_eq!(
            json,
            r#"[{"gesture_name":"hola","landmarks":[[0.5,0.25,0.0]]}]"#
        );
    }

    #[test]
    fn gesture_name_is_optional_on_read() {
        let records = parse_records(br#"[{"landmarks":[[1.0,2.0,3.0]]}]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gesture_name, None);
        assert_eq!(records[0].landmarks.landmarks(), &[[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn landmarks_with_extra_coordinates_still_parse() {
        let records = parse_records(
            br#"[{"gesture_name":"hola","landmarks":[[0.1,0.2,0.3,0.9],[0.4,0.5,0.6,1.0]]}]"#,
        )
        .unwrap();
        assert_eq!(
            records[0].landmarks.landmarks(),
            &[[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
        );
    }

    #[test]
    fn write_then_read_keeps_frame_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gracias.json");
        let frames = vec![
            LandmarkFrame::new(vec![[0.1, 0.2, 0.3]; 21]),
            LandmarkFrame::new(vec![[0.4, 0.5, 0.6]; 21]),
        ];
        write_sample_file(&path, "gracias", &frames).unwrap();
        assert_eq!(read_sample_file(&path).unwrap(), frames);
    }

    #[test]
    fn malformed_file_is_a_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = read_sample_file(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }
}

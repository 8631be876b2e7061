//! Gesture library on disk.
//!
//! A library directory holds the binary model (`gesture_model.ml`) and one JSON
//! sample file per recorded gesture under `gesture_data/`. The model can always be
//! rebuilt from the sample files.

mod errors;
mod export;
mod library;
mod sample_file;
mod seed;

pub use errors::DatasetError;
pub use export::{DatasetExport, export_timestamp, export_timestamp_now};
pub use library::{
    GESTURE_DATA_DIR, GestureEntry, GestureLibrary, LibraryArtifacts, LoadedClassifier,
    SAMPLE_FILE_EXTENSION,
};
pub use sample_file::{
    SampleRecord, encode_records, parse_records, read_sample_file, write_sample_file,
};
pub use seed::SeedReport;

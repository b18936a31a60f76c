mod atomic_io;
mod hashing;
mod manifest;
mod recorder;

use std::path::PathBuf;

use thiserror::Error;

pub use hashing::{hash_scene_list, to_hex_lower};
pub use manifest::{RunManifest, MANIFEST_FILE_NAME, RUN_MANIFEST_FORMAT_VERSION};
pub use recorder::{StatusRecorder, STATUS_FILE_NAME};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

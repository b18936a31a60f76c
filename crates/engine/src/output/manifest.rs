use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::atomic_io::write_json_atomic;
use super::hashing::hash_scene_list;
use super::OutputError;
use crate::content::SceneDescriptor;

pub const RUN_MANIFEST_FORMAT_VERSION: u16 = 1;
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Describes a whole director session so its output can be matched to its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub format_version: u16,
    pub scene_count: usize,
    pub run_count: u32,
    pub ticks_per_run: u32,
    pub seed: u64,
    pub scene_list_sha256_hex: String,
}

impl RunManifest {
    pub fn new(descriptors: &[SceneDescriptor], run_count: u32, ticks_per_run: u32, seed: u64) -> Self {
        Self {
            format_version: RUN_MANIFEST_FORMAT_VERSION,
            scene_count: descriptors.len(),
            run_count,
            ticks_per_run,
            seed,
            scene_list_sha256_hex: hash_scene_list(descriptors),
        }
    }

    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, OutputError> {
        let path = output_dir.join(MANIFEST_FILE_NAME);
        write_json_atomic(&path, self)?;
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self, OutputError> {
        let raw = fs::read_to_string(path).map_err(|source| OutputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| OutputError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

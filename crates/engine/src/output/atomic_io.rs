use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::OutputError;

/// Pretty-prints `value` and swaps it into place so readers never see a partial file.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| OutputError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    write_text_atomic(path, &text).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path_for(path);
    fs::write(&staging, text.as_bytes())?;
    swap_into_place(&staging, path)
}

fn swap_into_place(staging: &Path, destination: &Path) -> io::Result<()> {
    match fs::remove_file(destination) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(staging);
            return Err(error);
        }
    }

    fs::rename(staging, destination).inspect_err(|_| {
        let _ = fs::remove_file(staging);
    })
}

fn staging_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("output");
    path.with_file_name(format!("{file_name}.tmp"))
}

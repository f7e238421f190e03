//! Mock data directory loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::buffer::MessageBuffer;
use crate::decode::decode_payload;
use crate::error::{IngestError, IngestResult};

/// `*.json` files of a directory, sorted by file name.
///
/// # Errors
///
/// Returns [`IngestError::Io`] when the directory cannot be listed.
pub fn mock_files(dir: &Path) -> IngestResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|err| IngestError::io("mock.read_dir", dir, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| IngestError::io("mock.read_dir", dir, err))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every mock file of `dir` into the buffer.
///
/// Does nothing when the buffer already holds data. Either every file loads
/// or the buffer is left untouched. Returns the number of messages added.
///
/// # Errors
///
/// Returns the first I/O or decode failure.
pub fn load_mock_dir(dir: &Path, buffer: &MessageBuffer) -> IngestResult<usize> {
    if !buffer.is_empty() {
        info!(buffered = buffer.len(), "mock data already loaded");
        return Ok(0);
    }
    let mut messages = Vec::new();
    for path in mock_files(dir)? {
        let bytes = fs::read(&path).map_err(|err| IngestError::io("mock.read_file", &path, err))?;
        let decoded = decode_payload(&bytes)
            .map_err(|err| IngestError::decode("mock.decode", Some(path.clone()), err))?;
        messages.extend(decoded);
    }
    let count = messages.len();
    buffer.extend(messages);
    info!(dir = %dir.display(), count, "loaded mock CFX data");
    Ok(count)
}

/// [`load_mock_dir`] for startup: failures are logged and leave the buffer empty.
pub fn load_mock_dir_or_log(dir: &Path, buffer: &MessageBuffer) -> usize {
    load_mock_dir(dir, buffer).unwrap_or_else(|err| {
        error!(dir = %dir.display(), error = %err, "failed to load mock CFX data");
        0
    })
}

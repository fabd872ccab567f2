use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use coder_core::{KeyValueStore, StorageError, StorageKey};
use coder_logging::coder_debug;

use crate::persist::{AtomicFileWriter, PersistError};

const ENTRY_EXTENSION: &str = "json";

/// Key-value storage keeping one `<key>.json` file per entry in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    writer: AtomicFileWriter,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Backend(format!("invalid storage key {key:?}")));
        }
        Ok(self.dir().join(format!("{key}.{ENTRY_EXTENSION}")))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.entry_path(key)?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StorageError::Backend(format!("invalid storage key {key:?}")))?;
        self.writer
            .write(filename, value.as_bytes())
            .map_err(|err| match err {
                PersistError::Io(io) => StorageError::Io(io),
                other => StorageError::Backend(other.to_string()),
            })?;
        coder_debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.entry_path(key)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes the entries of the state slices only; other files in the
    /// directory, `.json` or not, are left alone.
    fn clear(&self) -> Result<(), StorageError> {
        for key in StorageKey::ALL {
            self.remove(key.as_str())?;
        }
        Ok(())
    }
}

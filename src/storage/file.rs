//! JSON-file token storage, the on-disk counterpart of browser local storage.
//! Entries never expire on their own; the server rejecting a token is the only
//! expiry signal. The file is rewritten atomically and, on Unix, restricted to
//! the owner.

use super::{StorageError, TokenKey, TokenOptions, TokenStore};
use secrecy::SecretString;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::debug;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries: BTreeMap<String, String> = load_document(&self.path)?;
        apply(&mut entries);
        persist_document(&self.path, &entries)
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: TokenKey) -> Result<Option<SecretString>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let entries: BTreeMap<String, String> = load_document(&self.path)?;
        Ok(entries
            .get(key.as_str())
            .map(|value| SecretString::from(value.clone())))
    }

    fn set(&self, key: TokenKey, value: &str, _options: &TokenOptions) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: TokenKey) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.update(|entries| {
            for key in TokenKey::ALL {
                entries.remove(key.as_str());
            }
        })
    }
}

/// Loads a JSON document, returning the default value when the file is missing.
pub(crate) fn load_document<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    match fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(err) => Err(err.into()),
    }
}

/// Writes a JSON document through a sibling temporary file and a rename.
pub(crate) fn persist_document<T: Serialize>(path: &Path, document: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    let bytes = serde_json::to_vec_pretty(document)?;
    fs::write(&tmp, bytes)?;
    restrict_permissions(&tmp)?;
    fs::rename(&tmp, path)?;

    debug!(path = %path.display(), "token document persisted");

    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

use super::{StorageError, TokenKey, TokenOptions, TokenStore};
use secrecy::SecretString;
use std::{collections::HashMap, sync::Mutex};

/// Process-local token storage. Values live as long as the store does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: Mutex<HashMap<TokenKey, SecretString>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: TokenKey) -> Result<Option<SecretString>, StorageError> {
        let tokens = self.tokens.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(tokens.get(&key).cloned())
    }

    fn set(&self, key: TokenKey, value: &str, _options: &TokenOptions) -> Result<(), StorageError> {
        let mut tokens = self.tokens.lock().map_err(|_| StorageError::Poisoned)?;
        tokens.insert(key, SecretString::from(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<(), StorageError> {
        let mut tokens = self.tokens.lock().map_err(|_| StorageError::Poisoned)?;
        tokens.remove(&key);
        Ok(())
    }
}

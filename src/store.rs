//! Persistence port for decks and the collection.
//!
//! The scoring pipeline never touches a store. Callers load plain values
//! through [`Library`], run the algorithms, and save the results back.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::collection::Collection;
use crate::deck::{Deck, DeckId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage lock poisoned")]
    Poisoned,
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("storage io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stored value for '{key}' is malformed: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value storage holding JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Returns true if the key existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// HashMap-backed store for tests and one-shot runs. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    storage: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let storage = self.storage.read().map_err(|_| StoreError::Poisoned)?;
        Ok(storage.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut storage = self.storage.write().map_err(|_| StoreError::Poisoned)?;
        storage.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut storage = self.storage.write().map_err(|_| StoreError::Poisoned)?;
        Ok(storage.remove(key).is_some())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        // Write then rename so a crash never leaves a truncated document.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

const DECKS_KEY: &str = "decks";
const COLLECTION_KEY: &str = "collection";

/// Typed access to the saved decks and collection.
#[derive(Debug, Clone)]
pub struct Library<S> {
    store: S,
}

impl<S: KeyValueStore> Library<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn decks(&self) -> Result<Vec<Deck>, StoreError> {
        self.read_json(DECKS_KEY)
    }

    pub fn deck(&self, id: &DeckId) -> Result<Option<Deck>, StoreError> {
        Ok(self.decks()?.into_iter().find(|deck| &deck.id == id))
    }

    /// Inserts the deck, or replaces the saved deck with the same id.
    pub fn save_deck(&self, deck: &Deck) -> Result<(), StoreError> {
        let mut decks = self.decks()?;
        match decks.iter_mut().find(|saved| saved.id == deck.id) {
            Some(saved) => *saved = deck.clone(),
            None => decks.push(deck.clone()),
        }
        self.write_json(DECKS_KEY, &decks)?;
        log::debug!("saved deck {} ({} decks stored)", deck.id, decks.len());
        Ok(())
    }

    /// Returns false when no deck had this id.
    pub fn delete_deck(&self, id: &DeckId) -> Result<bool, StoreError> {
        let mut decks = self.decks()?;
        let before = decks.len();
        decks.retain(|deck| &deck.id != id);
        if decks.len() == before {
            return Ok(false);
        }
        self.write_json(DECKS_KEY, &decks)?;
        Ok(true)
    }

    pub fn collection(&self) -> Result<Collection, StoreError> {
        self.read_json(COLLECTION_KEY)
    }

    pub fn save_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        self.write_json(COLLECTION_KEY, collection)
    }

    /// Missing keys read as the type's default.
    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, StoreError> {
        match self.store.get(key)? {
            Some(text) => serde_json::from_str(&text).map_err(|source| StoreError::Serde {
                key: key.to_string(),
                source,
            }),
            None => Ok(T::default()),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &text)
    }
}

//! Best score persistence
//!
//! A single integer survives between visits. The simulation reads it at
//! boot and on every session start and writes it only when beaten.

use thiserror::Error;

/// Errors from the backing store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("stored best score is not a number: {0}")]
    Parse(String),
    #[error("failed to write best score: {0}")]
    Write(String),
}

/// Where the best score lives
pub trait BestScoreStore: std::fmt::Debug {
    /// Read the persisted best score (0 when none has been written)
    fn load(&self) -> Result<u32, StorageError>;
    /// Persist a new best score
    fn save(&mut self, score: u32) -> Result<(), StorageError>;
}

/// In-process store for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    best: u32,
    writes: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: u32) -> Self {
        Self { best, writes: 0 }
    }

    /// Number of successful saves
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl BestScoreStore for MemoryStore {
    fn load(&self) -> Result<u32, StorageError> {
        Ok(self.best)
    }

    fn save(&mut self, score: u32) -> Result<(), StorageError> {
        self.best = score;
        self.writes += 1;
        Ok(())
    }
}

/// Parse a stored value; a missing key means no best score yet
pub fn parse_stored(raw: Option<&str>) -> Result<u32, StorageError> {
    match raw {
        None => Ok(0),
        Some(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| StorageError::Parse(s.to_string())),
    }
}

/// Browser LocalStorage store
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    const STORAGE_KEY: &'static str = "bestScore";

    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl BestScoreStore for LocalStore {
    fn load(&self) -> Result<u32, StorageError> {
        let storage = Self::storage()?;
        let raw = storage
            .get_item(Self::STORAGE_KEY)
            .map_err(|_| StorageError::Unavailable)?;
        let best = parse_stored(raw.as_deref())?;
        log::info!("Loaded best score {}", best);
        Ok(best)
    }

    fn save(&mut self, score: u32) -> Result<(), StorageError> {
        let storage = Self::storage()?;
        storage
            .set_item(Self::STORAGE_KEY, &score.to_string())
            .map_err(|e| StorageError::Write(format!("{:?}", e)))?;
        log::info!("Best score saved ({})", score);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round() {
        let mut store = MemoryStore::with_best(4);
        assert_eq!(store.load(), Ok(4));
        store.save(9).unwrap();
        assert_eq!(store.load(), Ok(9));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_parse_stored() {
        assert_eq!(parse_stored(None), Ok(0));
        assert_eq!(parse_stored(Some(" 17 ")), Ok(17));
        assert!(matches!(parse_stored(Some("lots")), Err(StorageError::Parse(_))));
    }
}

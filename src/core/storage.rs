//! Durable history and counter slots

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::core::errors::{Result, TranslationError};
use crate::core::models::{History, HistoryEntry};

/// Slot holding the serialized history, newest first
pub const HISTORY_SLOT: &str = "translationHistory.json";

/// Slot holding the lifetime count of successful translations
pub const COUNT_SLOT: &str = "translationCount";

/// Everything read from durable storage at startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub history: History,
    pub translation_count: u64,
}

/// Persistence port used by the session
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Read the stored history and counter
    async fn load(&self) -> Result<PersistedState>;

    /// Replace the stored history
    async fn save_history(&self, history: &History) -> Result<()>;

    /// Bump the lifetime counter and return the new value
    async fn increment_count(&self) -> Result<u64>;
}

/// Key-value store keeping one file per slot in a directory.
///
/// Slots are read once by [`JsonFileStore::open`]; every write replaces the
/// whole slot through a temp file and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    state: Mutex<PersistedState>,
}

impl JsonFileStore {
    /// Open (and create if needed) the store in `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| TranslationError::StorageError {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?;

        let history = read_history(&dir.join(HISTORY_SLOT)).await;
        let translation_count = read_count(&dir.join(COUNT_SLOT)).await;
        info!(
            "Opened store at {} ({} history entries, {} translations)",
            dir.display(),
            history.len(),
            translation_count
        );

        Ok(Self {
            dir,
            state: Mutex::new(PersistedState {
                history,
                translation_count,
            }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write_slot(&self, slot: &str, content: &[u8]) -> Result<()> {
        let path = self.dir.join(slot);
        let tmp = self.dir.join(format!("{}.tmp", slot));
        let storage_error = |e: std::io::Error| TranslationError::StorageError {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        tokio::fs::write(&tmp, content).await.map_err(storage_error)?;
        tokio::fs::rename(&tmp, &path).await.map_err(storage_error)?;
        debug!("Wrote slot {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonFileStore {
    async fn load(&self) -> Result<PersistedState> {
        Ok(self.state.lock().await.clone())
    }

    async fn save_history(&self, history: &History) -> Result<()> {
        let content = serde_json::to_vec(history)?;
        let mut state = self.state.lock().await;
        self.write_slot(HISTORY_SLOT, &content).await?;
        state.history = history.clone();
        Ok(())
    }

    async fn increment_count(&self) -> Result<u64> {
        let mut state = self.state.lock().await;
        let count = state.translation_count + 1;
        self.write_slot(COUNT_SLOT, count.to_string().as_bytes()).await?;
        state.translation_count = count;
        Ok(count)
    }
}

async fn read_history(path: &Path) -> History {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Vec<HistoryEntry>>(&bytes) {
            Ok(entries) => History::from_entries(entries),
            Err(e) => {
                warn!("Ignoring unreadable history at {}: {}", path.display(), e);
                History::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => History::default(),
        Err(e) => {
            warn!("Failed to read history at {}: {}", path.display(), e);
            History::default()
        }
    }
}

async fn read_count(path: &Path) -> u64 {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => content.trim().parse().unwrap_or_else(|e| {
            warn!("Ignoring unreadable counter at {}: {}", path.display(), e);
            0
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => {
            warn!("Failed to read counter at {}: {}", path.display(), e);
            0
        }
    }
}

/// In-memory store; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing state
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn load(&self) -> Result<PersistedState> {
        Ok(self.state.lock().await.clone())
    }

    async fn save_history(&self, history: &History) -> Result<()> {
        self.state.lock().await.history = history.clone();
        Ok(())
    }

    async fn increment_count(&self) -> Result<u64> {
        let mut state = self.state.lock().await;
        state.translation_count += 1;
        Ok(state.translation_count)
    }
}

//! Plain-text export of a translation

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::errors::{Result, TranslationError};

/// File name for an export made at `at`
pub fn file_name(at: DateTime<Utc>) -> String {
    format!("translation_{}.txt", at.timestamp_millis())
}

/// Export body: the original and the translation as two labeled sections
pub fn render(original: &str, translated: &str) -> String {
    format!("Original: {}\n\nTranslated: {}", original, translated)
}

/// Write the export into `dir` and return its path
pub async fn write_export(dir: &Path, original: &str, translated: &str, at: DateTime<Utc>) -> Result<PathBuf> {
    let file_error = |path: &Path, e: std::io::Error| TranslationError::StorageError {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| file_error(dir, e))?;

    let path = dir.join(file_name(at));
    tokio::fs::write(&path, render(original, translated))
        .await
        .map_err(|e| file_error(&path, e))?;

    info!("Exported translation to {}", path.display());
    Ok(path)
}

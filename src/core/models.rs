//! Core data models for translation sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source-language sentinel meaning "detect automatically"
pub const AUTO_DETECT: &str = "auto";

/// Maximum input length in characters
pub const MAX_INPUT_CHARS: usize = 5000;

/// Number of history entries kept
pub const HISTORY_LIMIT: usize = 10;

/// Source language: a concrete code or auto-detect
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceLang {
    /// Let the service detect the language
    Auto,
    /// A concrete language code
    Code(String),
}

impl SourceLang {
    pub fn as_str(&self) -> &str {
        match self {
            SourceLang::Auto => AUTO_DETECT,
            SourceLang::Code(code) => code,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, SourceLang::Auto)
    }
}

impl Default for SourceLang {
    fn default() -> Self {
        SourceLang::Auto
    }
}

impl From<String> for SourceLang {
    fn from(value: String) -> Self {
        if value == AUTO_DETECT {
            SourceLang::Auto
        } else {
            SourceLang::Code(value)
        }
    }
}

impl From<&str> for SourceLang {
    fn from(value: &str) -> Self {
        SourceLang::from(value.to_string())
    }
}

impl From<SourceLang> for String {
    fn from(value: SourceLang) -> Self {
        match value {
            SourceLang::Auto => AUTO_DETECT.to_string(),
            SourceLang::Code(code) => code,
        }
    }
}

impl fmt::Display for SourceLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Translation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: SourceLang,
    pub target_lang: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_lang: SourceLang::Auto,
            target_lang: target_lang.into(),
        }
    }

    pub fn with_source_lang(mut self, source_lang: impl Into<SourceLang>) -> Self {
        self.source_lang = source_lang.into();
        self
    }
}

/// A completed translation, as stored in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub source: String,
    pub translated: String,
    pub source_lang: SourceLang,
    pub target_lang: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(request: &TranslationRequest, translated: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            source: request.text.clone(),
            translated: translated.into(),
            source_lang: request.source_lang.clone(),
            target_lang: request.target_lang.clone(),
            timestamp,
        }
    }
}

/// Bounded translation history, newest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Build a history from stored entries, dropping anything past the limit
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.truncate(HISTORY_LIMIT);
        Self { entries }
    }

    /// Prepend an entry and discard the oldest beyond the limit
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Kind of transient status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    None,
    Success,
    Error,
    Info,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::None => write!(f, "none"),
            StatusKind::Success => write!(f, "success"),
            StatusKind::Error => write!(f, "error"),
            StatusKind::Info => write!(f, "info"),
        }
    }
}

/// Transient user-facing status
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == StatusKind::None
    }
}

/// Why a translate call did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Input was empty after trimming
    EmptyInput,
    /// Another request is still in flight
    Busy,
}

/// Result of a translate call that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateOutcome {
    Translated(String),
    Skipped(SkipReason),
}

impl TranslateOutcome {
    pub fn translation(&self) -> Option<&str> {
        match self {
            TranslateOutcome::Translated(text) => Some(text),
            TranslateOutcome::Skipped(_) => None,
        }
    }
}

/// Truncate `text` to at most `MAX_INPUT_CHARS` characters
pub fn cap_input(mut text: String) -> String {
    if let Some((byte_idx, _)) = text.char_indices().nth(MAX_INPUT_CHARS) {
        text.truncate(byte_idx);
    }
    text
}

/// Shorten `text` for list display, appending an ellipsis when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

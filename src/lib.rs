//! Translator Pro - interactive translation client library
//!
//! This library provides a translation session with history, voice input,
//! speech output, clipboard/share and plain-text export, backed by the
//! public translate endpoint.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;

// Re-export key types for convenience
pub use crate::core::{
    client::{AsyncTranslator, Translator},
    config::TranslatorConfig,
    errors::TranslationError,
    host::{CommandHost, HeadlessHost, HostCapabilities},
    models::{HistoryEntry, SourceLang, StatusKind, StatusMessage, TranslateOutcome, TranslationRequest},
    session::{SessionSettings, SessionSnapshot, TranslationSession},
    storage::{HistoryStore, JsonFileStore, MemoryStore},
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

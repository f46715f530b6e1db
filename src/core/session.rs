//! Translation session manager
//!
//! Owns the input/output text, language pair, history and status of one
//! interactive session, and is the only place that calls the translator.
//! At most one translation is in flight at a time; history entries land in
//! completion order and are persisted after the in-memory update.

use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::client::Translator;
use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::export;
use crate::core::host::HostCapabilities;
use crate::core::languages;
use crate::core::models::{
    cap_input, History, HistoryEntry, SkipReason, SourceLang, StatusMessage, TranslateOutcome,
    TranslationRequest, AUTO_DETECT,
};
use crate::core::status::{StatusBoard, DEFAULT_STATUS_TTL};
use crate::core::storage::HistoryStore;

/// Default quiet period before an auto-translate fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Status text shown after a successful translation
pub const TRANSLATION_SUCCEEDED: &str = "Translation successful!";

/// Startup settings for a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub source_lang: SourceLang,
    pub target_lang: String,
    pub auto_translate: bool,
    pub debounce: Duration,
    pub status_ttl: Duration,
    pub export_dir: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            source_lang: SourceLang::Auto,
            target_lang: "ta".to_string(),
            auto_translate: false,
            debounce: DEFAULT_DEBOUNCE,
            status_ttl: DEFAULT_STATUS_TTL,
            export_dir: PathBuf::from("."),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            source_lang: SourceLang::from(config.source_lang.clone()),
            target_lang: config.target_lang.clone(),
            auto_translate: config.auto_translate,
            debounce: config.debounce(),
            status_ttl: config.status_ttl(),
            export_dir: config.resolved_export_dir(),
        }
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    input_text: String,
    translated_text: String,
    source_lang: SourceLang,
    target_lang: String,
    auto_translate: bool,
    history: History,
    translation_count: u64,
}

/// Read-only view of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub input_text: String,
    pub translated_text: String,
    pub source_lang: SourceLang,
    pub target_lang: String,
    pub auto_translate: bool,
    pub is_loading: bool,
    pub status: StatusMessage,
    pub history: History,
    pub translation_count: u64,
}

/// Holds the loading flag for the duration of one request
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct SessionInner {
    translator: Arc<dyn Translator>,
    store: Arc<dyn HistoryStore>,
    host: Arc<dyn HostCapabilities>,
    state: Mutex<SessionState>,
    loading: AtomicBool,
    status: StatusBoard,
    pending: Mutex<Option<JoinHandle<()>>>,
    debounce: Duration,
    export_dir: PathBuf,
}

/// Cheaply cloneable handle to a translation session
#[derive(Clone)]
pub struct TranslationSession {
    inner: Arc<SessionInner>,
}

impl TranslationSession {
    /// Create a session, reading history and counter from `store` once
    pub async fn open(
        translator: Arc<dyn Translator>,
        store: Arc<dyn HistoryStore>,
        host: Arc<dyn HostCapabilities>,
        settings: SessionSettings,
    ) -> Result<Self> {
        let persisted = store.load().await?;
        debug!(
            "Session opened with {} history entries, {} lifetime translations",
            persisted.history.len(),
            persisted.translation_count
        );

        let state = SessionState {
            input_text: String::new(),
            translated_text: String::new(),
            source_lang: settings.source_lang,
            target_lang: settings.target_lang,
            auto_translate: settings.auto_translate,
            history: persisted.history,
            translation_count: persisted.translation_count,
        };

        Ok(Self {
            inner: Arc::new(SessionInner {
                translator,
                store,
                host,
                state: Mutex::new(state),
                loading: AtomicBool::new(false),
                status: StatusBoard::new(settings.status_ttl),
                pending: Mutex::new(None),
                debounce: settings.debounce,
                export_dir: settings.export_dir,
            }),
        })
    }

    /// Translate `text` and record the result.
    ///
    /// Blank text and calls made while another request is in flight are
    /// skipped without touching state.
    pub async fn translate(
        &self,
        text: &str,
        source_lang: SourceLang,
        target_lang: &str,
    ) -> Result<TranslateOutcome> {
        if text.trim().is_empty() {
            debug!("Skipping translation of empty input");
            return Ok(TranslateOutcome::Skipped(SkipReason::EmptyInput));
        }

        if target_lang == AUTO_DETECT || target_lang.is_empty() {
            return self
                .fail(
                    TranslationError::InvalidLanguage {
                        code: target_lang.to_string(),
                    },
                    "Choose a target language",
                )
                .await;
        }

        let Some(_loading) = LoadingGuard::acquire(&self.inner.loading) else {
            debug!("Translation already in flight, ignoring request");
            return Ok(TranslateOutcome::Skipped(SkipReason::Busy));
        };

        let request = TranslationRequest::new(text, target_lang).with_source_lang(source_lang);
        let started_at = Utc::now();

        match self.inner.translator.translate(&request).await {
            Ok(translated) => {
                let entry = HistoryEntry::new(&request, translated.clone(), started_at);
                let history = {
                    let mut state = self.inner.state.lock().await;
                    state.translated_text = translated.clone();
                    state.history.record(entry);
                    state.translation_count += 1;
                    state.history.clone()
                };
                self.persist(&history).await;

                info!(
                    "Translated {} chars ({} -> {})",
                    request.text.chars().count(),
                    request.source_lang,
                    request.target_lang
                );
                self.inner.status.success(TRANSLATION_SUCCEEDED).await;
                Ok(TranslateOutcome::Translated(translated))
            }
            Err(e) => {
                warn!("Translation failed: {}", e);
                self.inner.status.error("Translation failed. Try again.").await;
                Err(e)
            }
        }
    }

    /// Translate the current input with the current language pair
    pub async fn translate_current(&self) -> Result<TranslateOutcome> {
        let (text, source_lang, target_lang) = {
            let state = self.inner.state.lock().await;
            (
                state.input_text.clone(),
                state.source_lang.clone(),
                state.target_lang.clone(),
            )
        };
        self.translate(&text, source_lang, &target_lang).await
    }

    async fn persist(&self, history: &History) {
        if let Err(e) = self.inner.store.save_history(history).await {
            warn!("Failed to save history: {}", e);
        }
        match self.inner.store.increment_count().await {
            Ok(count) => debug!("Lifetime translations: {}", count),
            Err(e) => warn!("Failed to update translation count: {}", e),
        }
    }

    /// Exchange source and target; the previous translation becomes the input
    pub async fn swap_languages(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if self.is_loading() {
            drop(state);
            return self.reject_while_loading("swap languages").await;
        }
        let SourceLang::Code(source) = state.source_lang.clone() else {
            drop(state);
            return self
                .fail(TranslationError::InvalidSwap, "Cannot swap with Auto-detect")
                .await;
        };

        let target = std::mem::replace(&mut state.target_lang, source);
        state.source_lang = SourceLang::Code(target);
        let translated = std::mem::take(&mut state.translated_text);
        state.input_text = cap_input(translated);
        drop(state);

        self.inner.status.info("Languages swapped!").await;
        self.input_changed().await;
        Ok(())
    }

    /// Restore a history entry into the session; no request is made.
    ///
    /// Entries naming a language outside the catalog are refused, and the
    /// restored input is capped like typed input.
    pub async fn load_from_history(&self, entry: &HistoryEntry) -> Result<()> {
        if !languages::is_valid_target(&entry.target_lang)
            || !languages::is_valid_source(entry.source_lang.as_str())
        {
            let code = if languages::is_valid_target(&entry.target_lang) {
                entry.source_lang.to_string()
            } else {
                entry.target_lang.clone()
            };
            warn!("Refusing history entry with language '{}'", code);
            return self
                .fail(TranslationError::InvalidLanguage { code }, "History entry is not usable")
                .await;
        }

        self.cancel_auto_translate().await;
        {
            let mut state = self.inner.state.lock().await;
            if self.is_loading() {
                drop(state);
                return self.reject_while_loading("load from history").await;
            }
            state.input_text = cap_input(entry.source.clone());
            state.translated_text = entry.translated.clone();
            state.source_lang = entry.source_lang.clone();
            state.target_lang = entry.target_lang.clone();
        }
        self.inner
            .status
            .info(format!(
                "Loaded from history ({} to {})",
                entry.source_lang, entry.target_lang
            ))
            .await;
        Ok(())
    }

    /// Restore the entry at `index` (0 is the newest)
    pub async fn load_history_entry(&self, index: usize) -> Result<HistoryEntry> {
        let (entry, len) = {
            let state = self.inner.state.lock().await;
            (state.history.get(index).cloned(), state.history.len())
        };

        match entry {
            Some(entry) => {
                self.load_from_history(&entry).await?;
                Ok(entry)
            }
            None => {
                self.fail(
                    TranslationError::HistoryIndex { index, len },
                    "No such history entry",
                )
                .await
            }
        }
    }

    /// Empty the input; the translation is kept
    pub async fn clear_input(&self) {
        self.inner.state.lock().await.input_text.clear();
        self.cancel_auto_translate().await;
    }

    /// Replace the input, truncated to the maximum length
    pub async fn set_input(&self, text: impl Into<String>) {
        self.inner.state.lock().await.input_text = cap_input(text.into());
        self.input_changed().await;
    }

    /// Set the source language (`auto` or a catalog code)
    pub async fn set_source_lang(&self, lang: &str) -> Result<()> {
        if !languages::is_valid_source(lang) {
            return self
                .fail(
                    TranslationError::InvalidLanguage {
                        code: lang.to_string(),
                    },
                    format!("Unknown language: {}", lang),
                )
                .await;
        }
        self.inner.state.lock().await.source_lang = SourceLang::from(lang);
        Ok(())
    }

    /// Set the target language (catalog codes only)
    pub async fn set_target_lang(&self, code: &str) -> Result<()> {
        if !languages::is_valid_target(code) {
            return self
                .fail(
                    TranslationError::InvalidLanguage {
                        code: code.to_string(),
                    },
                    format!("Cannot translate into '{}'", code),
                )
                .await;
        }
        self.inner.state.lock().await.target_lang = code.to_string();
        self.input_changed().await;
        Ok(())
    }

    pub async fn set_auto_translate(&self, enabled: bool) {
        self.inner.state.lock().await.auto_translate = enabled;
        if !enabled {
            self.cancel_auto_translate().await;
        }
        info!("Auto-translate {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Restart the debounce window after an input or target change
    async fn input_changed(&self) {
        let armed = {
            let state = self.inner.state.lock().await;
            state.auto_translate && !state.input_text.trim().is_empty()
        };

        let mut pending = self.inner.pending.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        if !armed {
            return;
        }

        let session = self.clone();
        let delay = self.inner.debounce;
        *pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            debug!("Auto-translate firing after {:?} of quiet", delay);
            // Detached so a later cancel never interrupts a started request.
            tokio::spawn(async move {
                if let Err(e) = session.translate_current().await {
                    debug!("Auto-translate failed: {}", e);
                }
            });
        }));
    }

    async fn cancel_auto_translate(&self) {
        if let Some(handle) = self.inner.pending.lock().await.take() {
            handle.abort();
        }
    }

    /// Recognize one utterance and use it as the input
    pub async fn start_voice_input(&self) -> Result<Option<String>> {
        if !self.inner.host.supports_speech_input() {
            return self
                .fail(TranslationError::unsupported("Speech input"), "Voice not supported")
                .await;
        }

        let lang = {
            let state = self.inner.state.lock().await;
            languages::recognition_lang(state.source_lang.as_str()).to_string()
        };
        self.inner.status.info("Listening...").await;

        match self.inner.host.recognize_once(&lang).await {
            Ok(Some(transcript)) => {
                self.set_input(transcript.clone()).await;
                Ok(Some(transcript))
            }
            Ok(None) => {
                self.inner.status.info("No speech detected").await;
                Ok(None)
            }
            Err(e) => {
                warn!("Speech recognition failed: {}", e);
                self.fail(e, "Voice input failed").await
            }
        }
    }

    /// Start speaking the translation.
    ///
    /// Speech runs in the background; the handle may be dropped.
    pub async fn speak_translation(&self) -> Result<JoinHandle<()>> {
        let (text, target_lang) = self.require_translation("speak").await?;
        if !self.inner.host.supports_speech_output() {
            return self
                .fail(TranslationError::unsupported("Speech output"), "Speech not supported")
                .await;
        }

        let host = Arc::clone(&self.inner.host);
        let hint = languages::speech_lang_hint(&target_lang).to_string();
        Ok(tokio::spawn(async move {
            if let Err(e) = host.speak(&text, &hint).await {
                warn!("Speech output failed: {}", e);
            }
        }))
    }

    pub async fn copy_translation(&self) -> Result<()> {
        let (text, _) = self.require_translation("copy").await?;
        if !self.inner.host.supports_clipboard() {
            return self
                .fail(TranslationError::unsupported("Clipboard"), "Clipboard not available")
                .await;
        }

        match self.inner.host.copy_to_clipboard(&text).await {
            Ok(()) => {
                self.inner.status.success("Copied!").await;
                Ok(())
            }
            Err(e) => self.fail(e, "Copy failed").await,
        }
    }

    /// Share through the host, or copy when the host cannot share
    pub async fn share_translation(&self) -> Result<()> {
        let (text, _) = self.require_translation("share").await?;
        if !self.inner.host.supports_share() {
            return self.copy_translation().await;
        }

        match self.inner.host.share(&text).await {
            Ok(()) => {
                self.inner.status.success("Shared!").await;
                Ok(())
            }
            Err(e) => self.fail(e, "Share failed").await,
        }
    }

    /// Write the original and translated text to a timestamped file
    pub async fn export_translation(&self) -> Result<PathBuf> {
        let (translated, _) = self.require_translation("export").await?;
        let original = self.inner.state.lock().await.input_text.clone();

        match export::write_export(&self.inner.export_dir, &original, &translated, Utc::now()).await {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.inner.status.success(format!("Saved {}", name)).await;
                Ok(path)
            }
            Err(e) => self.fail(e, "Export failed").await,
        }
    }

    /// Current translation and target, or an error when there is none
    async fn require_translation(&self, action: &str) -> Result<(String, String)> {
        let (text, target_lang) = {
            let state = self.inner.state.lock().await;
            (state.translated_text.clone(), state.target_lang.clone())
        };
        if text.is_empty() {
            return self
                .fail(
                    TranslationError::EmptyTranslation {
                        action: action.to_string(),
                    },
                    format!("Nothing to {} yet", action),
                )
                .await;
        }
        Ok((text, target_lang))
    }

    async fn reject_while_loading<T>(&self, action: &str) -> Result<T> {
        debug!("Refusing to {} while a translation is in flight", action);
        self.fail(
            TranslationError::Busy {
                action: action.to_string(),
            },
            "Wait for the current translation to finish",
        )
        .await
    }

    async fn fail<T>(&self, error: TranslationError, message: impl Into<String>) -> Result<T> {
        self.inner.status.error(message).await;
        Err(error)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::Acquire)
    }

    pub fn status(&self) -> StatusMessage {
        self.inner.status.current()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StatusMessage> {
        self.inner.status.subscribe()
    }

    pub async fn history(&self) -> History {
        self.inner.state.lock().await.history.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock().await;
        SessionSnapshot {
            input_text: state.input_text.clone(),
            translated_text: state.translated_text.clone(),
            source_lang: state.source_lang.clone(),
            target_lang: state.target_lang.clone(),
            auto_translate: state.auto_translate,
            is_loading: self.is_loading(),
            status: self.status(),
            history: state.history.clone(),
            translation_count: state.translation_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::HeadlessHost;
    use crate::core::models::{StatusKind, MAX_INPUT_CHARS};
    use crate::core::storage::{MemoryStore, PersistedState};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;
    use tokio_test::assert_ok;

    #[derive(Default)]
    struct FakeTranslator {
        reply: Option<String>,
        fail: AtomicBool,
        requests: std::sync::Mutex<Vec<TranslationRequest>>,
    }

    impl FakeTranslator {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate(&self, request: &TranslationRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail.load(Ordering::SeqCst) {
                return Err(TranslationError::NetworkError {
                    message: "connection reset".to_string(),
                });
            }
            Ok(self
                .reply
                .clone()
                .unwrap_or_else(|| format!("{}:{}", request.target_lang, request.text)))
        }
    }

    #[derive(Default)]
    struct GatedTranslator {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for GatedTranslator {
        async fn translate(&self, request: &TranslationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(request.text.to_uppercase())
        }
    }

    #[derive(Default)]
    struct FakeHost {
        transcript: Option<String>,
        can_speak: bool,
        can_copy: bool,
        can_share: bool,
        spoken: std::sync::Mutex<Vec<(String, String)>>,
        copied: std::sync::Mutex<Vec<String>>,
        shared: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HostCapabilities for FakeHost {
        fn supports_speech_input(&self) -> bool {
            self.transcript.is_some()
        }

        async fn recognize_once(&self, lang: &str) -> Result<Option<String>> {
            Ok(self.transcript.as_ref().map(|t| format!("{} [{}]", t, lang)))
        }

        fn supports_speech_output(&self) -> bool {
            self.can_speak
        }

        async fn speak(&self, text: &str, lang_hint: &str) -> Result<()> {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), lang_hint.to_string()));
            Ok(())
        }

        fn supports_clipboard(&self) -> bool {
            self.can_copy
        }

        async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn supports_share(&self) -> bool {
            self.can_share
        }

        async fn share(&self, text: &str) -> Result<()> {
            self.shared.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    async fn open_session(
        translator: Arc<dyn Translator>,
        host: Arc<dyn HostCapabilities>,
        settings: SessionSettings,
    ) -> (TranslationSession, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = TranslationSession::open(translator, store.clone(), host, settings)
            .await
            .unwrap();
        (session, store)
    }

    async fn basic_session(translator: Arc<dyn Translator>) -> (TranslationSession, Arc<MemoryStore>) {
        open_session(translator, Arc::new(HeadlessHost), SessionSettings::default()).await
    }

    fn auto_settings() -> SessionSettings {
        SessionSettings {
            auto_translate: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_hello_to_tamil() {
        let translator = Arc::new(FakeTranslator::replying("வணக்கம்"));
        let (session, store) = basic_session(translator.clone()).await;

        session.set_input("Hello").await;
        let outcome = assert_ok!(session.translate_current().await);
        assert_eq!(outcome.translation(), Some("வணக்கம்"));

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.translated_text, "வணக்கம்");
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.status.kind, StatusKind::Success);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.translation_count, 1);

        let request = translator.requests.lock().unwrap()[0].clone();
        assert_eq!(request.source_lang, SourceLang::Auto);
        assert_eq!(request.target_lang, "ta");

        let persisted = store.load().await.unwrap();
        assert_eq!(persisted.history, snapshot.history);
        assert_eq!(persisted.translation_count, 1);
    }

    #[tokio::test]
    async fn test_success_records_matching_entry() {
        let (session, _) = basic_session(Arc::new(FakeTranslator::replying("Bonjour"))).await;

        let before = Utc::now();
        session.translate("Hello", SourceLang::from("en"), "fr").await.unwrap();
        let after = Utc::now();

        let history = session.history().await;
        let entry = history.latest().unwrap();
        assert_eq!(entry.source, "Hello");
        assert_eq!(entry.translated, "Bonjour");
        assert_eq!(entry.source_lang, SourceLang::from("en"));
        assert_eq!(entry.target_lang, "fr");
        assert!(entry.timestamp >= before && entry.timestamp <= after);
    }

    #[tokio::test]
    async fn test_blank_input_is_a_no_op() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, store) = basic_session(translator.clone()).await;
        let before = session.snapshot().await;

        let outcome = session.translate("  \n\t ", SourceLang::Auto, "ta").await.unwrap();
        assert_eq!(outcome, TranslateOutcome::Skipped(SkipReason::EmptyInput));

        assert_eq!(translator.calls(), 0);
        assert_eq!(session.snapshot().await, before);
        assert!(session.status().is_none());
        assert_eq!(store.load().await.unwrap().translation_count, 0);
    }

    #[tokio::test]
    async fn test_network_failure_keeps_previous_translation() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, store) = basic_session(translator.clone()).await;
        session.translate("one", SourceLang::Auto, "fr").await.unwrap();

        translator.fail.store(true, Ordering::SeqCst);
        let err = session.translate("two", SourceLang::Auto, "fr").await.unwrap_err();
        assert!(err.is_translation_failure());

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.translated_text, "fr:one");
        assert_eq!(snapshot.status.kind, StatusKind::Error);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(store.load().await.unwrap().translation_count, 1);
    }

    #[tokio::test]
    async fn test_auto_target_is_rejected() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, _) = basic_session(translator.clone()).await;

        let err = session.translate("Hello", SourceLang::Auto, "auto").await.unwrap_err();
        assert!(matches!(err, TranslationError::InvalidLanguage { .. }));
        assert_eq!(translator.calls(), 0);
        assert_eq!(session.status().kind, StatusKind::Error);
    }

    #[tokio::test]
    async fn test_history_keeps_ten_newest() {
        let (session, store) = basic_session(Arc::new(FakeTranslator::default())).await;

        for n in 0..11 {
            session
                .translate(&format!("text {}", n), SourceLang::Auto, "de")
                .await
                .unwrap();
        }

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.history.len(), 10);
        assert_eq!(snapshot.history.latest().unwrap().source, "text 10");
        assert!(snapshot.history.entries().iter().all(|e| e.source != "text 0"));
        assert_eq!(snapshot.translation_count, 11);
        assert_eq!(store.load().await.unwrap().history.len(), 10);
    }

    #[tokio::test]
    async fn test_second_request_ignored_while_loading() {
        let translator = Arc::new(GatedTranslator::default());
        let (session, _) = basic_session(translator.clone()).await;

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.translate("first", SourceLang::Auto, "en").await }
        });
        while !session.is_loading() {
            tokio::task::yield_now().await;
        }

        let second = session.translate("second", SourceLang::Auto, "en").await.unwrap();
        assert_eq!(second, TranslateOutcome::Skipped(SkipReason::Busy));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);

        translator.gate.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first.translation(), Some("FIRST"));
        assert!(!session.is_loading());

        let history = session.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().source, "first");
    }

    #[tokio::test]
    async fn test_swap_and_restore_refused_while_loading() {
        let translator = Arc::new(GatedTranslator::default());
        let settings = SessionSettings {
            source_lang: SourceLang::from("en"),
            target_lang: "fr".to_string(),
            ..Default::default()
        };
        let (session, _) = open_session(translator.clone(), Arc::new(HeadlessHost), settings).await;

        translator.gate.notify_one();
        session.translate("seed", SourceLang::from("en"), "fr").await.unwrap();
        let seeded = session.history().await.latest().cloned().unwrap();

        session.set_input("second").await;
        let running = tokio::spawn({
            let session = session.clone();
            async move { session.translate_current().await }
        });
        while !session.is_loading() {
            tokio::task::yield_now().await;
        }

        let err = session.swap_languages().await.unwrap_err();
        assert!(matches!(err, TranslationError::Busy { .. }));
        assert_eq!(session.status().kind, StatusKind::Error);
        let err = session.load_from_history(&seeded).await.unwrap_err();
        assert!(matches!(err, TranslationError::Busy { .. }));

        translator.gate.notify_one();
        running.await.unwrap().unwrap();

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.source_lang, SourceLang::from("en"));
        assert_eq!(snapshot.target_lang, "fr");
        assert_eq!(snapshot.input_text, "second");
        assert_eq!(snapshot.translated_text, "SECOND");
        assert_eq!(snapshot.history.len(), 2);

        session.swap_languages().await.unwrap();
        let swapped = session.snapshot().await;
        assert_eq!(swapped.source_lang, SourceLang::from("fr"));
        assert_eq!(swapped.input_text, "SECOND");
    }

    #[tokio::test]
    async fn test_empty_translation_is_recorded() {
        let translator = Arc::new(FakeTranslator::replying(""));
        let (session, store) = basic_session(translator.clone()).await;

        session.set_input("Hello").await;
        let outcome = session.translate_current().await.unwrap();
        assert_eq!(outcome, TranslateOutcome::Translated(String::new()));

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.translated_text, "");
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history.latest().unwrap().translated, "");
        assert_eq!(
            snapshot.status,
            StatusMessage::new(TRANSLATION_SUCCEEDED, StatusKind::Success)
        );
        assert_eq!(store.load().await.unwrap().translation_count, 1);
    }

    #[tokio::test]
    async fn test_swap_twice_restores_pair() {
        let (session, _) = basic_session(Arc::new(FakeTranslator::replying("Bonjour"))).await;
        session.set_source_lang("en").await.unwrap();
        session.set_target_lang("fr").await.unwrap();
        session.set_input("Hello").await;
        session.translate_current().await.unwrap();

        session.swap_languages().await.unwrap();
        let swapped = session.snapshot().await;
        assert_eq!(swapped.source_lang, SourceLang::from("fr"));
        assert_eq!(swapped.target_lang, "en");
        assert_eq!(swapped.input_text, "Bonjour");
        assert!(swapped.translated_text.is_empty());
        assert_eq!(swapped.status.kind, StatusKind::Info);

        session.swap_languages().await.unwrap();
        let restored = session.snapshot().await;
        assert_eq!(restored.source_lang, SourceLang::from("en"));
        assert_eq!(restored.target_lang, "fr");
    }

    #[tokio::test]
    async fn test_swap_with_auto_source_is_rejected() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, _) = basic_session(translator.clone()).await;
        session.set_input("Hello").await;
        session.translate_current().await.unwrap();
        let before = session.snapshot().await;

        let err = session.swap_languages().await.unwrap_err();
        assert!(matches!(err, TranslationError::InvalidSwap));

        let after = session.snapshot().await;
        assert_eq!(after.input_text, before.input_text);
        assert_eq!(after.translated_text, before.translated_text);
        assert_eq!(after.source_lang, SourceLang::Auto);
        assert_eq!(after.target_lang, before.target_lang);
        assert_eq!(after.status.kind, StatusKind::Error);
        assert_eq!(translator.calls(), 1);
    }

    #[tokio::test]
    async fn test_load_from_history_restores_fields() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, _) = basic_session(translator.clone()).await;
        session.translate("Hola", SourceLang::from("es"), "en").await.unwrap();
        session.translate("Ciao", SourceLang::Auto, "fr").await.unwrap();

        let entry = session.history().await.get(1).cloned().unwrap();
        session.load_from_history(&entry).await.unwrap();
        let first = session.snapshot().await;
        assert_eq!(first.input_text, "Hola");
        assert_eq!(first.translated_text, "en:Hola");
        assert_eq!(first.source_lang, SourceLang::from("es"));
        assert_eq!(first.target_lang, "en");
        assert_eq!(first.status.text, "Loaded from history (es to en)");

        session.load_from_history(&entry).await.unwrap();
        let second = session.snapshot().await;
        assert_eq!(second, first);
        assert_eq!(translator.calls(), 2);
    }

    #[tokio::test]
    async fn test_load_from_history_checks_entry() {
        let (session, _) = basic_session(Arc::new(FakeTranslator::default())).await;

        let request = TranslationRequest::new("Hello", "auto");
        let bad_target = HistoryEntry::new(&request, "Hello", Utc::now());
        let err = session.load_from_history(&bad_target).await.unwrap_err();
        assert!(matches!(err, TranslationError::InvalidLanguage { ref code } if code == "auto"));
        assert_eq!(session.snapshot().await.target_lang, "ta");
        assert_eq!(session.status().kind, StatusKind::Error);

        let long = TranslationRequest::new("b".repeat(MAX_INPUT_CHARS + 10), "fr");
        let oversized = HistoryEntry::new(&long, "b", Utc::now());
        session.load_from_history(&oversized).await.unwrap();
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.input_text.chars().count(), MAX_INPUT_CHARS);
        assert_eq!(snapshot.target_lang, "fr");
    }

    #[tokio::test]
    async fn test_load_history_entry_out_of_range() {
        let (session, _) = basic_session(Arc::new(FakeTranslator::default())).await;
        let err = session.load_history_entry(3).await.unwrap_err();
        assert!(matches!(err, TranslationError::HistoryIndex { index: 3, len: 0 }));
        assert_eq!(session.status().kind, StatusKind::Error);
    }

    #[tokio::test]
    async fn test_clear_input_keeps_translation() {
        let (session, _) = basic_session(Arc::new(FakeTranslator::default())).await;
        session.set_input("Hello").await;
        session.translate_current().await.unwrap();

        session.clear_input().await;
        let snapshot = session.snapshot().await;
        assert!(snapshot.input_text.is_empty());
        assert_eq!(snapshot.translated_text, "ta:Hello");
    }

    #[tokio::test]
    async fn test_input_is_truncated() {
        let (session, _) = basic_session(Arc::new(FakeTranslator::default())).await;
        session.set_input("a".repeat(MAX_INPUT_CHARS + 1)).await;
        assert_eq!(session.snapshot().await.input_text.chars().count(), MAX_INPUT_CHARS);
    }

    #[tokio::test]
    async fn test_invalid_language_selection() {
        let (session, _) = basic_session(Arc::new(FakeTranslator::default())).await;

        assert!(session.set_target_lang("auto").await.is_err());
        assert!(session.set_source_lang("klingon").await.is_err());
        assert_ok!(session.set_source_lang("auto").await);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.target_lang, "ta");
        assert_eq!(snapshot.status.kind, StatusKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_translate_debounces_edits() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, _) = open_session(translator.clone(), Arc::new(HeadlessHost), auto_settings()).await;

        session.set_input("H").await;
        sleep(Duration::from_millis(300)).await;
        session.set_input("He").await;
        sleep(Duration::from_millis(300)).await;
        session.set_input("Hel").await;

        sleep(Duration::from_millis(799)).await;
        assert_eq!(translator.calls(), 0);

        sleep(Duration::from_millis(2)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(translator.calls(), 1);
        assert_eq!(translator.requests.lock().unwrap()[0].text, "Hel");
        assert_eq!(session.snapshot().await.translated_text, "ta:Hel");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_translate_follows_target_change() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, _) = open_session(translator.clone(), Arc::new(HeadlessHost), auto_settings()).await;

        session.set_input("Hello").await;
        sleep(Duration::from_millis(500)).await;
        session.set_target_lang("ja").await.unwrap();

        sleep(Duration::from_millis(1000)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        let requests = translator.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target_lang, "ja");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_translate_cancelled_by_clear_and_disable() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, _) = open_session(translator.clone(), Arc::new(HeadlessHost), auto_settings()).await;

        session.set_input("Hello").await;
        session.clear_input().await;
        session.set_input("World").await;
        session.set_auto_translate(false).await;

        sleep(Duration::from_secs(2)).await;
        assert_eq!(translator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_swap_restarts_auto_translate() {
        let translator = Arc::new(FakeTranslator::default());
        let settings = SessionSettings {
            source_lang: SourceLang::from("en"),
            target_lang: "fr".to_string(),
            ..Default::default()
        };
        let (session, _) = open_session(translator.clone(), Arc::new(HeadlessHost), settings).await;
        session.set_input("Hello").await;
        session.translate_current().await.unwrap();
        session.set_auto_translate(true).await;

        session.swap_languages().await.unwrap();
        assert_eq!(translator.calls(), 1);

        sleep(Duration::from_millis(799)).await;
        assert_eq!(translator.calls(), 1);

        sleep(Duration::from_millis(2)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        let requests = translator.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].text, "fr:Hello");
        assert_eq!(requests[1].source_lang, SourceLang::from("fr"));
        assert_eq!(requests[1].target_lang, "en");
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_from_history_cancels_auto_translate() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, _) = basic_session(translator.clone()).await;
        session.translate("Hola", SourceLang::from("es"), "en").await.unwrap();
        let entry = session.history().await.latest().cloned().unwrap();

        session.set_auto_translate(true).await;
        session.set_input("pending edit").await;
        sleep(Duration::from_millis(400)).await;
        session.load_from_history(&entry).await.unwrap();

        sleep(Duration::from_secs(2)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(translator.calls(), 1);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.input_text, "Hola");
        assert_eq!(snapshot.translated_text, "en:Hola");
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_mode_never_auto_translates() {
        let translator = Arc::new(FakeTranslator::default());
        let (session, _) = basic_session(translator.clone()).await;

        session.set_input("Hello").await;
        sleep(Duration::from_secs(2)).await;
        assert_eq!(translator.calls(), 0);
    }

    #[tokio::test]
    async fn test_voice_input_unsupported() {
        let (session, _) = basic_session(Arc::new(FakeTranslator::default())).await;
        let err = session.start_voice_input().await.unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedCapability { .. }));
        assert_eq!(session.status(), StatusMessage::new("Voice not supported", StatusKind::Error));
    }

    #[tokio::test]
    async fn test_voice_input_replaces_input() {
        let host = Arc::new(FakeHost {
            transcript: Some("good morning".to_string()),
            ..Default::default()
        });
        let (session, _) = open_session(Arc::new(FakeTranslator::default()), host, SessionSettings::default()).await;
        session.set_input("old text").await;

        let transcript = session.start_voice_input().await.unwrap();
        assert_eq!(transcript.as_deref(), Some("good morning [en-US]"));
        assert_eq!(session.snapshot().await.input_text, "good morning [en-US]");
    }

    #[tokio::test]
    async fn test_speak_uses_language_hint() {
        let host = Arc::new(FakeHost {
            can_speak: true,
            ..Default::default()
        });
        let (session, _) = open_session(Arc::new(FakeTranslator::default()), host.clone(), SessionSettings::default()).await;

        let err = session.speak_translation().await.unwrap_err();
        assert!(matches!(err, TranslationError::EmptyTranslation { .. }));

        session.set_target_lang("zh").await.unwrap();
        session.translate("Hi", SourceLang::Auto, "zh").await.unwrap();
        session.speak_translation().await.unwrap().await.unwrap();

        let spoken = host.spoken.lock().unwrap().clone();
        assert_eq!(spoken, vec![("zh:Hi".to_string(), "zh-CN".to_string())]);
    }

    #[tokio::test]
    async fn test_copy_and_share() {
        let host = Arc::new(FakeHost {
            can_copy: true,
            ..Default::default()
        });
        let (session, _) = open_session(Arc::new(FakeTranslator::default()), host.clone(), SessionSettings::default()).await;
        session.translate("Hi", SourceLang::Auto, "fr").await.unwrap();

        session.copy_translation().await.unwrap();
        assert_eq!(session.status(), StatusMessage::new("Copied!", StatusKind::Success));

        // No share capability: falls back to the clipboard.
        session.share_translation().await.unwrap();
        assert_eq!(host.copied.lock().unwrap().len(), 2);
        assert!(host.shared.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_share_uses_host_when_available() {
        let host = Arc::new(FakeHost {
            can_share: true,
            ..Default::default()
        });
        let (session, _) = open_session(Arc::new(FakeTranslator::default()), host.clone(), SessionSettings::default()).await;
        session.translate("Hi", SourceLang::Auto, "fr").await.unwrap();

        session.share_translation().await.unwrap();
        assert_eq!(*host.shared.lock().unwrap(), vec!["fr:Hi".to_string()]);
        assert_eq!(session.status().text, "Shared!");
    }

    #[tokio::test]
    async fn test_copy_without_clipboard() {
        let (session, _) = basic_session(Arc::new(FakeTranslator::default())).await;
        session.translate("Hi", SourceLang::Auto, "fr").await.unwrap();

        let err = session.copy_translation().await.unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedCapability { .. }));
        assert_eq!(session.status().kind, StatusKind::Error);
    }

    #[tokio::test]
    async fn test_export_translation() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SessionSettings {
            export_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let (session, _) = open_session(Arc::new(FakeTranslator::default()), Arc::new(HeadlessHost), settings).await;

        assert!(session.export_translation().await.is_err());

        session.set_input("Hello").await;
        session.translate_current().await.unwrap();
        let path = session.export_translation().await.unwrap();

        assert!(path.starts_with(dir.path()));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Original: Hello\n\nTranslated: ta:Hello");
        assert_eq!(session.status().kind, StatusKind::Success);
    }

    #[tokio::test]
    async fn test_open_restores_persisted_state() {
        let mut history = History::default();
        history.record(HistoryEntry::new(&TranslationRequest::new("Hi", "es"), "Hola", Utc::now()));
        let store = Arc::new(MemoryStore::with_state(PersistedState {
            history: history.clone(),
            translation_count: 42,
        }));

        let session = TranslationSession::open(
            Arc::new(FakeTranslator::default()),
            store,
            Arc::new(HeadlessHost),
            SessionSettings::default(),
        )
        .await
        .unwrap();

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.history, history);
        assert_eq!(snapshot.translation_count, 42);
        assert!(snapshot.input_text.is_empty());
        assert_eq!(snapshot.source_lang, SourceLang::Auto);
    }
}

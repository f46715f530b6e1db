//! CLI command definitions and handlers

use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::core::client::AsyncTranslator;
use crate::core::config::TranslatorConfig;
use crate::core::host::CommandHost;
use crate::core::languages::{self, LANGUAGES, QUICK_TARGETS};
use crate::core::models::{preview, HistoryEntry, SkipReason, StatusKind, StatusMessage, TranslateOutcome};
use crate::core::session::{SessionSettings, TranslationSession};
use crate::core::storage::{HistoryStore, JsonFileStore, MemoryStore};

/// Characters of source/translation shown per history line
const HISTORY_PREVIEW_CHARS: usize = 70;

/// Commands for Translator Pro
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate text once (reads stdin when no text is given)
    Translate {
        /// Text to translate
        text: Option<String>,

        /// Source language code, or "auto" to detect
        #[arg(short, long)]
        from: Option<String>,

        /// Target language code
        #[arg(short, long)]
        to: Option<String>,

        /// Copy the translation to the clipboard
        #[arg(long)]
        copy: bool,

        /// Speak the translation
        #[arg(long)]
        speak: bool,

        /// Save original and translation to a text file
        #[arg(long)]
        export: bool,
    },

    /// Show recent translations
    History {
        /// Print history as JSON
        #[arg(long)]
        json: bool,

        /// Show entry N in full (1 is the newest)
        #[arg(long)]
        show: Option<usize>,
    },

    /// List supported languages
    Languages,

    /// Show lifetime translation statistics
    Stats,

    /// Start an interactive translation session
    Interactive {
        /// Translate automatically after typing stops
        #[arg(long)]
        auto: bool,
    },
}

/// Build a session from configuration
pub async fn build_session(config: &TranslatorConfig, ephemeral: bool) -> anyhow::Result<TranslationSession> {
    let translator = Arc::new(AsyncTranslator::new(config.clone())?);

    let store: Arc<dyn HistoryStore> = if ephemeral {
        info!("Using in-memory history");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::open(config.resolved_data_dir()).await?)
    };

    let host = Arc::new(CommandHost::from_config(config));
    let session = TranslationSession::open(translator, store, host, SessionSettings::from_config(config)).await?;
    Ok(session)
}

/// Format a status line for the terminal
pub fn format_status(status: &StatusMessage) -> String {
    let icon = match status.kind {
        StatusKind::Success => "✅",
        StatusKind::Error => "❌",
        StatusKind::Info => "ℹ️ ",
        StatusKind::None => "",
    };
    format!("{} {}", icon, status.text)
}

fn print_status(session: &TranslationSession) {
    let status = session.status();
    if !status.is_none() {
        eprintln!("{}", format_status(&status));
    }
}

/// Format one history line block; `position` is 1-based
pub fn format_history_entry(position: usize, entry: &HistoryEntry) -> String {
    let when = entry
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S");
    format!(
        "{:>2}. {}\n    {}: {}\n    {}: {}",
        position,
        when,
        entry.source_lang,
        preview(&entry.source, HISTORY_PREVIEW_CHARS),
        entry.target_lang,
        preview(&entry.translated, HISTORY_PREVIEW_CHARS)
    )
}

/// Handle one-shot translation command
pub async fn handle_translate(
    session: &TranslationSession,
    text: Option<String>,
    from: Option<String>,
    to: Option<String>,
    copy: bool,
    speak: bool,
    export: bool,
) -> anyhow::Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            buffer
        }
    };

    if let Some(from) = from {
        session.set_source_lang(&from).await?;
    }
    if let Some(to) = to {
        session.set_target_lang(&to).await?;
    }
    session.set_input(text).await;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Translating...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let outcome = session.translate_current().await;
    pb.finish_and_clear();

    match outcome {
        Ok(TranslateOutcome::Translated(translated)) => println!("{}", translated),
        Ok(TranslateOutcome::Skipped(SkipReason::EmptyInput)) => anyhow::bail!("Nothing to translate"),
        Ok(TranslateOutcome::Skipped(SkipReason::Busy)) => anyhow::bail!("A translation is already running"),
        Err(e) => {
            print_status(session);
            return Err(e.into());
        }
    }

    if copy {
        session.copy_translation().await?;
        print_status(session);
    }

    if export {
        let path = session.export_translation().await?;
        eprintln!("📝 Saved to {}", path.display());
    }

    if speak {
        // One-shot runs wait for speech before the process exits.
        session.speak_translation().await?.await?;
    }

    Ok(())
}

/// Convert a 1-based history position to an index
fn history_index(position: usize) -> anyhow::Result<usize> {
    match position.checked_sub(1) {
        Some(index) => Ok(index),
        None => anyhow::bail!("not a history position: {} (1 is the newest)", position),
    }
}

/// Handle history command
pub async fn handle_history(session: &TranslationSession, json: bool, show: Option<usize>) -> anyhow::Result<()> {
    let history = session.history().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if let Some(position) = show {
        let entry = session.load_history_entry(history_index(position)?).await?;
        println!("{} → {}  ({})", entry.source_lang, entry.target_lang, entry.timestamp.to_rfc3339());
        println!("\nOriginal:\n{}", entry.source);
        println!("\nTranslated:\n{}", entry.translated);
        return Ok(());
    }

    if history.is_empty() {
        println!("No translations yet");
        return Ok(());
    }

    for (i, entry) in history.entries().iter().enumerate() {
        println!("{}", format_history_entry(i + 1, entry));
    }

    Ok(())
}

/// Handle languages command
pub async fn handle_languages() -> anyhow::Result<()> {
    println!("{:<8}{}", "auto", languages::display_name("auto"));
    for language in LANGUAGES {
        match languages::quick_label(language.code).filter(|_| QUICK_TARGETS.contains(&language.code)) {
            Some(label) => println!("{:<8}{} [{}]", language.code, language.name, label),
            None => println!("{:<8}{}", language.code, language.name),
        }
    }
    Ok(())
}

/// Handle stats command
pub async fn handle_stats(session: &TranslationSession, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let snapshot = session.snapshot().await;

    println!("📊 Translations: {}", snapshot.translation_count);
    println!("   History entries: {}", snapshot.history.len());
    if let Some(latest) = snapshot.history.latest() {
        println!("   Last translation: {}", latest.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"));
    }
    match data_dir {
        Some(dir) => println!("   Data directory: {}", dir.display()),
        None => println!("   Data directory: (in memory)"),
    }
    Ok(())
}

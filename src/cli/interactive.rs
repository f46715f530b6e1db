//! Interactive translation session in the terminal

use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::commands::{format_history_entry, format_status};
use crate::core::errors::Result;
use crate::core::languages::{self, QUICK_TARGETS};
use crate::core::models::{StatusKind, MAX_INPUT_CHARS};
use crate::core::session::{TranslationSession, TRANSLATION_SUCCEEDED};

const HELP: &str = "\
Type text and press Enter to translate it.

  :from <code|auto>   set the source language
  :to <code>          set the target language (no code: quick picks)
  :swap               swap source and target
  :translate          translate the current input again
  :clear              clear the input
  :voice              speak the input
  :speak              read the translation aloud
  :copy               copy the translation
  :share              share the translation
  :export             save original and translation to a file
  :history            list recent translations
  :load <n>           restore history entry n (1 is the newest)
  :auto [on|off]      toggle auto-translate
  :show               show the current input and translation
  :langs              list languages
  :stats              show the translation count
  :help               show this help
  :quit               leave";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Text(String),
    From(String),
    To(Option<String>),
    Swap,
    Translate,
    Clear,
    Voice,
    Speak,
    Copy,
    Share,
    Export,
    History,
    Load(usize),
    Auto(Option<bool>),
    Show,
    Languages,
    Stats,
    Help,
    Quit,
    Invalid(String),
}

impl ReplCommand {
    /// Parse a line; `None` for blank lines
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        let Some(command) = line.trim_start().strip_prefix(':') else {
            return Some(ReplCommand::Text(line.to_string()));
        };

        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();

        let parsed = match (name, arg) {
            ("from", Some(code)) => ReplCommand::From(code.to_string()),
            ("from", None) => ReplCommand::Invalid("usage: :from <code|auto>".to_string()),
            ("to", code) => ReplCommand::To(code.map(str::to_string)),
            ("swap", _) => ReplCommand::Swap,
            ("translate" | "t", _) => ReplCommand::Translate,
            ("clear", _) => ReplCommand::Clear,
            ("voice" | "mic", _) => ReplCommand::Voice,
            ("speak", _) => ReplCommand::Speak,
            ("copy", _) => ReplCommand::Copy,
            ("share", _) => ReplCommand::Share,
            ("export" | "download", _) => ReplCommand::Export,
            ("history" | "h", _) => ReplCommand::History,
            ("load", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => ReplCommand::Load(n),
                _ => ReplCommand::Invalid(format!("not a history position: {}", n)),
            },
            ("load", None) => ReplCommand::Invalid("usage: :load <n>".to_string()),
            ("auto", None) => ReplCommand::Auto(None),
            ("auto", Some("on")) => ReplCommand::Auto(Some(true)),
            ("auto", Some("off")) => ReplCommand::Auto(Some(false)),
            ("auto", Some(other)) => ReplCommand::Invalid(format!("expected on or off, got {}", other)),
            ("show", _) => ReplCommand::Show,
            ("langs" | "languages", _) => ReplCommand::Languages,
            ("stats", _) => ReplCommand::Stats,
            ("help" | "?", _) => ReplCommand::Help,
            ("quit" | "q" | "exit", _) => ReplCommand::Quit,
            (other, _) => ReplCommand::Invalid(format!("unknown command :{}", other)),
        };
        Some(parsed)
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Run the interactive loop until `:quit` or end of input
pub async fn run(session: TranslationSession) -> anyhow::Result<()> {
    let snapshot = session.snapshot().await;
    println!("🌐 Translator Pro");
    println!(
        "   {} → {}   auto-translate: {}   (:help for commands)",
        languages::display_name(snapshot.source_lang.as_str()),
        languages::display_name(&snapshot.target_lang),
        if snapshot.auto_translate { "on" } else { "off" }
    );

    let printer = tokio::spawn(print_statuses(session.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        if let Some(command) = ReplCommand::parse(&line) {
            if command == ReplCommand::Quit {
                break;
            }
            if let Err(e) = execute(&session, command).await {
                debug!("Command failed: {}", e);
            }
        }
        prompt();
    }

    printer.abort();
    println!();
    Ok(())
}

/// Render every status change; successful translations also print the result
async fn print_statuses(session: TranslationSession) {
    let mut statuses = session.subscribe_status();
    while statuses.changed().await.is_ok() {
        let status = statuses.borrow_and_update().clone();
        if status.is_none() {
            continue;
        }
        if status.kind == StatusKind::Success && status.text == TRANSLATION_SUCCEEDED {
            let snapshot = session.snapshot().await;
            println!("\n{}", snapshot.translated_text);
        }
        eprintln!("{}", format_status(&status));
    }
}

async fn execute(session: &TranslationSession, command: ReplCommand) -> Result<()> {
    match command {
        ReplCommand::Text(text) => {
            let auto_translate = session.snapshot().await.auto_translate;
            session.set_input(text).await;
            if !auto_translate {
                session.translate_current().await?;
            }
        }
        ReplCommand::From(code) => session.set_source_lang(&code).await?,
        ReplCommand::To(Some(code)) => session.set_target_lang(&code).await?,
        ReplCommand::To(None) => {
            let picks: Vec<String> = QUICK_TARGETS
                .iter()
                .filter_map(|code| languages::quick_label(code).map(|label| format!("{} ({})", label, code)))
                .collect();
            println!("Quick picks: {}", picks.join("  "));
        }
        ReplCommand::Swap => session.swap_languages().await?,
        ReplCommand::Translate => {
            session.translate_current().await?;
        }
        ReplCommand::Clear => session.clear_input().await,
        ReplCommand::Voice => {
            if let Some(transcript) = session.start_voice_input().await? {
                println!("🎤 {}", transcript);
                if !session.snapshot().await.auto_translate {
                    session.translate_current().await?;
                }
            }
        }
        ReplCommand::Speak => {
            session.speak_translation().await?;
        }
        ReplCommand::Copy => session.copy_translation().await?,
        ReplCommand::Share => session.share_translation().await?,
        ReplCommand::Export => {
            session.export_translation().await?;
        }
        ReplCommand::History => {
            let history = session.history().await;
            if history.is_empty() {
                println!("No translations yet");
            }
            for (i, entry) in history.entries().iter().enumerate() {
                println!("{}", format_history_entry(i + 1, entry));
            }
        }
        ReplCommand::Load(position) => {
            let entry = session.load_history_entry(position - 1).await?;
            println!("{}\n→ {}", entry.source, entry.translated);
        }
        ReplCommand::Auto(setting) => {
            let enabled = match setting {
                Some(enabled) => enabled,
                None => !session.snapshot().await.auto_translate,
            };
            session.set_auto_translate(enabled).await;
            println!("Auto-translate {}", if enabled { "on" } else { "off" });
        }
        ReplCommand::Show => {
            let snapshot = session.snapshot().await;
            println!(
                "{} → {}",
                languages::display_name(snapshot.source_lang.as_str()),
                languages::display_name(&snapshot.target_lang)
            );
            println!(
                "Input ({}/{}): {}",
                snapshot.input_text.chars().count(),
                MAX_INPUT_CHARS,
                snapshot.input_text
            );
            if snapshot.is_loading {
                println!("Translation: (translating...)");
            } else if snapshot.translated_text.is_empty() {
                println!("Translation appears here...");
            } else {
                println!("Translation: {}", snapshot.translated_text);
            }
        }
        ReplCommand::Languages => {
            for language in languages::LANGUAGES {
                println!("{:<8}{}", language.code, language.name);
            }
        }
        ReplCommand::Stats => {
            let snapshot = session.snapshot().await;
            println!(
                "📊 {} translations, {} in history",
                snapshot.translation_count,
                snapshot.history.len()
            );
        }
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit => {}
        ReplCommand::Invalid(message) => eprintln!("❌ {}", message),
    }
    Ok(())
}

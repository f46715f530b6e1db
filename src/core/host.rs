//! Host capabilities: speech, clipboard and share

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};

/// Everything the session needs from the host platform.
///
/// The session checks the `supports_*` methods before calling the matching
/// action, so implementations may assume they are only invoked when supported.
#[async_trait]
pub trait HostCapabilities: Send + Sync {
    fn supports_speech_input(&self) -> bool;

    /// Recognize one utterance; `None` when nothing was heard
    async fn recognize_once(&self, lang: &str) -> Result<Option<String>>;

    fn supports_speech_output(&self) -> bool;

    async fn speak(&self, text: &str, lang_hint: &str) -> Result<()>;

    fn supports_clipboard(&self) -> bool;

    async fn copy_to_clipboard(&self, text: &str) -> Result<()>;

    fn supports_share(&self) -> bool {
        false
    }

    async fn share(&self, _text: &str) -> Result<()> {
        Err(TranslationError::unsupported("Share"))
    }
}

/// A host with no capabilities at all
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessHost;

#[async_trait]
impl HostCapabilities for HeadlessHost {
    fn supports_speech_input(&self) -> bool {
        false
    }

    async fn recognize_once(&self, _lang: &str) -> Result<Option<String>> {
        Err(TranslationError::unsupported("Speech input"))
    }

    fn supports_speech_output(&self) -> bool {
        false
    }

    async fn speak(&self, _text: &str, _lang_hint: &str) -> Result<()> {
        Err(TranslationError::unsupported("Speech output"))
    }

    fn supports_clipboard(&self) -> bool {
        false
    }

    async fn copy_to_clipboard(&self, _text: &str) -> Result<()> {
        Err(TranslationError::unsupported("Clipboard"))
    }
}

/// A shell command line, split on whitespace.
///
/// `{lang}` in any argument is replaced by the language hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self, lang: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args.iter().map(|arg| arg.replace("{lang}", lang)));
        command
    }

    /// Run with `input` on stdin, discarding output
    async fn pipe(&self, input: &str, lang: &str) -> Result<()> {
        debug!("Running `{}`", self.display());
        let mut child = self
            .command(lang)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.error(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|e| self.error(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.error(e.to_string()))?;
        if !output.status.success() {
            return Err(self.error(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        Ok(())
    }

    /// Run and capture trimmed stdout
    async fn capture(&self, lang: &str) -> Result<String> {
        debug!("Running `{}`", self.display());
        let output = self
            .command(lang)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.error(e.to_string()))?;
        if !output.status.success() {
            return Err(self.error(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn error(&self, message: String) -> TranslationError {
        TranslationError::CommandError {
            command: self.display(),
            message,
        }
    }
}

/// Host backed by external commands, e.g. `espeak-ng -v {lang}` for speech
/// or `wl-copy` for the clipboard. Without a clipboard command the native
/// clipboard is used when enabled; other unconfigured capabilities are
/// unsupported.
#[derive(Debug, Clone, Default)]
pub struct CommandHost {
    pub speech_input: Option<CommandSpec>,
    pub speech_output: Option<CommandSpec>,
    pub clipboard: Option<CommandSpec>,
    pub system_clipboard: bool,
    pub share: Option<CommandSpec>,
}

impl CommandHost {
    pub fn from_config(config: &TranslatorConfig) -> Self {
        let parse = |line: &Option<String>| line.as_deref().and_then(CommandSpec::parse);
        Self {
            speech_input: parse(&config.speech_input_command),
            speech_output: parse(&config.speech_output_command),
            clipboard: parse(&config.clipboard_command),
            system_clipboard: config.system_clipboard && cfg!(feature = "system-clipboard"),
            share: parse(&config.share_command),
        }
    }

    fn require<'a>(spec: &'a Option<CommandSpec>, capability: &str) -> Result<&'a CommandSpec> {
        spec.as_ref().ok_or_else(|| TranslationError::unsupported(capability))
    }
}

/// Copy through the native clipboard on a blocking thread
#[cfg(feature = "system-clipboard")]
async fn copy_to_system_clipboard(text: &str) -> Result<()> {
    use cli_clipboard::{ClipboardContext, ClipboardProvider};

    let text = text.to_string();
    let copied = tokio::task::spawn_blocking(move || {
        ClipboardContext::new()
            .and_then(|mut ctx| ctx.set_contents(text))
            .map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| TranslationError::InternalError(e.to_string()))?;

    copied.map_err(|message| TranslationError::CommandError {
        command: "system clipboard".to_string(),
        message,
    })
}

#[cfg(not(feature = "system-clipboard"))]
async fn copy_to_system_clipboard(_text: &str) -> Result<()> {
    Err(TranslationError::unsupported("Clipboard"))
}

#[async_trait]
impl HostCapabilities for CommandHost {
    fn supports_speech_input(&self) -> bool {
        self.speech_input.is_some()
    }

    async fn recognize_once(&self, lang: &str) -> Result<Option<String>> {
        let transcript = Self::require(&self.speech_input, "Speech input")?
            .capture(lang)
            .await?;
        Ok(Some(transcript).filter(|t| !t.is_empty()))
    }

    fn supports_speech_output(&self) -> bool {
        self.speech_output.is_some()
    }

    async fn speak(&self, text: &str, lang_hint: &str) -> Result<()> {
        Self::require(&self.speech_output, "Speech output")?
            .pipe(text, lang_hint)
            .await
    }

    fn supports_clipboard(&self) -> bool {
        self.clipboard.is_some() || self.system_clipboard
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        match &self.clipboard {
            Some(command) => command.pipe(text, "").await,
            None if self.system_clipboard => copy_to_system_clipboard(text).await,
            None => Err(TranslationError::unsupported("Clipboard")),
        }
    }

    fn supports_share(&self) -> bool {
        self.share.is_some()
    }

    async fn share(&self, text: &str) -> Result<()> {
        Self::require(&self.share, "Share")?.pipe(text, "").await
    }
}

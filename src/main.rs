//! Main entry point for the Translator Pro CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use translator_pro::cli::commands::{self, Commands};
use translator_pro::cli::interactive;
use translator_pro::TranslatorConfig;

/// Translator Pro - translate, speak, copy and export text from the terminal
#[derive(Parser, Debug)]
#[command(name = "translator-pro", version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to TRANSLATOR_CONFIG or the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for history and counter (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep history in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("translator_pro={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = TranslatorConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }
    let data_dir = (!args.ephemeral).then(|| config.resolved_data_dir());

    match args.command {
        Some(Commands::Translate {
            text,
            from,
            to,
            copy,
            speak,
            export,
        }) => {
            let session = commands::build_session(&config, args.ephemeral).await?;
            commands::handle_translate(&session, text, from, to, copy, speak, export).await?;
        }
        Some(Commands::History { json, show }) => {
            let session = commands::build_session(&config, args.ephemeral).await?;
            commands::handle_history(&session, json, show).await?;
        }
        Some(Commands::Languages) => {
            commands::handle_languages().await?;
        }
        Some(Commands::Stats) => {
            let session = commands::build_session(&config, args.ephemeral).await?;
            commands::handle_stats(&session, data_dir).await?;
        }
        Some(Commands::Interactive { auto }) => {
            if auto {
                config.auto_translate = true;
            }
            let session = commands::build_session(&config, args.ephemeral).await?;
            interactive::run(session).await?;
        }
        None => {
            let session = commands::build_session(&config, args.ephemeral).await?;
            interactive::run(session).await?;
        }
    }

    Ok(())
}

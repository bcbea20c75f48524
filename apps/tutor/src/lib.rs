pub mod ai;
pub mod cli;
pub mod config;
pub mod db;
pub mod session;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::fs;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vocab_core::parser;
use vocab_core::types::Profile;

use crate::ai::AiClient;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::db::{NewTerm, ProfileRepository, ProgressRepository, SqliteRepository, TermRepository};
use crate::session::SessionController;

/// Log to stderr so prompts on stdout stay readable.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing();

    // Ensure data directory exists
    if let Some(parent) = config.db_path.parent() {
        fs::create_dir_all(parent).ok();
    }

    tracing::info!(path = %config.db_path.display(), "opening database");
    let repository = SqliteRepository::open(&config.db_path)
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;

    match cli.command {
        Command::Add {
            term,
            definition,
            context,
        } => {
            let item = repository.add_term(
                &NewTerm {
                    content: term,
                    definition,
                    context,
                },
                Utc::now(),
            )?;
            println!("Added \"{}\" (id {}).", item.content, item.id);
        }

        Command::Import { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let terms = parser::parse(&content)?;
            let ids = repository.import_terms(&terms, Utc::now())?;
            println!("Imported {} terms from {}.", ids.len(), file.display());
        }

        Command::Study { mode, quiz_type } => {
            let profile = repository.get_profile()?;
            let preferred = quiz_type
                .map(Into::into)
                .or_else(|| profile.and_then(|p| p.preferred_quiz_type));

            let store = Arc::new(Mutex::new(repository));
            let oracle = AiClient::new(&config.ai);
            let mut controller =
                SessionController::new(store, oracle, config.batch_size, config.language.clone());

            let mut input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut output = std::io::stdout();
            cli::run_study(&mut controller, mode.into(), preferred, &mut input, &mut output)
                .await?;
        }

        Command::Profile {
            language,
            quiz_type,
        } => {
            let mut profile = repository.get_profile()?.unwrap_or_else(|| Profile {
                language: config.language.clone(),
                ..Profile::default()
            });
            if language.is_some() || quiz_type.is_some() {
                if let Some(language) = language {
                    profile.language = language;
                }
                if let Some(quiz_type) = quiz_type {
                    profile.preferred_quiz_type = Some(quiz_type.into());
                }
                repository.save_profile(&profile)?;
            }

            println!("XP: {}", profile.xp);
            println!("Language: {}", profile.language);
            if let Some(quiz_type) = profile.preferred_quiz_type {
                println!("Preferred quiz type: {}", quiz_type.as_str());
            }
            println!("Terms: {}", repository.count_terms()?);
            println!("Due now: {}", repository.count_due(Utc::now())?);
        }
    }

    Ok(())
}

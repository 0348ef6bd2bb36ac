//! Main entry point for the Simple Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv_override;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simple_translator::cli::commands::{self, Commands, DEFAULT_HOST, DEFAULT_PORT};

/// Simple Translator - web UI and CLI over LLM chat APIs
#[derive(Parser, Debug)]
#[command(name = "simple-translator", version, about, long_about = None)]
struct Args {
    /// OpenAI API key; takes precedence over secrets, OPENAI_API_KEY and API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables, .env wins over the inherited environment
    dotenv_override().ok();

    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("simple_translator={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.command {
        Some(Commands::Server {
            host,
            port,
            provider,
        }) => {
            commands::handle_server(host, port, provider, args.api_key).await?;
        }
        Some(Commands::Translate {
            text,
            source_lang,
            target_lang,
            model,
            provider,
        }) => {
            commands::handle_translate(
                text,
                source_lang,
                target_lang,
                model,
                provider,
                args.api_key,
            )
            .await?;
        }
        Some(Commands::Task {
            task,
            text,
            source_lang,
            target_lang,
            model,
            provider,
        }) => {
            commands::handle_task(
                task,
                text,
                source_lang,
                target_lang,
                model,
                provider,
                args.api_key,
            )
            .await?;
        }
        Some(Commands::Prompt {
            task,
            text,
            source_lang,
            target_lang,
        }) => {
            commands::handle_prompt(task, text, source_lang, target_lang)?;
        }
        Some(Commands::Providers) => commands::handle_providers(),
        Some(Commands::Tasks) => commands::handle_tasks(),
        None => {
            commands::handle_server(DEFAULT_HOST.to_string(), DEFAULT_PORT, None, args.api_key)
                .await?;
        }
    }

    Ok(())
}

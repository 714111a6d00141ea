mod chat;
mod cli;
mod commands;
mod setup;

use std::process::ExitCode;

use prism_ai::{GeminiClient, MediaKind};
use prism_common::PrismError;
use prism_config::PrismConfig;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use cli::{Args, Command};

fn init_logging(directive: &str) {
    let mut filter = EnvFilter::from_default_env();
    match directive.parse::<Directive>() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(_) => {
            if let Ok(fallback) = "prism=info".parse::<Directive>() {
                filter = filter.add_directive(fallback);
            }
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args, config: PrismConfig) -> Result<(), PrismError> {
    let command = args.command.unwrap_or(Command::Chat { system: None });
    if matches!(command, Command::Config) {
        println!("{}", prism_config::config_to_json(&config));
        return Ok(());
    }

    let client = GeminiClient::new(setup::gemini_config(&config.gemini))?;
    let policy = setup::media_policy(&config.media);

    match command {
        Command::Chat { system } => {
            let instruction = system
                .as_deref()
                .or_else(|| config.chat.system_instruction());
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            chat::run(client, instruction, stdin).await
        }
        Command::DescribeImage { file, prompt } => {
            commands::describe(&client, &policy, MediaKind::Image, &file, prompt.as_deref()).await
        }
        Command::DescribeVideo { file, prompt } => {
            commands::describe(&client, &policy, MediaKind::Video, &file, prompt.as_deref()).await
        }
        Command::Imagine {
            prompt,
            count,
            out_dir,
        } => commands::imagine(&client, &config.images, &prompt, count, &out_dir)
            .await
            .map(|_| ()),
        Command::Search { query } => commands::search(&client, &query).await,
        Command::Config => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file before anything reads the environment
    setup::load_dotenv();

    let args = cli::parse();

    // The config picks the default log level, so logging starts after it
    let loaded = prism_config::load_config(args.config.as_deref());
    let level = loaded
        .as_ref()
        .map(|config| config.logging.level)
        .unwrap_or_default();
    init_logging(args.log_level.as_deref().unwrap_or(level.directive()));

    tracing::info!("Prism v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        PrismConfig::default()
    });

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

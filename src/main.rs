//! SDLC Assistant - phase-aware development chatbot with feedback analytics.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sdlc_assistant::ai::{AiClient, AiError};
use sdlc_assistant::config::{AppConfig, ConfigError, ConfigLoader};
use sdlc_assistant::conversation::{ChatSession, ConversationEngine, Phase};
use sdlc_assistant::display;
use sdlc_assistant::feedback::{FeedbackError, FeedbackStore, NewFeedback};
use sdlc_assistant::server::{AppState, AssistantServer, ServerError};

#[derive(Parser)]
#[command(
    name = "sdlc-assistant",
    about = "Phase-aware SDLC assistant with feedback analytics",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a config file instead of the default search paths.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant in the terminal.
    Chat,
    /// Serve the HTTP API.
    Serve {
        /// Host address to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Submit, inspect, and export feedback.
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,
    },
}

#[derive(Subcommand)]
enum FeedbackAction {
    /// Record a rating for a module's output.
    Submit {
        /// Module that produced the output.
        module: String,
        /// Rating from 1 to 5.
        #[arg(short, long)]
        rating: i64,
        /// positive, negative, or suggestion.
        #[arg(short = 't', long = "type")]
        feedback_type: String,
        #[arg(short, long, default_value = "cli")]
        user: String,
        #[arg(long, default_value = "")]
        comment: String,
        #[arg(long, default_value = "")]
        input: String,
        #[arg(long, default_value = "")]
        output: String,
        #[arg(long)]
        suggestion: Option<String>,
    },
    /// List a module's feedback, newest first.
    List { module: String },
    /// Show analytics for one module, or all modules.
    Stats { module: Option<String> },
    /// Export feedback to a JSON file.
    Export {
        /// Module to export; all modules when omitted.
        module: Option<String>,
        /// Output directory; defaults to the configured export directory.
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn build_engine(config: &AppConfig) -> Result<(ConversationEngine, AiClient), CliError> {
    let client = AiClient::from_config(config.ai.clone())?;
    let engine = ConversationEngine::new(Arc::new(client.clone()), config.generation);
    Ok((engine, client))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = loader.load()?;

    match cli.command {
        Commands::Chat => run_chat(&config).await,
        Commands::Serve { host, port } => run_serve(config, host, port).await,
        Commands::Feedback { action } => run_feedback(&config, action).await,
    }
}

async fn run_chat(config: &AppConfig) -> Result<(), CliError> {
    let (engine, client) = build_engine(config)?;
    let mut session = ChatSession::new();
    display::print_banner(&format!("{:?}", client.provider_kind()), client.model());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        display::print_prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line.split_once(' ').map_or((line, ""), |(cmd, arg)| (cmd, arg.trim())) {
            ("/quit" | "/exit", _) => break,
            ("/clear", _) => {
                session.clear();
                display::print_info("Conversation cleared");
            }
            ("/phase", name) => match name.parse::<Phase>() {
                Ok(phase) => display::print_suggestions(&engine.phase_suggestions(phase)),
                Err(e) => display::print_error(&e.to_string()),
            },
            ("/export", target) => {
                let path = if target.is_empty() {
                    config.feedback.export_dir.join(format!(
                        "conversation_{}.json",
                        Local::now().format("%Y%m%d_%H%M%S")
                    ))
                } else {
                    PathBuf::from(target)
                };
                match session.history.save(&path).await {
                    Ok(()) => {
                        display::print_info(&format!("History written to {}", path.display()));
                    }
                    Err(e) => display::print_error(&format!("Could not export history: {e}")),
                }
            }
            _ => {
                let update = engine.submit(&mut session, line).await;
                if let Some(reply) = update.response {
                    display::print_reply(&reply, session.context.current_phase);
                }
            }
        }
    }

    Ok(())
}

async fn run_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), CliError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let (engine, _client) = build_engine(&config)?;
    let store = FeedbackStore::open(&config.feedback.database).await?;
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C");
        }
        signal_cancel.cancel();
    });

    let state = AppState::new(engine, store, config.feedback.export_dir.clone(), cancel);
    AssistantServer::new(state)
        .with_config(config.server)
        .run()
        .await?;
    Ok(())
}

async fn run_feedback(config: &AppConfig, action: FeedbackAction) -> Result<(), CliError> {
    let store = FeedbackStore::open(&config.feedback.database).await?;

    match action {
        FeedbackAction::Submit {
            module,
            rating,
            feedback_type,
            user,
            comment,
            input,
            output,
            suggestion,
        } => {
            let mut feedback = NewFeedback::new(user, module, rating, feedback_type)
                .comment(comment)
                .input_text(input)
                .ai_output(output);
            if let Some(suggestion) = suggestion {
                feedback = feedback.improvement_suggestion(suggestion);
            }
            let record = store.record(feedback).await?;
            display::print_info(&format!("Recorded feedback {}", record.feedback_id));
            if let Some(analytics) = store.get_analytics(&record.module_name).await? {
                display::print_analytics(&analytics);
            }
        }
        FeedbackAction::List { module } => {
            let records = store.query_by_module(&module).await?;
            if records.is_empty() {
                display::print_info(&format!("No feedback for {module}"));
            }
            for record in &records {
                display::print_feedback_record(record);
            }
        }
        FeedbackAction::Stats { module: Some(module) } => {
            match store.get_analytics(&module).await? {
                Some(analytics) => display::print_analytics(&analytics),
                None => display::print_info(&format!("No feedback data for {module}")),
            }
        }
        FeedbackAction::Stats { module: None } => {
            let all = store.list_analytics().await?;
            if all.is_empty() {
                display::print_info("No feedback data");
            }
            for analytics in &all {
                display::print_analytics(analytics);
            }
        }
        FeedbackAction::Export { module, dir } => {
            let dir = dir.unwrap_or_else(|| config.feedback.export_dir.clone());
            let path = store.export(module.as_deref(), &dir).await?;
            display::print_info(&format!("Exported to {}", path.display()));
        }
    }

    Ok(())
}

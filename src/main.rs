use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chore_bot::api::{self, AppState, WebhookAuth};
use chore_bot::bot::{format, Bot, SharedMessenger};
use chore_bot::config::Config;
use chore_bot::db::Database;
use chore_bot::scheduler::Scheduler;
use chore_bot::telegram::{self, TelegramClient};

#[derive(Parser)]
#[command(name = "chore-bot")]
#[command(about = "Household chore tracker for Telegram group chats")]
struct Cli {
    /// SQLite database path (overrides CHORE_BOT_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Long-poll Telegram for updates and run the reminder timer
    Run,
    /// Receive updates on a webhook and run the reminder timer
    Serve {
        /// Port for the webhook server
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// Print today's digest to stdout
    Digest,
    /// Apply database migrations and exit
    Migrate,
}

/// Initialize tracing with output to stderr (for the digest command) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "chore_bot=info,tower_http=info".into()),
    );

    if use_stderr {
        // Digest mode: stdout carries the digest itself
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_database(cli_path: Option<PathBuf>, config: &Config) -> anyhow::Result<Database> {
    let db = match cli_path.or_else(|| config.db_path.clone()) {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

/// Start the reminder timer if a household chat is configured.
fn start_scheduler(db: &Database, messenger: SharedMessenger, config: &Config) {
    match config.chat_id {
        Some(chat_id) => {
            Scheduler::new(db.clone(), messenger, chat_id, config.digest_hour_utc).run();
        }
        None => tracing::warn!("CHAT_ID is not set; reminders and the daily digest are disabled"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, Some(Commands::Digest));
    init_tracing(use_stderr);

    let config = Config::from_env()?;
    let db = open_database(cli.db, &config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let client = TelegramClient::new(&config.api_url, config.require_token()?);
            start_scheduler(&db, Arc::new(client.clone()), &config);

            tokio::select! {
                _ = telegram::run_polling(Bot::new(db), client) => {}
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
            }
        }
        Commands::Serve { port } => {
            let client = TelegramClient::new(&config.api_url, config.require_token()?);
            let messenger: SharedMessenger = Arc::new(client);
            start_scheduler(&db, messenger.clone(), &config);

            let auth = match &config.webhook_secret {
                Some(secret) => WebhookAuth::with_secret(secret.clone()),
                None => {
                    tracing::warn!("WEBHOOK_SECRET is not set; webhook calls are not authenticated");
                    WebhookAuth::disabled()
                }
            };
            let app = api::create_router(
                AppState {
                    bot: Bot::new(db),
                    messenger,
                },
                auth,
            );

            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
            tracing::info!("Webhook server listening on http://0.0.0.0:{}", port);

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("Shutting down");
                })
                .await?;
        }
        Commands::Digest => {
            let today = Local::now().date_naive();
            println!("{}", format::digest(&db.list_chores()?, today));
        }
        Commands::Migrate => {
            tracing::info!("Database is up to date");
        }
    }

    Ok(())
}

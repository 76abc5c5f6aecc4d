use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use opsdesk::chat::{MessageStatus, OptimisticMessageStore};
use opsdesk::config::{ConfigError, StoreConfig};
use opsdesk::store::{PgRecordStore, StoreError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum TailError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("record store: {0}")]
    Store(#[from] StoreError),
}

#[derive(Parser, Debug)]
#[command(name = "chat-tail", about = "Print a chat channel's history and follow new messages")]
struct Cli {
    /// Channel to follow.
    channel: String,

    /// Post one message before following.
    #[arg(long)]
    send: Option<String>,

    /// Sender id used with `--send`.
    #[arg(long, env = "CHAT_SENDER_ID", default_value_t = 0)]
    sender_id: i64,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "chat-tail failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), TailError> {
    let config = StoreConfig::from_env()?;
    let remote = PgRecordStore::connect(&config).await?;
    let chat = OptimisticMessageStore::new(Arc::new(remote));

    let mut changes = chat.changes();
    let history = chat.switch_channel(&cli.channel).await?;
    for message in &history {
        println!("{message}");
    }
    let mut printed = history.len();

    if let Some(text) = cli.send {
        let pending = chat.send(&cli.channel, cli.sender_id, text);
        let id = pending.id().to_owned();
        match pending.resolved().await {
            MessageStatus::Sent => info!(%id, "message sent"),
            status => warn!(%id, status = status.as_str(), "message not sent"),
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let messages = chat.messages();
                // The list only grows while one channel is followed; status
                // changes on already-printed lines are not re-printed.
                for message in messages.iter().skip(printed) {
                    println!("{message}");
                }
                printed = printed.max(messages.len());
            }
        }
    }

    chat.unsubscribe();
    Ok(())
}

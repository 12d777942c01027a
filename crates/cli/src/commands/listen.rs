//! Listen command handler.
//!
//! Stand-in transport: reads one JSON `ChatMessage` per line from stdin and
//! writes one JSON reply per answered message to stdout. Messages go through
//! per-chat queues, so each chat's replies keep arrival order; ignored
//! messages produce no output.

use chrono::Utc;
use clap::Args;
use docsbot::{AnswerService, ChatMessage, Dispatched, Dispatcher, PipelineOutcome};
use docsbot_core::{config::AppConfig, AppResult};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// Answer chat messages read as JSON lines from stdin
#[derive(Args, Debug)]
pub struct ListenCommand {
    /// Override the group chat trigger token
    #[arg(long, env = "DOCSBOT_TRIGGER_TOKEN")]
    pub trigger: Option<String>,
}

/// One line of output.
#[derive(Debug, Serialize)]
struct ReplyLine {
    chat_id: i64,
    reply: String,
    ok: bool,
    replied_at: String,
}

impl ListenCommand {
    /// Execute the listen command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut config = config.clone();
        if let Some(ref trigger) = self.trigger {
            config.bot.trigger_token = trigger.clone();
        }

        let service = AnswerService::init(&config).await?;
        tracing::info!("Listening for messages on stdin");

        let (tx, mut rx) = mpsc::unbounded_channel::<Dispatched>();
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(Dispatched { chat_id, outcome }) = rx.recv().await {
                let (reply, ok) = match outcome {
                    PipelineOutcome::Ignored => continue,
                    PipelineOutcome::Replied(reply) => (reply, true),
                    PipelineOutcome::Failed { reply, .. } => (reply, false),
                };
                let line = ReplyLine {
                    chat_id,
                    reply,
                    ok,
                    replied_at: Utc::now().to_rfc3339(),
                };

                let mut json = match serde_json::to_string(&line) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to encode reply: {}", e);
                        continue;
                    }
                };
                json.push('\n');
                if let Err(e) = stdout.write_all(json.as_bytes()).await {
                    tracing::error!("Failed to write reply: {}", e);
                    break;
                }
                let _ = stdout.flush().await;
            }
        });

        let mut dispatcher = Dispatcher::new(service.clone(), tx);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let message: ChatMessage = match serde_json::from_str(&line) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("Skipping malformed message: {}", e);
                    continue;
                }
            };

            dispatcher.dispatch(message);
            dispatcher.reap();
        }

        tracing::info!(
            "Input closed, waiting for {} chat workers",
            dispatcher.worker_count()
        );
        // drops the last outcome sender once workers are done
        dispatcher.finish().await;
        let _ = writer.await;

        tracing::info!("Handled {} chats", service.session_count().await);
        service.shutdown().await;
        Ok(())
    }
}

//! Ask command handler.
//!
//! Answers one question as if it arrived in a private chat.

use clap::Args;
use docsbot::{AnswerService, ChatMessage, PipelineOutcome};
use docsbot_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

/// Ask a single question against the corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let question = self.get_question()?;
        let service = AnswerService::init(config).await?;
        let outcome = service.handle(ChatMessage::private(question)).await;
        service.shutdown().await;

        match outcome {
            PipelineOutcome::Replied(reply) => {
                self.print(&reply, true)?;
                Ok(())
            }
            PipelineOutcome::Failed { reply, error } => {
                self.print(&reply, false)?;
                Err(error)
            }
            PipelineOutcome::Ignored => Ok(()),
        }
    }

    fn get_question(&self) -> AppResult<String> {
        if let Some(ref path) = self.file {
            return std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Failed to read question file {:?}: {}", path, e))
            });
        }

        self.question
            .clone()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| AppError::Config("No question provided".to_string()))
    }

    fn print(&self, reply: &str, ok: bool) -> AppResult<()> {
        if self.json {
            let output = serde_json::json!({ "ok": ok, "reply": reply });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", reply);
        }
        Ok(())
    }
}

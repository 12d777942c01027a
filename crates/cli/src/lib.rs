//! docsbot: answers documentation questions from chat messages.
//!
//! A message passes the [`gate`], then the [`pipeline`] retrieves relevant
//! chunks from the corpus, asks the model for a grounded answer and formats a
//! reply citing the most relevant source.

pub mod dispatch;
pub mod gate;
pub mod message;
pub mod pipeline;
pub mod reply;
pub mod session;

#[cfg(test)]
mod tests;

// Re-export main types
pub use dispatch::{Dispatched, Dispatcher};
pub use gate::{decide, GateDecision};
pub use message::{ChatMessage, ChatType};
pub use pipeline::{AnswerService, PipelineOutcome, PipelineStage, ServiceParts};
pub use reply::{format_reply, GeneratedAnswer, FAILURE_REPLY};
pub use session::{ChatSession, SessionRegistry};

//! Command handlers for the docsbot CLI.

pub mod ask;
pub mod listen;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use listen::ListenCommand;

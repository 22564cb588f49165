//! Chat side of the sync engine — message history and the assistant turn.

pub mod engine;
pub mod model;

pub use engine::{ConversationEngine, TurnOutcome};
pub use model::{
    Conversation, ConversationMessage, ConversationStatus, PendingTurn, Role, greeting,
};

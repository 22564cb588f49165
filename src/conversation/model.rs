//! Conversation data model — message history and turn state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Mode;
use crate::error::ConversationError;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn user(text: &str) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: &str) -> Self {
        Self::new(Role::Assistant, text)
    }

    fn new(role: Role, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Opening assistant message for a mode.
pub fn greeting(mode: Mode) -> &'static str {
    match mode {
        Mode::Rfp => {
            "¡Hola! Cuéntame qué necesitas: qué problema quieres resolver con IA, en qué \
             sector y con qué presupuesto. Iré rellenando la solicitud por ti."
        }
        Mode::Listing => {
            "¡Hola! Descríbeme tu solución de IA: qué hace, a qué sectores se dirige y cómo \
             la comercializas. Iré completando la ficha por ti."
        }
    }
}

/// Whether the chat input is open.
///
/// Progresses: Idle → AwaitingReply → Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Idle,
    AwaitingReply,
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingReply => "awaiting_reply",
        };
        write!(f, "{s}")
    }
}

/// The utterance waiting for its assistant turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    /// Monotonic per conversation; survives resets so a stale timer can
    /// never match a newer turn.
    pub turn: u64,
    pub utterance: String,
}

/// Append-only message history plus the single in-flight turn.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    pending: Option<PendingTurn>,
    turn_counter: u64,
}

impl Conversation {
    /// A conversation holding only the mode's greeting.
    pub fn new(mode: Mode) -> Self {
        Self {
            messages: vec![ConversationMessage::assistant(greeting(mode))],
            pending: None,
            turn_counter: 0,
        }
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn status(&self) -> ConversationStatus {
        if self.pending.is_some() {
            ConversationStatus::AwaitingReply
        } else {
            ConversationStatus::Idle
        }
    }

    pub fn pending(&self) -> Option<&PendingTurn> {
        self.pending.as_ref()
    }

    /// Accept a user utterance and open a turn.
    ///
    /// Rejected (nothing appended) when the text is blank or another turn
    /// is still waiting for its reply.
    pub fn begin_turn(&mut self, text: &str) -> Result<(u64, ConversationMessage), ConversationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyUtterance);
        }
        if self.pending.is_some() {
            return Err(ConversationError::ReplyPending);
        }

        self.turn_counter += 1;
        let turn = self.turn_counter;
        let message = ConversationMessage::user(text);
        self.messages.push(message.clone());
        self.pending = Some(PendingTurn {
            turn,
            utterance: text.to_string(),
        });
        Ok((turn, message))
    }

    /// Close turn `turn`, handing back its utterance.
    ///
    /// Returns `None` when `turn` is not the open turn (stale timer).
    pub fn take_pending(&mut self, turn: u64) -> Option<PendingTurn> {
        match &self.pending {
            Some(p) if p.turn == turn => self.pending.take(),
            _ => None,
        }
    }

    /// Close the open turn without a reply. The user message stays.
    pub fn abandon_pending(&mut self) -> Option<PendingTurn> {
        self.pending.take()
    }

    /// Append the assistant's reply.
    pub fn push_reply(&mut self, text: &str) -> ConversationMessage {
        let message = ConversationMessage::assistant(text);
        self.messages.push(message.clone());
        message
    }

    /// Back to the greeting-only state. Any open turn is dropped.
    pub fn reset(&mut self, mode: Mode) {
        self.messages = vec![ConversationMessage::assistant(greeting(mode))];
        self.pending = None;
    }
}

//! Error types for Listing Assist.

use crate::document::RequiredField;
use crate::wizard::WizardStep;

/// Top-level error type for the sync engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    #[error("Submit error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Key-value storage errors.
///
/// Never surfaced to the user: the snapshot store logs them and the session
/// keeps running in memory.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Read failed for key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Write failed for key {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the form view's direct field setters.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {field} is a {expected} field")]
    WrongFieldKind {
        field: String,
        expected: &'static str,
    },

    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: String, value: String },
}

/// Chat-side rejections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversationError {
    #[error("Utterance is empty")]
    EmptyUtterance,

    #[error("Assistant reply still pending")]
    ReplyPending,
}

/// Errors returned from the submit action.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Missing required fields: {}", display_fields(.missing))]
    Validation { missing: Vec<RequiredField> },

    #[error("Submit is only available on the last step (currently on {step})")]
    NotOnFinalStep { step: WizardStep },

    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// Failures reported by the publish collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Publish rejected: {0}")]
    Rejected(String),

    #[error("Publish transport failed: {0}")]
    Transport(String),
}

fn display_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for the sync engine.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn begin(pending: bool) -> std::result::Result<(), ConversationError> {
        if pending {
            return Err(ConversationError::ReplyPending);
        }
        Ok(())
    }

    fn reply(pending: bool) -> Result<&'static str> {
        begin(pending)?;
        Ok("ok")
    }

    fn reject_submit() -> Result<()> {
        let missing = vec![RequiredField::Title, RequiredField::Sectors];
        Err(SubmitError::Validation { missing }.into())
    }

    #[test]
    fn concern_errors_convert_into_top_level() {
        assert_eq!(reply(false).unwrap(), "ok");
        assert!(matches!(
            reply(true),
            Err(Error::Conversation(ConversationError::ReplyPending))
        ));

        let err = reject_submit().unwrap_err();
        assert!(matches!(err, Error::Submit(SubmitError::Validation { .. })));
        assert_eq!(
            err.to_string(),
            "Submit error: Missing required fields: title, sectors"
        );
    }

    #[test]
    fn publish_error_nests_under_submit() {
        let err: Error = SubmitError::from(PublishError::Transport("offline".into())).into();
        assert_eq!(
            err.to_string(),
            "Submit error: Publish failed: Publish transport failed: offline"
        );
    }
}

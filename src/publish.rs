//! Publish collaborator — where a finalized document goes on submit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::document::{FormDocument, Mode};
use crate::error::PublishError;

/// Acknowledgement returned by a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub id: Uuid,
    pub mode: Mode,
    pub published_at: DateTime<Utc>,
}

impl PublishReceipt {
    pub fn new(mode: Mode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            published_at: Utc::now(),
        }
    }
}

/// Receives validated documents.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        document: &FormDocument,
        mode: Mode,
    ) -> Result<PublishReceipt, PublishError>;
}

/// Publisher that only logs the finalized document.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(
        &self,
        document: &FormDocument,
        mode: Mode,
    ) -> Result<PublishReceipt, PublishError> {
        let payload = serde_json::to_string(document)
            .map_err(|e| PublishError::Rejected(format!("document not serializable: {e}")))?;
        let receipt = PublishReceipt::new(mode);
        info!(
            id = %receipt.id,
            mode = %mode,
            title = %document.title,
            payload = %payload,
            "Document published"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_publisher_returns_receipt() {
        let mut doc = FormDocument::new();
        doc.title = "Chatbot".into();
        let receipt = LogPublisher.publish(&doc, Mode::Listing).await.unwrap();
        assert_eq!(receipt.mode, Mode::Listing);
        assert!(receipt.published_at <= Utc::now());
    }

    #[test]
    fn receipt_wire_names() {
        let receipt = PublishReceipt::new(Mode::Rfp);
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["mode"], "rfp");
        assert!(value.get("publishedAt").is_some());
    }
}

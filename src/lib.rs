//! Listing Assist — form/chat sync engine for AI solution listings and RFPs.

pub mod config;
pub mod conversation;
pub mod document;
pub mod error;
pub mod extraction;
pub mod publish;
pub mod store;
pub mod sync;
pub mod wizard;

pub use sync::{ChangeSource, DocumentSync, SyncDeps, SyncEvent};

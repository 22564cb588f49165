//! Free-text extraction.
//!
//! Deterministic keyword matching only: an utterance runs through an ordered
//! rule table and comes out as a [`FormPatch`](crate::document::FormPatch)
//! plus the assistant's reply text.

pub mod rules;

pub use rules::{
    CLOSING_PROMPT, ExtractionRule, Extraction, FALLBACK_REPLY, Fragment, RuleInput, RulesEngine,
};

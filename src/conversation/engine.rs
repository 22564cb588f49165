//! ConversationEngine — simulated assistant latency and the assistant turn.
//!
//! A user utterance opens a turn on the [`Conversation`]; the engine then
//! schedules exactly one deferred reply. When it fires, the reply runs the
//! rules engine, merges the patch into the document and appends the
//! assistant message in one step. The deferred task is kept so teardown can
//! abort it before it touches a discarded document.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::SyncConfig;
use crate::document::FormDocument;
use crate::extraction::{Extraction, RulesEngine};

use super::model::{Conversation, ConversationMessage};

/// Result of a completed assistant turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub extraction: Extraction,
    pub reply: ConversationMessage,
}

/// Drives assistant turns for one session.
pub struct ConversationEngine {
    rules: RulesEngine,
    base_delay: Duration,
    jitter: Duration,
    /// The single deferred reply, if one was scheduled.
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ConversationEngine {
    pub fn new(rules: RulesEngine, config: &SyncConfig) -> Self {
        Self {
            rules,
            base_delay: config.reply_base_delay,
            jitter: config.reply_jitter,
            pending: Mutex::new(None),
        }
    }

    pub fn rules(&self) -> &RulesEngine {
        &self.rules
    }

    /// Base delay plus a uniform random share of the jitter.
    pub fn reply_delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.base_delay + Duration::from_millis(extra)
    }

    /// Run `reply` once after the thinking delay.
    pub fn schedule<F>(&self, reply: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.reply_delay();
        debug!(delay_ms = delay.as_millis() as u64, "Scheduling assistant reply");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            reply.await;
        });

        if let Some(previous) = self.lock_pending().replace(handle) {
            previous.abort();
        }
    }

    /// Abort the deferred reply if it has not run yet.
    ///
    /// Returns `true` if a still-running task was cancelled.
    pub fn cancel_pending(&self) -> bool {
        match self.lock_pending().take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                debug!("Cancelled pending assistant reply");
                true
            }
            _ => false,
        }
    }

    /// Whether a deferred reply is scheduled and has not finished.
    pub fn has_pending(&self) -> bool {
        self.lock_pending()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Complete turn `turn`: extract from its utterance, merge into
    /// `document`, append the assistant reply.
    ///
    /// Returns `None` if `turn` is no longer the open turn.
    pub fn respond(
        &self,
        turn: u64,
        conversation: &mut Conversation,
        document: &mut FormDocument,
    ) -> Option<TurnOutcome> {
        let pending = conversation.take_pending(turn)?;

        let extraction = self.rules.extract(&pending.utterance, document);
        document.apply(&extraction.update);
        let reply = conversation.push_reply(&extraction.reply);

        debug!(
            turn,
            fired = ?extraction.fired,
            "Assistant turn completed"
        );

        Some(TurnOutcome { extraction, reply })
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ConversationEngine {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::conversation::model::{ConversationStatus, Role};
    use crate::document::{AppType, Mode};

    fn engine_with_delay(base_ms: u64, jitter_ms: u64) -> ConversationEngine {
        let config = SyncConfig {
            reply_base_delay: Duration::from_millis(base_ms),
            reply_jitter: Duration::from_millis(jitter_ms),
            ..SyncConfig::default()
        };
        ConversationEngine::new(RulesEngine::default_rules(), &config)
    }

    #[test]
    fn reply_delay_within_bounds() {
        let engine = engine_with_delay(800, 700);
        for _ in 0..50 {
            let delay = engine.reply_delay();
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn zero_jitter_is_exact() {
        let engine = engine_with_delay(250, 0);
        assert_eq!(engine.reply_delay(), Duration::from_millis(250));
    }

    #[test]
    fn respond_merges_and_appends() {
        let engine = engine_with_delay(0, 0);
        let mut conv = Conversation::new(Mode::Rfp);
        let mut doc = FormDocument::default();

        let (turn, _) = conv.begin_turn("un chatbot para banca").unwrap();
        let outcome = engine.respond(turn, &mut conv, &mut doc).unwrap();

        assert_eq!(doc.app_type, AppType::Chatbot);
        assert!(doc.sectors.contains("Banca"));
        assert_eq!(outcome.reply.role, Role::Assistant);
        assert_eq!(outcome.reply.text, outcome.extraction.reply);
        assert_eq!(conv.messages().len(), 3);
        assert_eq!(conv.status(), ConversationStatus::Idle);
    }

    #[test]
    fn respond_ignores_stale_turn() {
        let engine = engine_with_delay(0, 0);
        let mut conv = Conversation::new(Mode::Rfp);
        let mut doc = FormDocument::default();

        let (turn, _) = conv.begin_turn("un chatbot").unwrap();
        conv.reset(Mode::Rfp);

        assert!(engine.respond(turn, &mut conv, &mut doc).is_none());
        assert!(doc.is_pristine());
        assert_eq!(conv.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_reply_runs_after_delay() {
        let engine = engine_with_delay(1_000, 0);
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        engine.schedule(async move {
            flag.store(true, Ordering::SeqCst);
        });
        assert!(engine.has_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(fired.load(Ordering::SeqCst));
        assert!(!engine.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_reply_never_runs() {
        let engine = engine_with_delay(1_000, 0);
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        engine.schedule(async move {
            flag.store(true, Ordering::SeqCst);
        });
        assert!(engine.cancel_pending());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!fired.load(Ordering::SeqCst));
        assert!(!engine.cancel_pending());
    }
}

//! DocumentSync — one session shared by the form view and the chat view.
//!
//! Owns the document, the wizard and the conversation behind a single lock.
//! Every mutation from either view goes through here, is written through
//! to the snapshot store and is announced on a broadcast channel so all
//! views re-render from the same state.

use std::sync::{Arc, Weak};

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::conversation::{
    Conversation, ConversationEngine, ConversationMessage, ConversationStatus,
};
use crate::document::{FieldKey, FormDocument, Mode, RequiredField, ScalarField, SetField};
use crate::error::{ConversationError, DocumentError, SubmitError};
use crate::extraction::RulesEngine;
use crate::publish::{PublishReceipt, Publisher};
use crate::store::{KeyValueStore, SnapshotStore};
use crate::wizard::{Wizard, WizardStep};

/// Default broadcast channel capacity.
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Which view caused a document change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Form,
    Chat,
    Reset,
}

/// Notifications for views.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    DocumentChanged {
        fields: Vec<FieldKey>,
        source: ChangeSource,
    },
    StepChanged {
        step: WizardStep,
    },
    MessageAppended {
        message: ConversationMessage,
    },
    Submitted {
        receipt: PublishReceipt,
    },
    ConversationReset,
}

/// Collaborators injected into a session.
pub struct SyncDeps {
    pub store: Arc<dyn KeyValueStore>,
    pub publisher: Arc<dyn Publisher>,
    pub rules: RulesEngine,
    pub config: SyncConfig,
}

impl SyncDeps {
    /// Default rule table and config.
    pub fn new(store: Arc<dyn KeyValueStore>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            store,
            publisher,
            rules: RulesEngine::default_rules(),
            config: SyncConfig::default(),
        }
    }

    pub fn with_rules(mut self, rules: RulesEngine) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }
}

struct Session {
    document: FormDocument,
    wizard: Wizard,
    conversation: Conversation,
}

struct Inner {
    mode: Mode,
    state: RwLock<Session>,
    engine: ConversationEngine,
    snapshots: SnapshotStore,
    publisher: Arc<dyn Publisher>,
    events: broadcast::Sender<SyncEvent>,
}

/// Handle to a sync session. Cheap to clone; clones share the session.
///
/// Dropping the last handle cancels a pending assistant reply.
#[derive(Clone)]
pub struct DocumentSync {
    inner: Arc<Inner>,
}

impl DocumentSync {
    /// Open a session for `mode`, resuming the saved draft if there is one.
    pub async fn open(mode: Mode, deps: SyncDeps) -> Self {
        let snapshots = SnapshotStore::new(deps.store, deps.config.key_prefix.clone());

        let (document, wizard) = match snapshots.load(mode).await {
            Some(snapshot) => {
                info!(mode = %mode, step = snapshot.step.number(), "Resumed saved draft");
                (snapshot.form_data, Wizard::at(snapshot.step))
            }
            None => (FormDocument::new(), Wizard::new()),
        };

        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                mode,
                state: RwLock::new(Session {
                    document,
                    wizard,
                    conversation: Conversation::new(mode),
                }),
                engine: ConversationEngine::new(deps.rules, &deps.config),
                snapshots,
                publisher: deps.publisher,
                events,
            }),
        }
    }

    pub fn mode(&self) -> Mode {
        self.inner.mode
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub async fn document(&self) -> FormDocument {
        self.inner.state.read().await.document.clone()
    }

    pub async fn step(&self) -> WizardStep {
        self.inner.state.read().await.wizard.step()
    }

    pub async fn progress_percent(&self) -> u8 {
        self.inner.state.read().await.wizard.progress_percent()
    }

    pub async fn messages(&self) -> Vec<ConversationMessage> {
        self.inner.state.read().await.conversation.messages().to_vec()
    }

    pub async fn status(&self) -> ConversationStatus {
        self.inner.state.read().await.conversation.status()
    }

    /// Required fields still empty, in submit order.
    pub async fn missing_required(&self) -> Vec<RequiredField> {
        self.inner.state.read().await.document.missing_required()
    }

    pub async fn can_submit(&self) -> bool {
        let state = self.inner.state.read().await;
        state.wizard.can_submit(&state.document)
    }

    // ── Form view ──────────────────────────────────────────────────────

    pub async fn set_field(&self, field: ScalarField, value: &str) -> Result<(), DocumentError> {
        let mut state = self.inner.state.write().await;
        state.document.set_field(field, value)?;
        self.inner.persist(&state).await;
        self.inner.emit(SyncEvent::DocumentChanged {
            fields: vec![FieldKey::Scalar(field)],
            source: ChangeSource::Form,
        });
        Ok(())
    }

    /// Flip membership of `item` in a set field. Returns whether it is now
    /// a member; blank items are ignored.
    pub async fn toggle_set_member(&self, field: SetField, item: &str) -> bool {
        if item.trim().is_empty() {
            return false;
        }
        let mut state = self.inner.state.write().await;
        let member = state.document.toggle_set_member(field, item);
        self.inner.persist(&state).await;
        self.inner.emit(SyncEvent::DocumentChanged {
            fields: vec![FieldKey::Set(field)],
            source: ChangeSource::Form,
        });
        member
    }

    // ── Chat view ──────────────────────────────────────────────────────

    /// Append a user utterance and schedule the assistant's reply.
    ///
    /// Rejected with nothing appended if the text is blank or a reply is
    /// still pending.
    pub async fn submit_utterance(
        &self,
        text: &str,
    ) -> Result<ConversationMessage, ConversationError> {
        let mut state = self.inner.state.write().await;
        let (turn, message) = state.conversation.begin_turn(text)?;
        debug!(turn, "User utterance accepted");

        // scheduled under the lock so shutdown and submit see the task
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.engine.schedule(async move {
            if let Some(inner) = weak.upgrade() {
                inner.complete_turn(turn).await;
            }
        });
        self.inner.emit(SyncEvent::MessageAppended {
            message: message.clone(),
        });
        drop(state);
        Ok(message)
    }

    // ── Wizard ─────────────────────────────────────────────────────────

    /// Advance one step; no-op on the last step.
    pub async fn next(&self) -> WizardStep {
        self.navigate(Wizard::next).await
    }

    /// Go back one step; no-op on the first step.
    pub async fn prev(&self) -> WizardStep {
        self.navigate(Wizard::prev).await
    }

    async fn navigate(&self, step: fn(&mut Wizard) -> bool) -> WizardStep {
        let mut state = self.inner.state.write().await;
        let moved = step(&mut state.wizard);
        let current = state.wizard.step();
        if moved {
            self.inner.persist(&state).await;
            self.inner.emit(SyncEvent::StepChanged { step: current });
        }
        current
    }

    /// Validate, publish and start over.
    ///
    /// On any error nothing changes: document, step, conversation and the
    /// saved draft stay as they were.
    pub async fn submit(&self) -> Result<PublishReceipt, SubmitError> {
        let inner = &self.inner;
        let mut state = inner.state.write().await;

        if let Err(e) = state.wizard.validate_submit(&state.document) {
            info!(mode = %inner.mode, error = %e, "Submit rejected");
            return Err(e);
        }

        let receipt = match inner.publisher.publish(&state.document, inner.mode).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(mode = %inner.mode, error = %e, "Publish failed, keeping draft");
                return Err(e.into());
            }
        };

        if let Err(e) = inner.snapshots.clear(inner.mode).await {
            warn!(mode = %inner.mode, error = %e, "Failed to clear saved draft");
        }
        inner.engine.cancel_pending();

        state.document = FormDocument::new();
        state.wizard.reset();
        state.conversation.reset(inner.mode);
        drop(state);

        info!(mode = %inner.mode, id = %receipt.id, "Document submitted");

        inner.emit(SyncEvent::Submitted {
            receipt: receipt.clone(),
        });
        inner.emit(SyncEvent::DocumentChanged {
            fields: FieldKey::all().collect(),
            source: ChangeSource::Reset,
        });
        inner.emit(SyncEvent::StepChanged {
            step: WizardStep::FIRST,
        });
        inner.emit(SyncEvent::ConversationReset);

        Ok(receipt)
    }

    /// Cancel the pending assistant reply, if any. For view teardown.
    ///
    /// The unanswered utterance stays in the history but the turn is
    /// closed, so other handles can keep chatting.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.write().await;
        self.inner.engine.cancel_pending();
        if let Some(pending) = state.conversation.abandon_pending() {
            debug!(
                mode = %self.inner.mode,
                turn = pending.turn,
                "Session shut down with reply pending"
            );
        }
    }
}

impl Inner {
    /// The deferred assistant turn. Does nothing if `turn` went stale.
    async fn complete_turn(&self, turn: u64) {
        let mut state = self.state.write().await;
        let session = &mut *state;

        let Some(outcome) =
            self.engine
                .respond(turn, &mut session.conversation, &mut session.document)
        else {
            debug!(turn, "Dropping stale assistant turn");
            return;
        };

        let fields = outcome.extraction.update.touched();
        if !fields.is_empty() {
            self.persist(session).await;
        }
        drop(state);

        if !fields.is_empty() {
            self.emit(SyncEvent::DocumentChanged {
                fields,
                source: ChangeSource::Chat,
            });
        }
        self.emit(SyncEvent::MessageAppended {
            message: outcome.reply,
        });
    }

    /// Best-effort write-through; failures leave the session in memory only.
    async fn persist(&self, session: &Session) {
        if let Err(e) = self
            .snapshots
            .save(self.mode, &session.document, session.wizard.step())
            .await
        {
            warn!(mode = %self.mode, error = %e, "Failed to save draft");
        }
    }

    fn emit(&self, event: SyncEvent) {
        // ok if no view is listening
        let _ = self.events.send(event);
    }
}

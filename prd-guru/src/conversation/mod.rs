//! Conversation state for one editing session: the turn log and the draft.
//!
//! Every mutation is published to the session's observers as a
//! [`SessionEvent`]. Publishing never fails; events sent while nobody is
//! subscribed are dropped.

use chrono::Utc;
use shared_types::{Document, DocumentField, MergeOutcome, Patch, SessionEvent, Turn, TurnRole};
use tokio::sync::broadcast;

pub mod driver;
pub mod registry;

pub use driver::{ChatDriver, SendError};
pub use registry::{SessionHandle, SessionRegistry};

#[derive(Debug)]
pub struct ConversationState {
    turns: Vec<Turn>,
    draft: Document,
    next_turn_id: u64,
    events: broadcast::Sender<SessionEvent>,
}

impl ConversationState {
    pub fn new(events: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            turns: Vec::new(),
            draft: Document::default(),
            next_turn_id: 1,
            events,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn draft(&self) -> &Document {
        &self.draft
    }

    /// The last `window` turns, oldest first.
    pub fn recent_turns(&self, window: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(window);
        &self.turns[start..]
    }

    /// History for a model call: the recent window with any leading
    /// assistant turns dropped, so it always opens on a user turn.
    pub fn model_history(&self, window: usize) -> Vec<Turn> {
        self.recent_turns(window)
            .iter()
            .skip_while(|turn| turn.role == TurnRole::Assistant)
            .cloned()
            .collect()
    }

    pub fn append_turn(&mut self, role: TurnRole, content: impl Into<String>) -> Turn {
        let turn = Turn {
            id: self.next_turn_id,
            role,
            content: content.into(),
            created_at: Utc::now(),
        };
        self.next_turn_id += 1;
        self.turns.push(turn.clone());
        self.publish(SessionEvent::TurnAppended { turn: turn.clone() });
        turn
    }

    /// Fresh empty draft, empty log.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.draft = Document::default();
        self.publish(SessionEvent::SessionReset);
    }

    /// Replace the draft with a persisted document. The log is cleared since
    /// its turns were about the previous draft.
    pub fn load(&mut self, document: Document) {
        self.turns.clear();
        self.draft = document;
        self.publish(SessionEvent::DocumentLoaded {
            document: self.draft.clone(),
        });
    }

    pub fn update_field(&mut self, field: DocumentField, value: impl Into<String>) {
        let value = value.into();
        self.draft.set_field(field, value.clone());
        self.publish(SessionEvent::FieldUpdated { field, value });
    }

    pub fn apply_patch(&mut self, patch: &Patch) -> MergeOutcome {
        let outcome = self.draft.apply_patch(patch);
        for field in &outcome.changed {
            self.publish(SessionEvent::FieldUpdated {
                field: *field,
                value: self.draft.field(*field).to_string(),
            });
        }
        if !outcome.ignored.is_empty() {
            tracing::debug!(ignored = ?outcome.ignored, "Patch carried unknown fields");
        }
        outcome
    }

    /// Record the id the store assigned to the draft.
    pub fn mark_saved(&mut self, id: &str) {
        if !self.draft.is_saved() {
            self.draft.id = Some(id.to_string());
        }
        self.publish(SessionEvent::DocumentSaved { id: id.to_string() });
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

//! In-memory symptom-checker session.
//!
//! `ChatSession` keeps the transcript behind an `Arc<Mutex<_>>` so clones can
//! be handed to other threads. The lock is never held while the responder
//! runs; a `processing` flag rejects a second submission in the meantime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use medcompanion_contracts::{
    error::{CompanionError, CompanionResult},
    model::{ConditionCard, MedicalConsultationResult},
};

use crate::turn::{ChatTurn, SavedAssessment, SessionStats, Speaker};

/// Opening assistant message of every session.
pub const WELCOME_MESSAGE: &str = "Hello! I'm your AI health assistant. I can help you understand your symptoms and provide general health guidance.\n\nPlease describe your symptoms in detail, including:\n• When they started\n• How severe they are\n• Any triggers you've noticed\n• Other related symptoms\n\nRemember, I provide general information only and cannot replace professional medical advice.";

/// `primary_condition` when no card was ever surfaced.
pub const GENERAL_CONSULTATION: &str = "General Consultation";

// ── Internal mutable state ────────────────────────────────────────────────────

struct SessionState {
    turns: Vec<ChatTurn>,
    processing: bool,
}

impl SessionState {
    fn push(
        &mut self,
        speaker: Speaker,
        message: String,
        condition_cards: Vec<ConditionCard>,
    ) -> ChatTurn {
        let turn = ChatTurn {
            id: self.turns.len() as u32 + 1,
            speaker,
            message,
            condition_cards,
            timestamp: Utc::now(),
        };
        self.turns.push(turn.clone());
        turn
    }
}

/// Clears `processing` when the submission ends, including by panic.
struct ProcessingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .processing = false;
    }
}

// ── Public session ────────────────────────────────────────────────────────────

/// An append-only conversation with the consultation service.
///
/// Clones share the same transcript.
#[derive(Clone)]
pub struct ChatSession {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    state: Arc<Mutex<SessionState>>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Open a session holding only the welcome turn.
    pub fn new() -> Self {
        let mut state = SessionState {
            turns: Vec::new(),
            processing: false,
        };
        state.push(Speaker::Assistant, WELCOME_MESSAGE.to_string(), Vec::new());

        let session_id = Uuid::new_v4();
        debug!(%session_id, "chat session opened");
        Self {
            session_id,
            started_at: Utc::now(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `text` as a user turn, ask `respond` for a reply, and append the
    /// reply as an assistant turn. Returns the assistant turn.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `text` is empty after trimming; nothing is appended.
    /// - `SessionBusy` if another submission is still waiting on its reply;
    ///   nothing is appended.
    pub fn submit_with<F>(&self, text: &str, respond: F) -> CompanionResult<ChatTurn>
    where
        F: FnOnce(&str) -> MedicalConsultationResult,
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(CompanionError::InvalidInput {
                reason: "message text is empty".to_string(),
            });
        }

        {
            let mut state = self.lock();
            if state.processing {
                return Err(CompanionError::SessionBusy {
                    session_id: self.session_id.to_string(),
                });
            }
            state.processing = true;
            state.push(Speaker::User, text.to_string(), Vec::new());
        }
        let _guard = ProcessingGuard { state: &self.state };

        let reply = respond(text);

        let turn = self
            .lock()
            .push(Speaker::Assistant, reply.response, reply.condition_cards);
        info!(
            session_id = %self.session_id,
            turn = turn.id,
            cards = turn.condition_cards.len(),
            "assistant turn recorded"
        );
        Ok(turn)
    }

    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    /// A copy of every turn, welcome first.
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.lock().turns.clone()
    }

    pub fn stats(&self) -> SessionStats {
        compute_stats(&self.lock().turns)
    }

    /// Freeze the conversation into a serializable assessment.
    pub fn snapshot(&self) -> SavedAssessment {
        let turns = self.turns();
        let stats = compute_stats(&turns);
        let primary_condition = turns
            .iter()
            .find_map(|t| t.condition_cards.first())
            .map(|card| card.name.clone())
            .unwrap_or_else(|| GENERAL_CONSULTATION.to_string());
        let saved_at = Utc::now();

        SavedAssessment {
            id: Uuid::new_v4(),
            session_id: self.session_id,
            title: format!("Assessment - {}", saved_at.format("%Y-%m-%d")),
            primary_condition,
            saved_at,
            turns,
            stats,
        }
    }
}

fn compute_stats(turns: &[ChatTurn]) -> SessionStats {
    let rest = turns.get(1..).unwrap_or_default();
    let user_messages = rest.iter().filter(|t| t.is_user()).count();
    let conditions_discussed = rest
        .iter()
        .filter(|t| !t.is_user())
        .map(|t| t.condition_cards.len())
        .sum();
    let duration = match (rest.first(), rest.last()) {
        (Some(first), Some(last)) => format_duration(first.timestamp, last.timestamp),
        _ => "0m".to_string(),
    };

    SessionStats {
        message_count: rest.len(),
        user_messages,
        assistant_messages: rest.len() - user_messages,
        conditions_discussed,
        duration,
    }
}

pub(crate) fn format_duration(first: DateTime<Utc>, last: DateTime<Utc>) -> String {
    let minutes = (last - first).num_minutes();
    if minutes > 0 {
        format!("{minutes}m")
    } else {
        "<1m".to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

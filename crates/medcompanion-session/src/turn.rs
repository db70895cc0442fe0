//! Transcript records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medcompanion_contracts::model::ConditionCard;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in a symptom-checker conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    /// 1-based position in the transcript; the welcome turn is 1.
    pub id: u32,
    pub speaker: Speaker,
    pub message: String,
    /// Always empty for user turns.
    pub condition_cards: Vec<ConditionCard>,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn is_user(&self) -> bool {
        self.speaker == Speaker::User
    }
}

/// Counters derived from a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Turns after the welcome message.
    pub message_count: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    /// Condition cards across every assistant turn.
    pub conditions_discussed: usize,
    /// Time between the first and last non-welcome turn: `"0m"`, `"<1m"`, or
    /// whole minutes such as `"12m"`.
    pub duration: String,
}

/// A saved copy of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAssessment {
    pub id: Uuid,
    pub session_id: Uuid,
    pub title: String,
    /// Name of the first condition card in the transcript, or
    /// `"General Consultation"` when none was surfaced.
    pub primary_condition: String,
    pub saved_at: DateTime<Utc>,
    pub turns: Vec<ChatTurn>,
    pub stats: SessionStats,
}

//! # medcompanion-session
//!
//! An in-memory symptom-checker conversation: a welcome turn, append-only
//! user/assistant turns, one submission in flight at a time, and a
//! serializable snapshot for saving an assessment.
//!
//! The session does not talk to the provider. Callers pass a responder,
//! normally `ConsultationService::consult`, to `submit_with`.

pub mod session;
pub mod turn;

pub use session::{ChatSession, GENERAL_CONSULTATION, WELCOME_MESSAGE};
pub use turn::{ChatTurn, SavedAssessment, SessionStats, Speaker};

use serde::{Deserialize, Serialize};

use crate::{ChallengeId, JoinOutcome, ProgressRecord, UserId};

/// Inbound events. Each one is an independent, unordered unit of work;
/// serialization per (challenge, user) key happens in the store's
/// conditional persist, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Join {
        challenge: ChallengeId,
        user: UserId,
    },
    CompleteDay {
        challenge: ChallengeId,
        user: UserId,
        day: u32,
        note: Option<String>,
    },
    AddNote {
        challenge: ChallengeId,
        user: UserId,
        day: u32,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Joined(ProgressRecord),
    AlreadyJoined(ProgressRecord),
    Completed(ProgressRecord),
    NoteAdded(ProgressRecord),
}

impl From<JoinOutcome> for EventOutcome {
    fn from(outcome: JoinOutcome) -> Self {
        match outcome {
            JoinOutcome::Joined(record) => Self::Joined(record),
            JoinOutcome::AlreadyJoined(record) => Self::AlreadyJoined(record),
        }
    }
}

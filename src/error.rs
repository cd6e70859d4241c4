use crate::{ChallengeId, UserId};

/// Domain errors. All of them are recoverable at the caller boundary;
/// `DuplicateDay` and `AlreadyJoined` signal rejected idempotent retries
/// rather than failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("challenge `{0}` not found")]
    ChallengeNotFound(ChallengeId),

    #[error("challenge `{0}` already exists")]
    ChallengeExists(ChallengeId),

    #[error("no progress record for `{user}` in challenge `{challenge}`")]
    RecordNotFound {
        challenge: ChallengeId,
        user: UserId,
    },

    #[error("day {day} is already completed")]
    DuplicateDay { day: u32 },

    #[error("`{user}` already joined challenge `{challenge}`")]
    AlreadyJoined {
        challenge: ChallengeId,
        user: UserId,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "stale write for `{user}` in challenge `{challenge}`: \
         expected version {expected}, found {found}"
    )]
    PersistenceConflict {
        challenge: ChallengeId,
        user: UserId,
        expected: u64,
        found: u64,
    },
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{Challenge, ChallengeId, EngineError, ProgressRecord, UserId};

/// Result of a join event. Joining twice is a no-op that hands back the
/// existing record, so callers can tell "already satisfied" apart from
/// a fresh membership.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined(ProgressRecord),
    AlreadyJoined(ProgressRecord),
}

impl JoinOutcome {
    pub fn record(&self) -> &ProgressRecord {
        match self {
            Self::Joined(record) | Self::AlreadyJoined(record) => record,
        }
    }
}

/// Persistence collaborator. Challenge documents embed one progress
/// record per joined user; implementations must keep joins atomic with
/// respect to duplicate detection and make `persist_record` a
/// conditional replace on the record's version.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn insert_challenge(&self, challenge: Challenge) -> Result<(), EngineError>;

    async fn fetch_challenge(&self, id: &ChallengeId) -> Result<Challenge, EngineError>;

    async fn list_challenges(&self) -> Result<Vec<Challenge>, EngineError>;

    /// All challenges the user has joined.
    async fn challenges_for_user(&self, user: &UserId) -> Result<Vec<Challenge>, EngineError>;

    async fn join_challenge(
        &self,
        id: &ChallengeId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, EngineError>;

    /// Replaces the one record matching `record.user` iff its stored
    /// version equals `expected_version`, returning the stored copy with
    /// its bumped version. A mismatch is `PersistenceConflict` and must
    /// be surfaced, never swallowed.
    async fn persist_record(
        &self,
        id: &ChallengeId,
        record: ProgressRecord,
        expected_version: u64,
    ) -> Result<ProgressRecord, EngineError>;
}

/// Reference store over an in-process map. The write lock serializes
/// updates to a single (challenge, user) key; distinct keys only contend
/// on the lock itself.
#[derive(Debug, Default)]
pub struct MemoryStore {
    challenges: RwLock<HashMap<ChallengeId, Challenge>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn insert_challenge(&self, challenge: Challenge) -> Result<(), EngineError> {
        let mut challenges = self.challenges.write().await;
        if challenges.contains_key(&challenge.id) {
            return Err(EngineError::ChallengeExists(challenge.id));
        }
        challenges.insert(challenge.id.clone(), challenge);
        Ok(())
    }

    async fn fetch_challenge(&self, id: &ChallengeId) -> Result<Challenge, EngineError> {
        self.challenges
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::ChallengeNotFound(id.clone()))
    }

    async fn list_challenges(&self) -> Result<Vec<Challenge>, EngineError> {
        Ok(self.challenges.read().await.values().cloned().collect())
    }

    async fn challenges_for_user(&self, user: &UserId) -> Result<Vec<Challenge>, EngineError> {
        Ok(self
            .challenges
            .read()
            .await
            .values()
            .filter(|challenge| challenge.joined_users.contains(user))
            .cloned()
            .collect())
    }

    async fn join_challenge(
        &self,
        id: &ChallengeId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, EngineError> {
        let mut challenges = self.challenges.write().await;
        let challenge = challenges
            .get_mut(id)
            .ok_or_else(|| EngineError::ChallengeNotFound(id.clone()))?;

        match challenge.join(user.clone(), now) {
            Ok(record) => Ok(JoinOutcome::Joined(record)),
            Err(EngineError::AlreadyJoined { .. }) => {
                let existing = challenge
                    .record_for(user)
                    .cloned()
                    .ok_or_else(|| EngineError::RecordNotFound {
                        challenge: id.clone(),
                        user: user.clone(),
                    })?;
                Ok(JoinOutcome::AlreadyJoined(existing))
            }
            Err(other) => Err(other),
        }
    }

    async fn persist_record(
        &self,
        id: &ChallengeId,
        record: ProgressRecord,
        expected_version: u64,
    ) -> Result<ProgressRecord, EngineError> {
        let mut challenges = self.challenges.write().await;
        let challenge = challenges
            .get_mut(id)
            .ok_or_else(|| EngineError::ChallengeNotFound(id.clone()))?;
        challenge.replace_record(record, expected_version)
    }
}

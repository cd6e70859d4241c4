use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChallengeId, EngineError, ProgressRecord, UserId};

/// Input for an administrative create-challenge action. The id is opaque
/// and caller-supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChallenge {
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub duration: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub impact_metric: String,
}

/// A time-boxed habit challenge embedding one [`ProgressRecord`] per
/// joined user. The participant count is derived from the joined set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub duration: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub impact_metric: String,
    pub joined_users: BTreeSet<UserId>,
    pub records: Vec<ProgressRecord>,
}

impl Challenge {
    /// Validates and builds a fresh challenge with no participants.
    /// A zero duration is rejected here so the aggregation math never
    /// has to guard against it.
    pub fn new(input: NewChallenge) -> Result<Self, EngineError> {
        if input.id.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "challenge id is empty".to_string(),
            ));
        }
        if input.title.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "challenge title is empty".to_string(),
            ));
        }
        if input.duration == 0 {
            return Err(EngineError::InvalidInput(
                "challenge duration must be at least one day".to_string(),
            ));
        }
        if input.end_date <= input.start_date {
            return Err(EngineError::InvalidInput(
                "challenge end date must be after its start date".to_string(),
            ));
        }

        Ok(Self {
            id: input.id,
            title: input.title,
            description: input.description,
            category: input.category,
            duration: input.duration,
            start_date: input.start_date,
            end_date: input.end_date,
            impact_metric: input.impact_metric,
            joined_users: BTreeSet::new(),
            records: Vec::new(),
        })
    }

    pub fn participants(&self) -> u32 {
        self.joined_users.len() as u32
    }

    pub fn record_for(&self, user: &UserId) -> Option<&ProgressRecord> {
        self.records.iter().find(|record| &record.user == user)
    }

    /// Adds a member with a zero-valued record, or reports
    /// `AlreadyJoined` without mutating anything.
    pub fn join(&mut self, user: UserId, now: DateTime<Utc>) -> Result<ProgressRecord, EngineError> {
        if self.joined_users.contains(&user) {
            return Err(EngineError::AlreadyJoined {
                challenge: self.id.clone(),
                user,
            });
        }

        let record = ProgressRecord::new(user.clone(), now);
        self.joined_users.insert(user);
        self.records.push(record.clone());
        Ok(record)
    }

    /// Replaces the one record matching `updated.user` iff its stored
    /// version equals `expected_version`, bumping the version on success.
    /// Targeted replacement keeps concurrent appends for other users
    /// undisturbed.
    pub fn replace_record(
        &mut self,
        updated: ProgressRecord,
        expected_version: u64,
    ) -> Result<ProgressRecord, EngineError> {
        let id = self.id.clone();
        let Some(slot) = self
            .records
            .iter_mut()
            .find(|record| record.user == updated.user)
        else {
            return Err(EngineError::RecordNotFound {
                challenge: id,
                user: updated.user,
            });
        };

        if slot.version != expected_version {
            return Err(EngineError::PersistenceConflict {
                challenge: id,
                user: updated.user,
                expected: expected_version,
                found: slot.version,
            });
        }

        *slot = ProgressRecord {
            version: expected_version + 1,
            ..updated
        };
        Ok(slot.clone())
    }
}

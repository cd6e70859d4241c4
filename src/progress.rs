use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{consts::POINTS_PER_COMPLETION, Achievement, EngineError, UserId};

/// Free-text note attached to a logical day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub day: u32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// One user's accumulated state within one challenge. The completed-day
/// count is always derived from the set, never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user: UserId,
    pub joined_at: DateTime<Utc>,
    pub completed_days: BTreeSet<u32>,
    pub points: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity: Option<DateTime<Utc>>,
    pub achievements: BTreeSet<Achievement>,
    pub notes: Vec<Note>,
    /// Bumped by the store on every accepted conditional persist.
    pub version: u64,
}

impl ProgressRecord {
    pub fn new(user: UserId, joined_at: DateTime<Utc>) -> Self {
        Self {
            user,
            joined_at,
            completed_days: BTreeSet::new(),
            points: 0,
            current_streak: 0,
            longest_streak: 0,
            last_activity: None,
            achievements: BTreeSet::new(),
            notes: Vec::new(),
            version: 0,
        }
    }

    pub fn total_days_completed(&self) -> u32 {
        self.completed_days.len() as u32
    }

    pub fn is_completed(&self, duration: u32) -> bool {
        self.total_days_completed() >= duration
    }

    /// Applies one "day completed" event, yielding the updated record.
    ///
    /// Rejects `DuplicateDay` when the day is already in the set; the
    /// caller is told the event had no effect instead of a silent no-op.
    /// Streak continuity is over logical day numbers, not calendar dates:
    /// the streak extends iff `day` is exactly one past the largest
    /// day completed so far, and resets to 1 otherwise.
    pub fn apply_completion(
        &self,
        duration: u32,
        day: u32,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        check_day(duration, day)?;
        if let Some(text) = &note {
            check_note_text(text)?;
        }
        if self.completed_days.contains(&day) {
            return Err(EngineError::DuplicateDay { day });
        }

        let prev_max = self.completed_days.iter().next_back().copied().unwrap_or(0);

        let mut updated = self.clone();
        updated.completed_days.insert(day);
        updated.current_streak = if day == prev_max + 1 {
            self.current_streak + 1
        } else {
            1
        };
        updated.longest_streak = updated.longest_streak.max(updated.current_streak);
        updated.points += POINTS_PER_COMPLETION;

        let unlocked = Achievement::newly_unlocked(&updated, duration);
        updated.achievements.extend(unlocked);

        if let Some(text) = note {
            updated.notes.push(Note {
                day,
                text,
                created_at: now,
            });
        }
        updated.last_activity = Some(now);

        Ok(updated)
    }

    /// Appends a timestamped note without touching counters or streaks.
    pub fn add_note(
        &self,
        duration: u32,
        day: u32,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        check_day(duration, day)?;
        check_note_text(&text)?;

        let mut updated = self.clone();
        updated.notes.push(Note {
            day,
            text,
            created_at: now,
        });
        Ok(updated)
    }
}

fn check_day(duration: u32, day: u32) -> Result<(), EngineError> {
    if day == 0 || day > duration {
        return Err(EngineError::InvalidInput(format!(
            "day {day} is outside 1..={duration}"
        )));
    }
    Ok(())
}

fn check_note_text(text: &str) -> Result<(), EngineError> {
    if text.trim().is_empty() {
        return Err(EngineError::InvalidInput("note text is empty".to_string()));
    }
    Ok(())
}

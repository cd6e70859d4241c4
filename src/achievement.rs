use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::ProgressRecord;

/// One-time unlockable tags. The processor only iterates the enum, so
/// extending the rule set means adding a variant and its arm in
/// [`Achievement::qualifies`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Achievement {
    #[serde(rename = "First Step")]
    #[strum(serialize = "First Step")]
    FirstStep,
    #[serde(rename = "Week Warrior")]
    #[strum(serialize = "Week Warrior")]
    WeekWarrior,
    #[serde(rename = "7-Day Streak")]
    #[strum(serialize = "7-Day Streak")]
    SevenDayStreak,
    #[serde(rename = "Challenge Master")]
    #[strum(serialize = "Challenge Master")]
    ChallengeMaster,
}

impl Achievement {
    /// Pure predicate over the post-update record and the parent
    /// challenge's duration.
    pub fn qualifies(&self, record: &ProgressRecord, duration: u32) -> bool {
        match self {
            Self::FirstStep => record.total_days_completed() == 1,
            Self::WeekWarrior => record.total_days_completed() == 7,
            Self::SevenDayStreak => record.current_streak == 7,
            Self::ChallengeMaster => record.total_days_completed() == duration,
        }
    }

    /// Tags that qualify against `record` and are not unlocked yet.
    /// Re-qualification of an already-present tag is a no-op.
    pub fn newly_unlocked(record: &ProgressRecord, duration: u32) -> Vec<Achievement> {
        Self::iter()
            .filter(|tag| !record.achievements.contains(tag) && tag.qualifies(record, duration))
            .collect()
    }
}

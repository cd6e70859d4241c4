use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Achievement, Challenge, ProgressRecord};

/// Cross-challenge roll-up for one user. A pure fold; the result does
/// not depend on the iteration order of the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub total_points: u32,
    pub total_days_completed: u32,
    pub total_challenges: u32,
    pub completed_challenges: u32,
    pub active_challenges: u32,
    /// Union of all per-challenge tag sets; a tag earned in two
    /// challenges counts once.
    pub achievements: BTreeSet<Achievement>,
}

impl UserSummary {
    pub fn summarize<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = (&'a Challenge, &'a ProgressRecord)>,
    {
        let mut summary = Self::default();
        for (challenge, record) in records {
            summary.total_challenges += 1;
            summary.total_points += record.points;
            summary.total_days_completed += record.total_days_completed();
            if record.is_completed(challenge.duration) {
                summary.completed_challenges += 1;
            }
            summary
                .achievements
                .extend(record.achievements.iter().copied());
        }
        summary.active_challenges = summary.total_challenges - summary.completed_challenges;
        summary
    }
}

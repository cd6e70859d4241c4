use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{consts::LEADERBOARD_SIZE, ProgressRecord, UserId};

/// One leaderboard row. Ranks are positional, so two equal-point
/// entries get distinct ranks; the stable sort keeps their incoming
/// relative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: u32,
    pub user: UserId,
    pub points: u32,
    pub total_days_completed: u32,
    pub current_streak: u32,
}

/// Orders a challenge's records descending by points, truncated to the
/// top [`LEADERBOARD_SIZE`].
pub fn rank(records: &[ProgressRecord]) -> Vec<RankedEntry> {
    records
        .iter()
        .sorted_by(|a, b| b.points.cmp(&a.points))
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(position, record)| RankedEntry {
            rank: position as u32 + 1,
            user: record.user.clone(),
            points: record.points,
            total_days_completed: record.total_days_completed(),
            current_streak: record.current_streak,
        })
        .collect()
}

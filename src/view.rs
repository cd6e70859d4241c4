use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Challenge, ChallengeId, ProgressRecord};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Presentation of one user's standing within one challenge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressView {
    pub challenge_id: ChallengeId,
    /// Whole days elapsed since the challenge started. Not clamped, so
    /// it keeps growing after the window closes and is negative before
    /// the start.
    pub days_passed: i64,
    pub days_remaining: u32,
    /// Percentage of the duration completed, capped at 100 and rounded
    /// to two decimal places.
    pub progress_percentage: f64,
    pub is_active: bool,
    pub is_completed: bool,
    pub total_days_completed: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub points: u32,
}

impl ProgressView {
    /// Describes `record` against its parent challenge. A missing record
    /// means "not yet started" and yields a zero-valued view.
    pub fn describe(challenge: &Challenge, record: Option<&ProgressRecord>, now: DateTime<Utc>) -> Self {
        let days_passed = (now - challenge.start_date)
            .num_seconds()
            .div_euclid(SECONDS_PER_DAY);
        let days_remaining = (i64::from(challenge.duration) - days_passed).max(0) as u32;

        let (total, current, longest, points) = record
            .map(|record| {
                (
                    record.total_days_completed(),
                    record.current_streak,
                    record.longest_streak,
                    record.points,
                )
            })
            .unwrap_or_default();

        let percentage = f64::from(total) / f64::from(challenge.duration) * 100.0;
        let progress_percentage = (percentage.min(100.0) * 100.0).round() / 100.0;

        Self {
            challenge_id: challenge.id.clone(),
            days_passed,
            days_remaining,
            progress_percentage,
            is_active: challenge.start_date <= now && now <= challenge.end_date,
            is_completed: total >= challenge.duration,
            total_days_completed: total,
            current_streak: current,
            longest_streak: longest,
            points,
        }
    }
}

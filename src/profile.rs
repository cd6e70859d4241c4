use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{UserId, UserSummary};

fn default_role() -> String {
    "user".to_string()
}

/// Account-level projection. The counters are a rebuildable cache of the
/// embedded progress records, which stay the source of truth; a stale
/// profile is legitimate until the next [`UserProfile::rebuild`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub total_points: u32,
    pub challenges_joined: u32,
    pub challenges_completed: u32,
}

impl UserProfile {
    pub fn new(
        email: UserId,
        display_name: String,
        avatar_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            email,
            display_name,
            avatar_url,
            role: default_role(),
            created_at: now,
            total_points: 0,
            challenges_joined: 0,
            challenges_completed: 0,
        }
    }

    pub fn rebuild(&mut self, summary: &UserSummary) {
        self.total_points = summary.total_points;
        self.challenges_joined = summary.total_challenges;
        self.challenges_completed = summary.completed_challenges;
    }
}

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::{
    leaderboard, Challenge, ChallengeId, ChallengeStore, EngineConfig, EngineError, Event,
    EventOutcome, JoinOutcome, NewChallenge, ProgressRecord, ProgressView, RankedEntry, UserId,
    UserSummary,
};

/// Glue between the pure engine and the persistence collaborator.
///
/// Every read-modify-write on a progress record goes through a
/// conditional persist keyed on the record's version; a stale read is
/// retried (bounded by [`EngineConfig::persist_retries`]) so concurrent
/// completions for the same user never silently drop an increment.
pub struct ChallengeService<S> {
    store: S,
    config: EngineConfig,
}

impl<S: ChallengeStore> ChallengeService<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    #[instrument(skip(self, input), fields(id = %input.id))]
    pub async fn create_challenge(&self, input: NewChallenge) -> Result<Challenge, EngineError> {
        let challenge = Challenge::new(input)?;
        self.store.insert_challenge(challenge.clone()).await?;
        info!(duration = challenge.duration, "created challenge");
        Ok(challenge)
    }

    pub async fn list_challenges(&self) -> Result<Vec<Challenge>, EngineError> {
        self.store.list_challenges().await
    }

    pub async fn fetch_challenge(&self, id: &ChallengeId) -> Result<Challenge, EngineError> {
        self.store.fetch_challenge(id).await
    }

    #[instrument(skip(self))]
    pub async fn join(
        &self,
        challenge: &ChallengeId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, EngineError> {
        let outcome = self.store.join_challenge(challenge, user, now).await?;
        match &outcome {
            JoinOutcome::Joined(_) => info!("user joined challenge"),
            JoinOutcome::AlreadyJoined(_) => debug!("join was a no-op"),
        }
        Ok(outcome)
    }

    #[instrument(skip(self, note))]
    pub async fn complete_day(
        &self,
        challenge: &ChallengeId,
        user: &UserId,
        day: u32,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, EngineError> {
        let record = self
            .update_record(challenge, user, |parent, record| {
                record.apply_completion(parent.duration, day, note.clone(), now)
            })
            .await?;
        info!(
            points = record.points,
            streak = record.current_streak,
            "day completed"
        );
        Ok(record)
    }

    #[instrument(skip(self, text))]
    pub async fn add_note(
        &self,
        challenge: &ChallengeId,
        user: &UserId,
        day: u32,
        text: String,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, EngineError> {
        self.update_record(challenge, user, |parent, record| {
            record.add_note(parent.duration, day, text.clone(), now)
        })
        .await
    }

    pub async fn progress(
        &self,
        challenge: &ChallengeId,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ProgressView, EngineError> {
        let challenge = self.store.fetch_challenge(challenge).await?;
        Ok(ProgressView::describe(
            &challenge,
            challenge.record_for(user),
            now,
        ))
    }

    pub async fn user_summary(&self, user: &UserId) -> Result<UserSummary, EngineError> {
        let challenges = self.store.challenges_for_user(user).await?;
        Ok(UserSummary::summarize(
            challenges
                .iter()
                .filter_map(|challenge| {
                    challenge.record_for(user).map(|record| (challenge, record))
                }),
        ))
    }

    pub async fn leaderboard(
        &self,
        challenge: &ChallengeId,
    ) -> Result<Vec<RankedEntry>, EngineError> {
        let challenge = self.store.fetch_challenge(challenge).await?;
        Ok(leaderboard::rank(&challenge.records))
    }

    /// Dispatches one inbound event.
    pub async fn handle(&self, event: Event, now: DateTime<Utc>) -> Result<EventOutcome, EngineError> {
        match event {
            Event::Join { challenge, user } => {
                Ok(self.join(&challenge, &user, now).await?.into())
            }
            Event::CompleteDay {
                challenge,
                user,
                day,
                note,
            } => Ok(EventOutcome::Completed(
                self.complete_day(&challenge, &user, day, note, now).await?,
            )),
            Event::AddNote {
                challenge,
                user,
                day,
                text,
            } => Ok(EventOutcome::NoteAdded(
                self.add_note(&challenge, &user, day, text, now).await?,
            )),
        }
    }

    /// Optimistic read-transform-persist loop. `transition` is pure, so
    /// re-running it against a fresh read is always safe.
    async fn update_record<F>(
        &self,
        challenge: &ChallengeId,
        user: &UserId,
        transition: F,
    ) -> Result<ProgressRecord, EngineError>
    where
        F: Fn(&Challenge, &ProgressRecord) -> Result<ProgressRecord, EngineError>,
    {
        let mut attempts_left = self.config.persist_retries();
        loop {
            let parent = self.store.fetch_challenge(challenge).await?;
            let record = parent
                .record_for(user)
                .ok_or_else(|| EngineError::RecordNotFound {
                    challenge: challenge.clone(),
                    user: user.clone(),
                })?;
            let updated = transition(&parent, record)?;

            match self
                .store
                .persist_record(challenge, updated, record.version)
                .await
            {
                Err(EngineError::PersistenceConflict { .. }) if attempts_left > 0 => {
                    attempts_left -= 1;
                    warn!(%challenge, %user, attempts_left, "stale progress read, retrying");
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::{Achievement, MemoryStore};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn new_challenge(id: &str, duration: u32) -> NewChallenge {
        NewChallenge {
            id: id.to_string(),
            title: format!("Challenge {id}"),
            description: String::new(),
            category: "transport".to_string(),
            duration,
            start_date: now(),
            end_date: now() + chrono::Duration::days(i64::from(duration)),
            impact_metric: "kg CO2 saved".to_string(),
        }
    }

    fn service() -> ChallengeService<MemoryStore> {
        ChallengeService::new(MemoryStore::new(), EngineConfig::default())
    }

    #[tokio::test]
    async fn completion_flow_accumulates_points_and_achievements() {
        let service = service();
        service
            .create_challenge(new_challenge("bike", 10))
            .await
            .unwrap();

        let id = "bike".to_string();
        let user = "amina".to_string();
        service.join(&id, &user, now()).await.unwrap();

        for day in 1..=3 {
            service
                .complete_day(&id, &user, day, None, now())
                .await
                .unwrap();
        }

        let view = service.progress(&id, &user, now()).await.unwrap();
        assert_eq!(view.points, 30);
        assert_eq!(view.current_streak, 3);
        assert_eq!(view.progress_percentage, 30.00);

        let challenge = service.fetch_challenge(&id).await.unwrap();
        let record = challenge.record_for(&user).unwrap();
        assert!(record.achievements.contains(&Achievement::FirstStep));
        assert_eq!(record.version, 3);
    }

    #[tokio::test]
    async fn duplicate_completion_is_rejected_without_changing_state() {
        let service = service();
        service
            .create_challenge(new_challenge("bike", 10))
            .await
            .unwrap();

        let id = "bike".to_string();
        let user = "amina".to_string();
        service.join(&id, &user, now()).await.unwrap();
        service
            .complete_day(&id, &user, 1, None, now())
            .await
            .unwrap();

        let before = service.fetch_challenge(&id).await.unwrap();
        let err = service
            .complete_day(&id, &user, 1, None, now())
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::DuplicateDay { day: 1 });
        assert_eq!(service.fetch_challenge(&id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn completing_without_joining_is_not_found() {
        let service = service();
        service
            .create_challenge(new_challenge("bike", 10))
            .await
            .unwrap();

        let err = service
            .complete_day(&"bike".to_string(), &"amina".to_string(), 1, None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn summary_spans_challenges_and_deduplicates_achievements() {
        let service = service();
        service
            .create_challenge(new_challenge("bike", 10))
            .await
            .unwrap();
        service
            .create_challenge(new_challenge("compost", 10))
            .await
            .unwrap();

        let user = "amina".to_string();
        for id in ["bike", "compost"] {
            let id = id.to_string();
            service.join(&id, &user, now()).await.unwrap();
            service
                .complete_day(&id, &user, 1, None, now())
                .await
                .unwrap();
            service
                .complete_day(&id, &user, 2, None, now())
                .await
                .unwrap();
        }
        service
            .complete_day(&"compost".to_string(), &user, 3, None, now())
            .await
            .unwrap();

        assert_eq!(service.list_challenges().await.unwrap().len(), 2);

        let summary = service.user_summary(&user).await.unwrap();
        assert_eq!(summary.total_points, 50);
        assert_eq!(summary.total_challenges, 2);
        assert_eq!(
            summary.achievements,
            std::collections::BTreeSet::from([Achievement::FirstStep])
        );
    }

    #[tokio::test]
    async fn leaderboard_caps_at_ten_entries() {
        let service = service();
        service
            .create_challenge(new_challenge("bike", 20))
            .await
            .unwrap();

        let id = "bike".to_string();
        for i in 0..12 {
            let user = format!("user-{i:02}");
            service.join(&id, &user, now()).await.unwrap();
            for day in 1..=i {
                service
                    .complete_day(&id, &user, day as u32, None, now())
                    .await
                    .unwrap();
            }
        }

        let board = service.leaderboard(&id).await.unwrap();
        assert_eq!(board.len(), 10);
        assert_eq!(board[0].user, "user-11");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[9].rank, 10);
    }

    #[tokio::test]
    async fn event_dispatch_matches_the_direct_calls() {
        let service = service();
        service
            .create_challenge(new_challenge("bike", 10))
            .await
            .unwrap();

        let id = "bike".to_string();
        let user = "amina".to_string();

        let joined = service
            .handle(
                Event::Join {
                    challenge: id.clone(),
                    user: user.clone(),
                },
                now(),
            )
            .await
            .unwrap();
        assert!(matches!(joined, EventOutcome::Joined(_)));

        let rejoined = service
            .handle(
                Event::Join {
                    challenge: id.clone(),
                    user: user.clone(),
                },
                now(),
            )
            .await
            .unwrap();
        assert!(matches!(rejoined, EventOutcome::AlreadyJoined(_)));

        let completed = service
            .handle(
                Event::CompleteDay {
                    challenge: id.clone(),
                    user: user.clone(),
                    day: 1,
                    note: Some("took the long way".to_string()),
                },
                now(),
            )
            .await
            .unwrap();
        let EventOutcome::Completed(record) = completed else {
            panic!("expected a completion outcome");
        };
        assert_eq!(record.points, 10);
        assert_eq!(record.notes.len(), 1);

        let noted = service
            .handle(
                Event::AddNote {
                    challenge: id.clone(),
                    user: user.clone(),
                    day: 1,
                    text: "legs sore".to_string(),
                },
                now(),
            )
            .await
            .unwrap();
        let EventOutcome::NoteAdded(record) = noted else {
            panic!("expected a note outcome");
        };
        assert_eq!(record.notes.len(), 2);
        assert_eq!(record.points, 10);
    }

    #[tokio::test]
    async fn concurrent_completions_for_one_user_both_land() {
        let service = Arc::new(service());
        service
            .create_challenge(new_challenge("bike", 10))
            .await
            .unwrap();

        let id = "bike".to_string();
        let user = "amina".to_string();
        service.join(&id, &user, now()).await.unwrap();

        let first = {
            let service = service.clone();
            let (id, user) = (id.clone(), user.clone());
            tokio::spawn(async move { service.complete_day(&id, &user, 1, None, now()).await })
        };
        let second = {
            let service = service.clone();
            let (id, user) = (id.clone(), user.clone());
            tokio::spawn(async move { service.complete_day(&id, &user, 4, None, now()).await })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let challenge = service.fetch_challenge(&id).await.unwrap();
        let record = challenge.record_for(&user).unwrap();
        assert_eq!(record.points, 20);
        assert_eq!(record.total_days_completed(), 2);
        assert_eq!(record.version, 2);
    }
}

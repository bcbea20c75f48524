//! Atomic write of one finished review.

use chrono::{DateTime, TimeZone, Utc};
use vocab_core::algorithm::{compute_next_review, SchedulingResult};
use vocab_core::types::{Grade, Profile, ReviewRecord};
use vocab_core::xp::XpPolicy;

use crate::db::{DbError, ProfileRepository, ProgressRepository, Transactional};

/// What a saved review changed.
#[derive(Debug, Clone)]
pub struct SavedReview {
    pub term_id: i64,
    pub grade: Grade,
    pub xp: i64,
    pub total_xp: i64,
    pub schedule: SchedulingResult,
}

/// Schedule the next review of a term and award XP, as one transaction.
///
/// Progress is re-read inside the transaction rather than taken from the
/// session queue, which may be stale after a long AI round trip. A missing
/// profile is created with `language` and the awarded XP.
pub fn persist_review<S, Tz>(
    store: &S,
    term_id: i64,
    grade: Grade,
    policy: XpPolicy,
    now: &DateTime<Tz>,
    language: &str,
) -> Result<SavedReview, DbError>
where
    S: ProgressRepository + ProfileRepository + Transactional,
    Tz: TimeZone,
{
    store.atomically(|store| {
        let mut progress = store
            .get_progress(term_id)?
            .ok_or(DbError::TermNotFound(term_id))?;

        let schedule = compute_next_review(
            grade.value(),
            progress.repetition,
            progress.efactor,
            progress.interval,
            now,
        );
        progress.apply(
            &schedule,
            ReviewRecord {
                reviewed_at: now.with_timezone(&Utc),
                grade,
            },
        );
        store.put_progress(term_id, &progress)?;

        let xp = policy.award(grade);
        let mut profile = store.get_profile()?.unwrap_or_else(|| Profile {
            language: language.to_string(),
            ..Profile::default()
        });
        profile.xp += xp;
        store.save_profile(&profile)?;

        Ok(SavedReview {
            term_id,
            grade,
            xp,
            total_xp: profile.xp,
            schedule,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewTerm, SqliteRepository, TermRepository};
    use chrono::{Duration, FixedOffset, Timelike};
    use pretty_assertions::assert_eq;

    fn repo_with_term() -> (SqliteRepository, i64) {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let item = repo
            .add_term(
                &NewTerm {
                    content: "ephemeral".to_string(),
                    definition: "short-lived".to_string(),
                    context: None,
                },
                Utc::now() - Duration::minutes(5),
            )
            .unwrap();
        (repo, item.id)
    }

    fn grade(value: u8) -> Grade {
        Grade::new(value).unwrap()
    }

    #[test]
    fn first_review_creates_profile() {
        let (repo, id) = repo_with_term();
        let saved = persist_review(&repo, id, grade(5), XpPolicy::Review, &Utc::now(), "French")
            .unwrap();

        assert_eq!(saved.xp, 20);
        assert_eq!(saved.total_xp, 20);
        assert_eq!(saved.schedule.interval, 4);

        let profile = repo.get_profile().unwrap().unwrap();
        assert_eq!(profile.xp, 20);
        assert_eq!(profile.language, "French");
    }

    #[test]
    fn xp_accumulates() {
        let (repo, id) = repo_with_term();
        persist_review(&repo, id, grade(0), XpPolicy::Review, &Utc::now(), "English").unwrap();
        let saved =
            persist_review(&repo, id, grade(4), XpPolicy::Mentor, &Utc::now(), "English").unwrap();
        assert_eq!(saved.total_xp, 10 + 27);
    }

    #[test]
    fn history_grows_by_one_per_review() {
        let (repo, id) = repo_with_term();
        for g in [4, 0, 3, 5] {
            persist_review(&repo, id, grade(g), XpPolicy::Review, &Utc::now(), "English").unwrap();
        }

        let progress = repo.get_progress(id).unwrap().unwrap();
        let grades: Vec<u8> = progress.history.iter().map(|r| r.grade.value()).collect();
        assert_eq!(grades, vec![4, 0, 3, 5]);
        assert!(progress
            .history
            .windows(2)
            .all(|w| w[0].reviewed_at <= w[1].reviewed_at));
    }

    #[test]
    fn uses_fresh_progress() {
        let (repo, id) = repo_with_term();
        persist_review(&repo, id, grade(4), XpPolicy::Review, &Utc::now(), "English").unwrap();
        let saved =
            persist_review(&repo, id, grade(4), XpPolicy::Review, &Utc::now(), "English").unwrap();
        assert_eq!(saved.schedule.repetition, 2);
        assert_eq!(saved.schedule.interval, 6);
    }

    #[test]
    fn due_time_lands_at_four_am() {
        let (repo, id) = repo_with_term();
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = Utc::now().with_timezone(&offset);
        let saved = persist_review(&repo, id, grade(3), XpPolicy::Review, &now, "English").unwrap();

        let due = saved.schedule.next_review_at.with_timezone(&offset);
        assert_eq!((due.hour(), due.minute(), due.second()), (4, 0, 0));
    }

    #[test]
    fn unknown_term_writes_nothing() {
        let (repo, _) = repo_with_term();
        let result = persist_review(&repo, 999, grade(5), XpPolicy::Review, &Utc::now(), "English");
        assert!(matches!(result, Err(DbError::TermNotFound(999))));
        assert_eq!(repo.get_profile().unwrap(), None);
    }
}

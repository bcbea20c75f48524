//! Repository pattern for database access.

use crate::db::date_utils::{from_millis, to_millis};
use crate::db::error::DbError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use vocab_core::types::{
    Grade, LearningItem, Profile, Progress, QuizType, RawTerm, ReviewRecord,
};

type Result<T> = std::result::Result<T, DbError>;

/// Term to be added by hand.
#[derive(Debug, Clone)]
pub struct NewTerm {
    pub content: String,
    pub definition: String,
    pub context: Option<String>,
}

impl From<&RawTerm> for NewTerm {
    fn from(raw: &RawTerm) -> Self {
        Self {
            content: raw.content.clone(),
            definition: raw.definition.clone(),
            context: raw.context.clone(),
        }
    }
}

/// Repository for vocabulary terms.
pub trait TermRepository {
    /// Store a term with fresh scheduling state, due at `now`.
    fn add_term(&self, term: &NewTerm, now: DateTime<Utc>) -> Result<LearningItem>;
    fn import_terms(&self, terms: &[RawTerm], now: DateTime<Utc>) -> Result<Vec<i64>>;
    fn get_item(&self, id: i64) -> Result<Option<LearningItem>>;
    fn count_terms(&self) -> Result<usize>;
}

/// Repository for per-term scheduling state.
pub trait ProgressRepository {
    /// Items with `next_review_at <= now`, soonest first, at most `limit`.
    fn get_due_items(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<LearningItem>>;
    fn count_due(&self, now: DateTime<Utc>) -> Result<usize>;
    fn get_progress(&self, term_id: i64) -> Result<Option<Progress>>;
    /// Upsert the full record. History entries already stored are kept as is;
    /// a record whose history is shorter than the stored one is rejected.
    fn put_progress(&self, term_id: i64, progress: &Progress) -> Result<()>;
}

/// Repository for the learner profile.
pub trait ProfileRepository {
    fn get_profile(&self) -> Result<Option<Profile>>;
    fn save_profile(&self, profile: &Profile) -> Result<()>;
}

/// Storage that can run several operations as one unit.
pub trait Transactional {
    /// Run `f` in a single transaction. An error from `f` rolls back every
    /// write it made.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;
}

/// SQLite implementation of repositories.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(super::schema::SCHEMA)?;
        self.conn.execute_batch(super::schema::INIT_SCHEMA_VERSION)?;
        Ok(())
    }

    fn insert_term(&self, term: &NewTerm, now: DateTime<Utc>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO terms (content, definition, context, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![term.content, term.definition, term.context, to_millis(now)],
        )?;
        let id = self.conn.last_insert_rowid();
        self.put_progress(id, &Progress::initial(now))?;
        Ok(id)
    }

    fn get_history(&self, term_id: i64) -> Result<Vec<ReviewRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT reviewed_at, grade FROM review_history WHERE term_id = ?1 ORDER BY seq",
        )?;

        let rows = stmt
            .query_map(params![term_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(reviewed_at, grade)| {
                Ok(ReviewRecord {
                    reviewed_at: from_millis(reviewed_at)?,
                    grade: Grade::clamped(grade),
                })
            })
            .collect()
    }

    fn history_len(&self, term_id: i64) -> Result<usize> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM review_history WHERE term_id = ?1",
                params![term_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<ItemRow> {
        Ok(ItemRow {
            id: row.get(0)?,
            content: row.get(1)?,
            definition: row.get(2)?,
            context: row.get(3)?,
            interval: row.get(4)?,
            repetition: row.get(5)?,
            efactor: row.get(6)?,
            next_review_at: row.get(7)?,
        })
    }

    fn load_item(&self, row: ItemRow) -> Result<LearningItem> {
        let history = self.get_history(row.id)?;
        Ok(LearningItem {
            id: row.id,
            content: row.content,
            definition: row.definition,
            context: row.context,
            progress: Progress {
                interval: row.interval,
                repetition: row.repetition,
                efactor: row.efactor,
                next_review_at: from_millis(row.next_review_at)?,
                history,
            },
        })
    }
}

/// Raw row of a term joined with its progress.
struct ItemRow {
    id: i64,
    content: String,
    definition: String,
    context: Option<String>,
    interval: i64,
    repetition: i64,
    efactor: f64,
    next_review_at: i64,
}

const ITEM_COLUMNS: &str = "t.id, t.content, t.definition, t.context, \
    p.interval_days, p.repetition, p.efactor, p.next_review_at";

impl TermRepository for SqliteRepository {
    fn add_term(&self, term: &NewTerm, now: DateTime<Utc>) -> Result<LearningItem> {
        let id = self.atomically(|repo| repo.insert_term(term, now))?;
        self.get_item(id)?.ok_or(DbError::TermNotFound(id))
    }

    fn import_terms(&self, terms: &[RawTerm], now: DateTime<Utc>) -> Result<Vec<i64>> {
        self.atomically(|repo| {
            terms
                .iter()
                .map(|raw| repo.insert_term(&NewTerm::from(raw), now))
                .collect()
        })
    }

    fn get_item(&self, id: i64) -> Result<Option<LearningItem>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {ITEM_COLUMNS} FROM terms t JOIN progress p ON p.term_id = t.id WHERE t.id = ?1"
                ),
                params![id],
                Self::row_to_item,
            )
            .optional()?;

        row.map(|row| self.load_item(row)).transpose()
    }

    fn count_terms(&self) -> Result<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM terms", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

impl ProgressRepository for SqliteRepository {
    fn get_due_items(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<LearningItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS}
             FROM terms t
             JOIN progress p ON p.term_id = t.id
             WHERE p.next_review_at <= ?1
             ORDER BY p.next_review_at, t.id
             LIMIT ?2"
        ))?;

        let rows = stmt
            .query_map(params![to_millis(now), limit], Self::row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| self.load_item(row)).collect()
    }

    fn count_due(&self, now: DateTime<Utc>) -> Result<usize> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM progress WHERE next_review_at <= ?1",
                params![to_millis(now)],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    fn get_progress(&self, term_id: i64) -> Result<Option<Progress>> {
        let row = self
            .conn
            .query_row(
                "SELECT interval_days, repetition, efactor, next_review_at FROM progress WHERE term_id = ?1",
                params![term_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((interval, repetition, efactor, next_review_at)) = row else {
            return Ok(None);
        };

        Ok(Some(Progress {
            interval,
            repetition,
            efactor,
            next_review_at: from_millis(next_review_at)?,
            history: self.get_history(term_id)?,
        }))
    }

    fn put_progress(&self, term_id: i64, progress: &Progress) -> Result<()> {
        let stored = self.history_len(term_id)?;
        if progress.history.len() < stored {
            return Err(DbError::InvalidData(format!(
                "history of term {term_id} would shrink from {stored} to {}",
                progress.history.len()
            )));
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO progress (term_id, interval_days, repetition, efactor, next_review_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                term_id,
                progress.interval,
                progress.repetition,
                progress.efactor,
                to_millis(progress.next_review_at),
            ],
        )?;

        for (seq, record) in progress.history.iter().enumerate().skip(stored) {
            self.conn.execute(
                "INSERT INTO review_history (term_id, seq, reviewed_at, grade) VALUES (?1, ?2, ?3, ?4)",
                params![term_id, seq, to_millis(record.reviewed_at), record.grade.value()],
            )?;
        }

        Ok(())
    }
}

impl ProfileRepository for SqliteRepository {
    fn get_profile(&self) -> Result<Option<Profile>> {
        self.conn
            .query_row(
                "SELECT xp, language, preferred_quiz_type FROM profile WHERE id = 1",
                [],
                |row| {
                    let quiz_type: Option<String> = row.get(2)?;
                    Ok(Profile {
                        xp: row.get(0)?,
                        language: row.get(1)?,
                        preferred_quiz_type: quiz_type.and_then(|s| QuizType::from_str(&s)),
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    fn save_profile(&self, profile: &Profile) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO profile (id, xp, language, preferred_quiz_type) VALUES (1, ?1, ?2, ?3)",
            params![
                profile.xp,
                profile.language,
                profile.preferred_quiz_type.map(|t| t.as_str()),
            ],
        )?;
        Ok(())
    }
}

impl Transactional for SqliteRepository {
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn term(content: &str) -> NewTerm {
        NewTerm {
            content: content.to_string(),
            definition: format!("meaning of {content}"),
            context: None,
        }
    }

    #[test]
    fn added_term_is_due_immediately() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let now = Utc::now();
        let item = repo.add_term(&term("ephemeral"), now).unwrap();

        assert_eq!(item.progress.interval, 0);
        assert_eq!(item.progress.repetition, 0);
        assert_eq!(item.progress.efactor, 2.5);
        assert_eq!(repo.get_due_items(10, now).unwrap().len(), 1);
        assert_eq!(repo.count_due(now).unwrap(), 1);
    }

    #[test]
    fn due_items_are_sorted_and_capped() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let now = Utc::now();
        let late = repo.add_term(&term("late"), now - Duration::hours(1)).unwrap();
        let early = repo.add_term(&term("early"), now - Duration::hours(5)).unwrap();
        repo.add_term(&term("future"), now + Duration::days(1)).unwrap();

        let due = repo.get_due_items(10, now).unwrap();
        let ids: Vec<i64> = due.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);

        assert_eq!(repo.get_due_items(1, now).unwrap().len(), 1);
    }

    #[test]
    fn put_progress_appends_history() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let now = Utc::now();
        let item = repo.add_term(&term("laconic"), now).unwrap();

        let mut progress = item.progress.clone();
        progress.history.push(ReviewRecord {
            reviewed_at: now,
            grade: Grade::clamped(4),
        });
        progress.interval = 2;
        progress.repetition = 1;
        repo.put_progress(item.id, &progress).unwrap();

        let stored = repo.get_progress(item.id).unwrap().unwrap();
        assert_eq!(stored.history.len(), 1);
        assert_eq!(stored.interval, 2);
        assert_eq!(stored.history[0].grade.value(), 4);
    }

    #[test]
    fn put_progress_rejects_shrinking_history() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let now = Utc::now();
        let item = repo.add_term(&term("sanguine"), now).unwrap();

        let mut progress = item.progress.clone();
        progress.history.push(ReviewRecord {
            reviewed_at: now,
            grade: Grade::clamped(5),
        });
        repo.put_progress(item.id, &progress).unwrap();

        let result = repo.put_progress(item.id, &item.progress);
        assert!(matches!(result, Err(DbError::InvalidData(_))));
    }

    #[test]
    fn profile_starts_missing() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        assert_eq!(repo.get_profile().unwrap(), None);

        let profile = Profile {
            xp: 42,
            language: "Spanish".to_string(),
            preferred_quiz_type: Some(QuizType::MultipleChoice),
        };
        repo.save_profile(&profile).unwrap();
        assert_eq!(repo.get_profile().unwrap(), Some(profile));
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let result: Result<()> = repo.atomically(|repo| {
            repo.save_profile(&Profile::default())?;
            Err(DbError::InvalidData("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(repo.get_profile().unwrap(), None);
    }

    #[test]
    fn reopened_file_keeps_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.db");
        let now = Utc::now();

        let id = {
            let repo = SqliteRepository::open(&path).unwrap();
            let item = repo.add_term(&term("pellucid"), now).unwrap();
            let mut progress = item.progress;
            progress.history.push(ReviewRecord {
                reviewed_at: now,
                grade: Grade::clamped(3),
            });
            repo.put_progress(item.id, &progress).unwrap();
            item.id
        };

        let repo = SqliteRepository::open(&path).unwrap();
        assert_eq!(repo.count_terms().unwrap(), 1);
        let progress = repo.get_progress(id).unwrap().unwrap();
        assert_eq!(progress.history.len(), 1);
        assert_eq!(progress.history[0].reviewed_at.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn import_is_all_or_nothing() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let terms = vec![
            RawTerm {
                content: "a".to_string(),
                definition: "first".to_string(),
                context: Some("an a".to_string()),
                line_number: 1,
            },
            RawTerm {
                content: "b".to_string(),
                definition: "second".to_string(),
                context: None,
                line_number: 4,
            },
        ];
        let ids = repo.import_terms(&terms, Utc::now()).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(repo.count_terms().unwrap(), 2);

        let item = repo.get_item(ids[0]).unwrap().unwrap();
        assert_eq!(item.context.as_deref(), Some("an a"));
    }
}

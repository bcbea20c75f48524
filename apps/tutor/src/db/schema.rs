//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema for the local database.
///
/// Timestamps are epoch milliseconds. The profile row is not seeded here; it
/// is created the first time XP is awarded.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS terms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    definition TEXT NOT NULL,
    context TEXT,
    created_at INTEGER NOT NULL
);

-- Scheduling state, one row per term
CREATE TABLE IF NOT EXISTS progress (
    term_id INTEGER PRIMARY KEY REFERENCES terms(id) ON DELETE CASCADE,
    interval_days INTEGER NOT NULL DEFAULT 0,
    repetition INTEGER NOT NULL DEFAULT 0,
    efactor REAL NOT NULL DEFAULT 2.5,
    next_review_at INTEGER NOT NULL
);

-- Append-only review log
CREATE TABLE IF NOT EXISTS review_history (
    term_id INTEGER NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
    seq INTEGER NOT NULL,
    reviewed_at INTEGER NOT NULL,
    grade INTEGER NOT NULL,
    PRIMARY KEY (term_id, seq)
);

-- Learner profile (singleton)
CREATE TABLE IF NOT EXISTS profile (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    xp INTEGER NOT NULL DEFAULT 0,
    language TEXT NOT NULL,
    preferred_quiz_type TEXT
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

CREATE INDEX IF NOT EXISTS idx_progress_due ON progress(next_review_at);
"#;

/// Record the schema version if not present.
pub const INIT_SCHEMA_VERSION: &str = r#"
INSERT OR IGNORE INTO schema_version (version) VALUES (1);
"#;

//! Database schema for the feedback store.

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// SQL schema for the feedback database.
pub const SCHEMA: &str = r"
PRAGMA journal_mode = WAL;

-- Feedback: immutable ratings of AI outputs
CREATE TABLE IF NOT EXISTS feedback (
    feedback_id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    module_name TEXT NOT NULL,
    input_text TEXT NOT NULL,
    ai_output TEXT NOT NULL,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment TEXT NOT NULL DEFAULT '',
    feedback_type TEXT NOT NULL CHECK (feedback_type IN ('positive', 'negative', 'suggestion')),
    timestamp TEXT NOT NULL,
    session_id TEXT NOT NULL,
    improvement_suggestion TEXT
);

-- Module analytics: materialized aggregate of feedback per module
CREATE TABLE IF NOT EXISTS module_analytics (
    module_name TEXT PRIMARY KEY NOT NULL,
    avg_rating REAL NOT NULL,
    total_feedback INTEGER NOT NULL,
    positive_count INTEGER NOT NULL,
    negative_count INTEGER NOT NULL,
    suggestion_count INTEGER NOT NULL,
    last_updated TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_feedback_module ON feedback(module_name);
CREATE INDEX IF NOT EXISTS idx_feedback_timestamp ON feedback(timestamp);
";

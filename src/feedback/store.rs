//! Feedback store with async `SQLite` operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tokio::sync::Mutex;

use super::error::FeedbackError;
use super::schema::SCHEMA;
use super::types::{FeedbackRecord, FeedbackType, ModuleAnalytics, NewFeedback};

/// Returns the default path for the feedback database.
///
/// This is `~/.local/share/sdlc-assistant/feedback.db` on Unix systems.
#[must_use]
pub fn default_feedback_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sdlc-assistant")
        .join("feedback.db")
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(table: &'static str, raw: &str) -> Result<DateTime<Utc>, FeedbackError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FeedbackError::CorruptRow {
            table,
            reason: format!("bad timestamp {raw:?}: {e}"),
        })
}

const FEEDBACK_COLUMNS: &str = "feedback_id, user_id, module_name, input_text, ai_output, rating, \
     comment, feedback_type, timestamp, session_id, improvement_suggestion";

/// A feedback row as stored, before decoding enums and timestamps.
struct RawFeedback {
    feedback_id: String,
    user_id: String,
    module_name: String,
    input_text: String,
    ai_output: String,
    rating: i64,
    comment: String,
    feedback_type: String,
    timestamp: String,
    session_id: String,
    improvement_suggestion: Option<String>,
}

impl RawFeedback {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            feedback_id: row.get(0)?,
            user_id: row.get(1)?,
            module_name: row.get(2)?,
            input_text: row.get(3)?,
            ai_output: row.get(4)?,
            rating: row.get(5)?,
            comment: row.get(6)?,
            feedback_type: row.get(7)?,
            timestamp: row.get(8)?,
            session_id: row.get(9)?,
            improvement_suggestion: row.get(10)?,
        })
    }

    fn decode(self) -> Result<FeedbackRecord, FeedbackError> {
        let corrupt = |reason: String| FeedbackError::CorruptRow {
            table: "feedback",
            reason,
        };
        let rating = u8::try_from(self.rating)
            .map_err(|_| corrupt(format!("rating {} out of range", self.rating)))?;
        let feedback_type = self.feedback_type.parse::<FeedbackType>().map_err(corrupt)?;
        let timestamp = parse_timestamp("feedback", &self.timestamp)?;

        Ok(FeedbackRecord {
            feedback_id: self.feedback_id,
            user_id: self.user_id,
            module_name: self.module_name,
            input_text: self.input_text,
            ai_output: self.ai_output,
            rating,
            comment: self.comment,
            feedback_type,
            timestamp,
            session_id: self.session_id,
            improvement_suggestion: self.improvement_suggestion,
        })
    }
}

fn insert_feedback(conn: &Connection, record: &FeedbackRecord) -> Result<(), FeedbackError> {
    conn.execute(
        "INSERT INTO feedback (feedback_id, user_id, module_name, input_text, ai_output, rating, comment, feedback_type, timestamp, session_id, improvement_suggestion)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            record.feedback_id,
            record.user_id,
            record.module_name,
            record.input_text,
            record.ai_output,
            record.rating,
            record.comment,
            record.feedback_type.as_str(),
            format_timestamp(&record.timestamp),
            record.session_id,
            record.improvement_suggestion,
        ],
    )?;
    Ok(())
}

/// Aggregate every feedback row of a module. `None` when the module has none.
fn aggregate(conn: &Connection, module_name: &str) -> Result<Option<ModuleAnalytics>, FeedbackError> {
    let (total, avg, positive, negative, suggestion): (i64, Option<f64>, i64, i64, i64) = conn
        .query_row(
            "SELECT COUNT(*),
                    AVG(rating),
                    COALESCE(SUM(CASE WHEN feedback_type = 'positive' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN feedback_type = 'negative' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN feedback_type = 'suggestion' THEN 1 ELSE 0 END), 0)
             FROM feedback WHERE module_name = ?1",
            params![module_name],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;

    if total == 0 {
        return Ok(None);
    }

    Ok(Some(ModuleAnalytics {
        module_name: module_name.to_string(),
        avg_rating: avg.unwrap_or(0.0),
        total_feedback: total.unsigned_abs(),
        positive_count: positive.unsigned_abs(),
        negative_count: negative.unsigned_abs(),
        suggestion_count: suggestion.unsigned_abs(),
        last_updated: Utc::now().trunc_subsecs(6),
    }))
}

fn upsert_analytics(conn: &Connection, analytics: &ModuleAnalytics) -> Result<(), FeedbackError> {
    conn.execute(
        "INSERT OR REPLACE INTO module_analytics (module_name, avg_rating, total_feedback, positive_count, negative_count, suggestion_count, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            analytics.module_name,
            analytics.avg_rating,
            analytics.total_feedback,
            analytics.positive_count,
            analytics.negative_count,
            analytics.suggestion_count,
            format_timestamp(&analytics.last_updated),
        ],
    )?;
    Ok(())
}

type RawAnalytics = (String, f64, i64, i64, i64, i64, String);

fn raw_analytics(row: &Row<'_>) -> rusqlite::Result<RawAnalytics> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_analytics(raw: RawAnalytics) -> Result<ModuleAnalytics, FeedbackError> {
    let (module_name, avg_rating, total, positive, negative, suggestion, last_updated) = raw;
    Ok(ModuleAnalytics {
        module_name,
        avg_rating,
        total_feedback: total.unsigned_abs(),
        positive_count: positive.unsigned_abs(),
        negative_count: negative.unsigned_abs(),
        suggestion_count: suggestion.unsigned_abs(),
        last_updated: parse_timestamp("module_analytics", &last_updated)?,
    })
}

const ANALYTICS_COLUMNS: &str = "module_name, avg_rating, total_feedback, positive_count, \
     negative_count, suggestion_count, last_updated";

/// Persistent store of feedback records and per-module analytics.
///
/// Uses `SQLite` for persistent storage with async operations via `spawn_blocking`.
/// Writers are serialized by the connection mutex, and each insert commits
/// together with its analytics recompute.
#[derive(Debug, Clone)]
pub struct FeedbackStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl FeedbackStore {
    /// Open a feedback store at the specified path.
    ///
    /// Creates parent directories if they don't exist and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, FeedbackError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| {
                    FeedbackError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, FeedbackError> {
            let conn =
                Connection::open(&path_clone).map_err(|source| FeedbackError::DatabaseOpen {
                    path: path_clone,
                    source,
                })?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| FeedbackError::TaskCancelled)??;

        tracing::debug!(path = %path.display(), "Opened feedback store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory feedback store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, FeedbackError> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection, FeedbackError> {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| FeedbackError::TaskCancelled)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Validate and persist feedback, then recompute its module's analytics.
    ///
    /// The insert and the analytics upsert commit in one transaction; on any
    /// failure neither is applied.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError::Validation` for a bad rating, type, or module
    /// name (nothing is written), or a storage error if the transaction fails.
    pub async fn record(&self, feedback: NewFeedback) -> Result<FeedbackRecord, FeedbackError> {
        let record = feedback.validate().inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected feedback");
        })?;

        let conn = self.conn.clone();
        let to_insert = record.clone();
        let analytics = tokio::task::spawn_blocking(move || -> Result<ModuleAnalytics, FeedbackError> {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            insert_feedback(&tx, &to_insert)?;
            let analytics = aggregate(&tx, &to_insert.module_name)?.ok_or_else(|| {
                FeedbackError::CorruptRow {
                    table: "feedback",
                    reason: "inserted row not visible to aggregate".to_string(),
                }
            })?;
            upsert_analytics(&tx, &analytics)?;
            tx.commit()?;
            Ok(analytics)
        })
        .await
        .map_err(|_| FeedbackError::TaskCancelled)??;

        tracing::info!(
            feedback_id = %record.feedback_id,
            module = %record.module_name,
            rating = record.rating,
            feedback_type = %record.feedback_type,
            avg_rating = analytics.avg_rating,
            total = analytics.total_feedback,
            "Recorded feedback"
        );

        Ok(record)
    }

    /// All feedback for a module, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn query_by_module(
        &self,
        module_name: &str,
    ) -> Result<Vec<FeedbackRecord>, FeedbackError> {
        let module_name = module_name.to_string();
        self.query_feedback(Some(module_name)).await
    }

    /// All feedback across modules, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn query_all(&self) -> Result<Vec<FeedbackRecord>, FeedbackError> {
        self.query_feedback(None).await
    }

    async fn query_feedback(
        &self,
        module_name: Option<String>,
    ) -> Result<Vec<FeedbackRecord>, FeedbackError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<FeedbackRecord>, FeedbackError> {
            let conn = conn.blocking_lock();
            let rows = match &module_name {
                Some(module) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE module_name = ?1
                         ORDER BY timestamp DESC, rowid DESC"
                    ))?;
                    let rows = stmt
                        .query_map(params![module], RawFeedback::from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {FEEDBACK_COLUMNS} FROM feedback
                         ORDER BY timestamp DESC, rowid DESC"
                    ))?;
                    let rows = stmt
                        .query_map([], RawFeedback::from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
            };

            rows.into_iter().map(RawFeedback::decode).collect()
        })
        .await
        .map_err(|_| FeedbackError::TaskCancelled)?
    }

    /// Read the materialized analytics row for a module.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_analytics(
        &self,
        module_name: &str,
    ) -> Result<Option<ModuleAnalytics>, FeedbackError> {
        let module_name = module_name.to_string();
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<ModuleAnalytics>, FeedbackError> {
            let conn = conn.blocking_lock();
            let raw = conn
                .query_row(
                    &format!("SELECT {ANALYTICS_COLUMNS} FROM module_analytics WHERE module_name = ?1"),
                    params![module_name],
                    raw_analytics,
                )
                .optional()?;
            raw.map(decode_analytics).transpose()
        })
        .await
        .map_err(|_| FeedbackError::TaskCancelled)?
    }

    /// Recompute a module's analytics from its feedback rows without storing them.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn compute_analytics(
        &self,
        module_name: &str,
    ) -> Result<Option<ModuleAnalytics>, FeedbackError> {
        let module_name = module_name.to_string();
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            aggregate(&conn, &module_name)
        })
        .await
        .map_err(|_| FeedbackError::TaskCancelled)?
    }

    /// Every materialized analytics row, ordered by module name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_analytics(&self) -> Result<Vec<ModuleAnalytics>, FeedbackError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<ModuleAnalytics>, FeedbackError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {ANALYTICS_COLUMNS} FROM module_analytics ORDER BY module_name"
            ))?;
            let rows = stmt
                .query_map([], raw_analytics)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(decode_analytics).collect()
        })
        .await
        .map_err(|_| FeedbackError::TaskCancelled)?
    }

    /// Count total feedback records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_feedback(&self) -> Result<u64, FeedbackError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<u64, FeedbackError> {
            let conn = conn.blocking_lock();
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM feedback", [], |row| row.get(0))?;
            Ok(count.unsigned_abs())
        })
        .await
        .map_err(|_| FeedbackError::TaskCancelled)?
    }
}

//! Feedback records and module analytics.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{FieldError, ValidationError};

/// Lowest accepted rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i64 = 5;

/// Category of a piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Positive,
    Negative,
    Suggestion,
}

impl FeedbackType {
    pub const ALL: [FeedbackType; 3] = [Self::Positive, Self::Negative, Self::Suggestion];

    /// Returns the string representation for database storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Suggestion => "suggestion",
        }
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "suggestion" => Ok(Self::Suggestion),
            other => Err(format!(
                "must be one of positive, negative, suggestion, got {other:?}"
            )),
        }
    }
}

/// Feedback as submitted, before validation.
///
/// `rating` and `feedback_type` are kept raw so that out-of-range values can
/// be reported instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    #[serde(default)]
    pub feedback_id: Option<String>,
    pub user_id: String,
    pub module_name: String,
    #[serde(default)]
    pub input_text: String,
    #[serde(default)]
    pub ai_output: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
    pub feedback_type: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub improvement_suggestion: Option<String>,
}

impl NewFeedback {
    /// Create feedback with the required fields; the rest default to empty.
    pub fn new(
        user_id: impl Into<String>,
        module_name: impl Into<String>,
        rating: i64,
        feedback_type: impl Into<String>,
    ) -> Self {
        Self {
            feedback_id: None,
            user_id: user_id.into(),
            module_name: module_name.into(),
            input_text: String::new(),
            ai_output: String::new(),
            rating,
            comment: String::new(),
            feedback_type: feedback_type.into(),
            timestamp: None,
            session_id: String::new(),
            improvement_suggestion: None,
        }
    }

    #[must_use]
    pub fn input_text(mut self, text: impl Into<String>) -> Self {
        self.input_text = text.into();
        self
    }

    #[must_use]
    pub fn ai_output(mut self, text: impl Into<String>) -> Self {
        self.ai_output = text.into();
        self
    }

    #[must_use]
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = text.into();
        self
    }

    #[must_use]
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = id.into();
        self
    }

    #[must_use]
    pub fn improvement_suggestion(mut self, text: impl Into<String>) -> Self {
        self.improvement_suggestion = Some(text.into());
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn feedback_id(mut self, id: impl Into<String>) -> Self {
        self.feedback_id = Some(id.into());
        self
    }

    /// Check every field and build the record to persist.
    ///
    /// Missing ids and timestamps are generated here. Timestamps are truncated
    /// to microseconds, the precision they are stored with.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming every field that failed.
    pub fn validate(self) -> Result<FeedbackRecord, ValidationError> {
        let mut errors = Vec::new();

        let rating = u8::try_from(self.rating)
            .ok()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(&i64::from(*r)));
        if rating.is_none() {
            errors.push(FieldError {
                field: "rating",
                message: format!(
                    "must be between {MIN_RATING} and {MAX_RATING}, got {}",
                    self.rating
                ),
            });
        }

        let feedback_type = match self.feedback_type.parse::<FeedbackType>() {
            Ok(t) => Some(t),
            Err(message) => {
                errors.push(FieldError {
                    field: "feedback_type",
                    message,
                });
                None
            }
        };

        if self.module_name.trim().is_empty() {
            errors.push(FieldError {
                field: "module_name",
                message: "must not be empty".to_string(),
            });
        }

        let (Some(rating), Some(feedback_type)) = (rating, feedback_type) else {
            return Err(ValidationError { errors });
        };
        if !errors.is_empty() {
            return Err(ValidationError { errors });
        }

        Ok(FeedbackRecord {
            feedback_id: self
                .feedback_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: self.user_id,
            module_name: self.module_name,
            input_text: self.input_text,
            ai_output: self.ai_output,
            rating,
            comment: self.comment,
            feedback_type,
            timestamp: self.timestamp.unwrap_or_else(Utc::now).trunc_subsecs(6),
            session_id: self.session_id,
            improvement_suggestion: self.improvement_suggestion,
        })
    }
}

/// A persisted, immutable rating of an AI output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub feedback_id: String,
    pub user_id: String,
    pub module_name: String,
    pub input_text: String,
    pub ai_output: String,
    pub rating: u8,
    pub comment: String,
    pub feedback_type: FeedbackType,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub improvement_suggestion: Option<String>,
}

/// Aggregate statistics for one module's feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleAnalytics {
    pub module_name: String,
    pub avg_rating: f64,
    pub total_feedback: u64,
    pub positive_count: u64,
    pub negative_count: u64,
    pub suggestion_count: u64,
    pub last_updated: DateTime<Utc>,
}

impl ModuleAnalytics {
    /// True when both describe the same aggregate, ignoring `last_updated`.
    #[must_use]
    pub fn same_totals(&self, other: &Self) -> bool {
        self.module_name == other.module_name
            && (self.avg_rating - other.avg_rating).abs() < 1e-9
            && self.total_feedback == other.total_feedback
            && self.positive_count == other.positive_count
            && self.negative_count == other.negative_count
            && self.suggestion_count == other.suggestion_count
    }
}

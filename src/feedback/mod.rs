//! Feedback store: validated ratings of AI outputs with per-module analytics.
//!
//! Records live in `SQLite`. Every insert recomputes the module's analytics row
//! in the same transaction.

mod error;
mod export;
mod schema;
mod store;
mod types;

pub use error::{FeedbackError, FieldError, ValidationError};
pub use export::export_file_name;
pub use schema::{SCHEMA, SCHEMA_VERSION};
pub use store::{default_feedback_path, FeedbackStore};
pub use types::{
    FeedbackRecord, FeedbackType, ModuleAnalytics, NewFeedback, MAX_RATING, MIN_RATING,
};

//! JSON export of stored feedback.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;

use super::error::FeedbackError;
use super::store::FeedbackStore;

/// File name for an export taken at `at`.
///
/// `None` exports every module and is named `feedback_export_all_...`.
/// Characters that are unsafe in file names are replaced with `_`.
#[must_use]
pub fn export_file_name(module_name: Option<&str>, at: &DateTime<Local>) -> String {
    let label = module_name.map_or_else(
        || "all".to_string(),
        |m| {
            m.chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect()
        },
    );
    format!("feedback_export_{label}_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// `name` with `_<n>` inserted before the extension, or unchanged for `n == 0`.
fn numbered(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{n}.{ext}"),
        None => format!("{name}_{n}"),
    }
}

/// Write `content` to a file in `dir` that did not exist before.
///
/// Taken names get a numeric suffix, so earlier exports are never overwritten.
async fn write_new_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf, FeedbackError> {
    for n in 0..=u32::MAX {
        let path = dir.join(numbered(name, n));
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        let mut file = match file {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(FeedbackError::Io { path, source }),
        };
        if let Err(source) = file.write_all(content.as_bytes()).await {
            return Err(FeedbackError::Io { path, source });
        }
        if let Err(source) = file.flush().await {
            return Err(FeedbackError::Io { path, source });
        }
        return Ok(path);
    }
    Err(FeedbackError::Io {
        path: dir.join(name),
        source: std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free export file name",
        ),
    })
}

impl FeedbackStore {
    /// Write feedback as a pretty-printed JSON array into `dir`.
    ///
    /// Exports one module, or every module when `module_name` is `None`.
    /// Records are newest first, as returned by the queries. Returns the
    /// path of the written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the file cannot be written.
    pub async fn export(
        &self,
        module_name: Option<&str>,
        dir: impl AsRef<Path>,
    ) -> Result<PathBuf, FeedbackError> {
        let dir = dir.as_ref();
        let records = match module_name {
            Some(module) => self.query_by_module(module).await?,
            None => self.query_all().await?,
        };
        let json = serde_json::to_string_pretty(&records)?;

        if !dir.as_os_str().is_empty() && !dir.exists() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| FeedbackError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let name = export_file_name(module_name, &Local::now());
        let path = write_new_file(dir, &name, &json).await?;

        tracing::info!(
            path = %path.display(),
            module = module_name.unwrap_or("all"),
            records = records.len(),
            "Exported feedback"
        );

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::feedback::{FeedbackRecord, NewFeedback};

    #[test]
    fn test_export_file_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            export_file_name(Some("code_generator"), &at),
            "feedback_export_code_generator_20240309_140507.json"
        );
        assert_eq!(
            export_file_name(None, &at),
            "feedback_export_all_20240309_140507.json"
        );
        assert_eq!(
            export_file_name(Some("../etc/x y"), &at),
            "feedback_export____etc_x_y_20240309_140507.json"
        );
    }

    #[tokio::test]
    async fn test_export_matches_query() {
        let store = FeedbackStore::open_in_memory().await.unwrap();
        for (rating, kind) in [(5, "positive"), (2, "negative")] {
            store
                .record(NewFeedback::new("u1", "tester", rating, kind).ai_output("ok"))
                .await
                .unwrap();
        }
        store
            .record(NewFeedback::new("u1", "other", 3, "suggestion"))
            .await
            .unwrap();

        let temp_dir = tempfile::tempdir().unwrap();
        let path = store.export(Some("tester"), temp_dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("feedback_export_tester_"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  "), "expected pretty JSON");
        let parsed: Vec<FeedbackRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, store.query_by_module("tester").await.unwrap());
    }

    #[tokio::test]
    async fn test_export_all_creates_dir() {
        let store = FeedbackStore::open_in_memory().await.unwrap();
        store
            .record(NewFeedback::new("u1", "a", 4, "positive"))
            .await
            .unwrap();

        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("exports");
        let path = store.export(None, &out).await.unwrap();
        assert!(path.starts_with(&out));

        let parsed: Vec<FeedbackRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_numbered() {
        assert_eq!(numbered("a.json", 0), "a.json");
        assert_eq!(numbered("a.json", 2), "a_2.json");
        assert_eq!(numbered("plain", 1), "plain_1");
    }

    #[tokio::test]
    async fn test_repeated_exports_do_not_overwrite() {
        let store = FeedbackStore::open_in_memory().await.unwrap();
        store
            .record(NewFeedback::new("u1", "a b", 4, "positive"))
            .await
            .unwrap();
        store
            .record(NewFeedback::new("u1", "a_b", 1, "negative"))
            .await
            .unwrap();

        let temp_dir = tempfile::tempdir().unwrap();
        let first = store.export(Some("a b"), temp_dir.path()).await.unwrap();
        let second = store.export(Some("a_b"), temp_dir.path()).await.unwrap();
        let third = store.export(Some("a b"), temp_dir.path()).await.unwrap();

        assert_ne!(first, second);
        assert_ne!(first, third);
        assert_ne!(second, third);

        let read = |path: &PathBuf| -> Vec<FeedbackRecord> {
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
        };
        assert_eq!(read(&first)[0].module_name, "a b");
        assert_eq!(read(&second)[0].module_name, "a_b");
        assert_eq!(read(&third)[0].module_name, "a b");
    }

    #[tokio::test]
    async fn test_write_new_file_suffixes_taken_name() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("out.json"), "old").unwrap();

        let path = write_new_file(temp_dir.path(), "out.json", "new").await.unwrap();

        assert_eq!(path, temp_dir.path().join("out_1.json"));
        assert_eq!(std::fs::read_to_string(temp_dir.path().join("out.json")).unwrap(), "old");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_export_empty_module_writes_empty_array() {
        let store = FeedbackStore::open_in_memory().await.unwrap();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = store.export(Some("none"), temp_dir.path()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}

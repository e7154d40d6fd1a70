//! Integration tests for the feedback store.

use sdlc_assistant::feedback::{
    FeedbackError, FeedbackRecord, FeedbackStore, FeedbackType, NewFeedback,
};

fn rating(module: &str, rating: i64, kind: &str) -> NewFeedback {
    NewFeedback::new("user-7", module, rating, kind)
        .input_text("Generate a REST handler")
        .ai_output("async fn handler() {}")
        .session_id("s-1")
}

#[tokio::test]
async fn test_analytics_after_three_ratings() {
    let store = FeedbackStore::open_in_memory().await.unwrap();
    for (value, kind) in [(5, "positive"), (3, "negative"), (4, "positive")] {
        store.record(rating("code_generator", value, kind)).await.unwrap();
    }

    let analytics = store
        .get_analytics("code_generator")
        .await
        .unwrap()
        .expect("analytics row");
    assert!((analytics.avg_rating - 4.0).abs() < 1e-9);
    assert_eq!(analytics.total_feedback, 3);
    assert_eq!(analytics.positive_count, 2);
    assert_eq!(analytics.negative_count, 1);
    assert_eq!(analytics.suggestion_count, 0);

    let fresh = store.compute_analytics("code_generator").await.unwrap().unwrap();
    assert!(analytics.same_totals(&fresh));
}

#[tokio::test]
async fn test_rating_bounds() {
    let store = FeedbackStore::open_in_memory().await.unwrap();

    for bad in [0, 6] {
        let err = store.record(rating("m", bad, "positive")).await.unwrap_err();
        match err {
            FeedbackError::Validation(v) => assert_eq!(v.fields(), vec!["rating"]),
            other => panic!("expected validation error, got {other}"),
        }
    }
    for good in [1, 5] {
        store.record(rating("m", good, "positive")).await.unwrap();
    }

    assert_eq!(store.count_feedback().await.unwrap(), 2);
}

#[tokio::test]
async fn test_unknown_module_is_empty() {
    let store = FeedbackStore::open_in_memory().await.unwrap();
    store.record(rating("known", 4, "suggestion")).await.unwrap();

    assert!(store.query_by_module("unknown").await.unwrap().is_empty());
    assert!(store.get_analytics("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn test_export_round_trip() {
    let store = FeedbackStore::open_in_memory().await.unwrap();
    store
        .record(
            rating("docs", 2, "suggestion")
                .comment("missing examples")
                .improvement_suggestion("include a code sample"),
        )
        .await
        .unwrap();
    store.record(rating("docs", 5, "positive")).await.unwrap();

    let temp_dir = tempfile::tempdir().unwrap();
    let path = store.export(Some("docs"), temp_dir.path()).await.unwrap();

    let exported: Vec<FeedbackRecord> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let queried = store.query_by_module("docs").await.unwrap();
    assert_eq!(exported, queried);
    assert!(exported
        .iter()
        .any(|r| r.feedback_type == FeedbackType::Suggestion
            && r.improvement_suggestion.as_deref() == Some("include a code sample")));
}

#[tokio::test]
async fn test_persists_across_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("feedback.db");

    let recorded = {
        let store = FeedbackStore::open(&db_path).await.unwrap();
        store.record(rating("reviewer", 3, "negative")).await.unwrap()
    };

    let store = FeedbackStore::open(&db_path).await.unwrap();
    assert_eq!(store.query_by_module("reviewer").await.unwrap(), vec![recorded]);
    let analytics = store.get_analytics("reviewer").await.unwrap().unwrap();
    assert_eq!(analytics.total_feedback, 1);
    assert_eq!(analytics.negative_count, 1);
}

#[tokio::test]
async fn test_concurrent_submissions_same_module() {
    let store = FeedbackStore::open_in_memory().await.unwrap();

    let tasks: Vec<_> = (0..30)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let kind = match i % 3 {
                    0 => "positive",
                    1 => "negative",
                    _ => "suggestion",
                };
                store.record(rating("shared", 4, kind)).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let analytics = store.get_analytics("shared").await.unwrap().unwrap();
    assert_eq!(analytics.total_feedback, 30);
    assert_eq!(analytics.positive_count, 10);
    assert_eq!(analytics.negative_count, 10);
    assert_eq!(analytics.suggestion_count, 10);
    assert!((analytics.avg_rating - 4.0).abs() < 1e-9);
}

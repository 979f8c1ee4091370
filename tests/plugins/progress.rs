use coursekit::core::store::FsDocumentStore;
use coursekit::plugins::course::{CourseRepository, NewCourse};
use coursekit::plugins::progress::{CompletionInput, ProgressRecorder, ResultsInput};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::tempdir;

fn completion(slug: &str, chapter: &str, topics: &[&str]) -> CompletionInput {
    CompletionInput {
        slug: slug.to_string(),
        chapter_id: chapter.to_string(),
        topics: topics.iter().map(|t| t.to_string()).collect(),
    }
}

fn results(slug: &str, total: u32, correct: u32) -> ResultsInput {
    ResultsInput {
        slug: slug.to_string(),
        total_answers: total,
        correct_answers: correct,
    }
}

#[test]
fn test_completion_unions_sets_and_leaves_scores_alone() {
    let tmp = tempdir().expect("tempdir");
    let recorder = ProgressRecorder::open(tmp.path()).expect("open");

    recorder
        .record_completion("alice", &completion("demo", "ch1", &["t1", "t2"]))
        .expect("first");
    let progress = recorder
        .record_completion("alice", &completion("demo", "ch1", &["t2", "t3"]))
        .expect("second");

    assert_eq!(
        progress.completed_chapters.iter().collect::<Vec<_>>(),
        ["ch1"]
    );
    assert_eq!(
        progress.completed_topics.iter().collect::<Vec<_>>(),
        ["t1", "t2", "t3"]
    );
    assert_eq!(progress.score, None);
    assert_eq!(progress.final_score, None);

    let stored = recorder.get("alice", "demo").expect("get").expect("row");
    assert_eq!(stored, progress);
}

#[test]
fn test_results_overwrite_scalars_and_keep_sets() {
    let tmp = tempdir().expect("tempdir");
    let recorder = ProgressRecorder::open(tmp.path()).expect("open");

    recorder
        .record_completion("alice", &completion("demo", "ch1", &["t1"]))
        .expect("completion");
    recorder
        .record_results("alice", &results("demo", 10, 3))
        .expect("first results");
    let progress = recorder
        .record_results("alice", &results("demo", 5, 4))
        .expect("second results");

    assert_eq!(progress.total_answers, Some(5));
    assert_eq!(progress.correct_answers, Some(4));
    assert_eq!(progress.score, Some(4));
    assert_eq!(progress.final_score, Some(80));
    assert_eq!(progress.completed_chapters.len(), 1);
    assert_eq!(progress.completed_topics.len(), 1);
}

#[test]
fn test_results_with_no_answers_score_zero() {
    let tmp = tempdir().expect("tempdir");
    let recorder = ProgressRecorder::open(tmp.path()).expect("open");

    let progress = recorder
        .record_results("alice", &results("demo", 0, 0))
        .expect("results");
    assert_eq!(progress.final_score, Some(0));
}

#[test]
fn test_progress_is_per_user() {
    let tmp = tempdir().expect("tempdir");
    let recorder = ProgressRecorder::open(tmp.path()).expect("open");

    recorder
        .record_completion("alice", &completion("demo", "ch1", &[]))
        .expect("alice");
    assert!(recorder.get("bob", "demo").expect("get").is_none());
    assert!(recorder.list_for_user("bob").expect("list").is_empty());
}

#[test]
fn test_dashboard_counts_and_titles() {
    let tmp = tempdir().expect("tempdir");
    let recorder = ProgressRecorder::open(tmp.path()).expect("open");
    let courses = CourseRepository::new(Arc::new(FsDocumentStore::new(tmp.path().join("courses"))));
    courses
        .create(NewCourse {
            slug: "demo".to_string(),
            title: "Demo Course".to_string(),
            description: None,
            chapters: None,
        })
        .expect("create");

    recorder
        .record_results("alice", &results("demo", 5, 4))
        .expect("results");
    recorder
        .record_completion("alice", &completion("demo", "ch1", &["t1", "t2"]))
        .expect("completion");
    recorder
        .record_completion("alice", &completion("archived", "ch9", &[]))
        .expect("completion on deleted course");

    let rows = recorder.dashboard("alice", &courses).expect("dashboard");
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].slug, "archived");
    assert_eq!(rows[0].title, Value::Null);
    assert_eq!(rows[0].final_score, None);

    assert_eq!(rows[1].slug, "demo");
    assert_eq!(rows[1].title, json!("Demo Course"));
    assert_eq!(rows[1].score, Some(4));
    assert_eq!(rows[1].total_answers, Some(5));
    assert_eq!(rows[1].correct_answers, Some(4));
    assert_eq!(rows[1].final_score, Some(80));
    assert_eq!(rows[1].completed_chapters, 1);
    assert_eq!(rows[1].completed_topics, 2);
}

#[test]
fn test_reopen_keeps_rows() {
    let tmp = tempdir().expect("tempdir");
    ProgressRecorder::open(tmp.path())
        .expect("open")
        .record_results("alice", &results("demo", 2, 1))
        .expect("results");

    let reopened = ProgressRecorder::open(tmp.path()).expect("reopen");
    let progress = reopened.get("alice", "demo").expect("get").expect("row");
    assert_eq!(progress.final_score, Some(50));
}

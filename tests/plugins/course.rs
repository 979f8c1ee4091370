use coursekit::core::error::CoursekitError;
use coursekit::core::store::FsDocumentStore;
use coursekit::plugins::course::{Chapter, CourseRepository, CourseUpdate, NewCourse};
use coursekit::plugins::quiz::{Question, Quiz, QuizRepository};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn repos(root: &Path) -> (CourseRepository, QuizRepository) {
    let store = Arc::new(FsDocumentStore::new(root));
    (CourseRepository::new(store.clone()), QuizRepository::new(store))
}

fn new_course(slug: &str, title: &str) -> NewCourse {
    NewCourse {
        slug: slug.to_string(),
        title: title.to_string(),
        description: None,
        chapters: None,
    }
}

#[test]
fn test_list_is_sorted_and_skips_directories_without_metadata() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());

    courses.create(new_course("beta", "Beta")).expect("create beta");
    courses.create(new_course("alpha", "Alpha")).expect("create alpha");
    fs::create_dir(tmp.path().join("orphan")).expect("orphan dir");
    fs::write(tmp.path().join("stray.json"), "{}").expect("stray file");

    let listed = courses.list().expect("list");
    let slugs: Vec<&str> = listed.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, ["alpha", "beta"]);
    assert_eq!(listed[0].title, json!("Alpha"));
    assert_eq!(listed[0].description, Value::Null);
}

#[test]
fn test_list_on_missing_root_is_empty() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(&tmp.path().join("never-created"));
    assert!(courses.list().expect("list").is_empty());
}

#[test]
fn test_create_twice_is_already_exists() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());

    courses.create(new_course("demo", "Demo")).expect("first create");
    let err = courses.create(new_course("demo", "Again")).unwrap_err();
    assert!(matches!(err, CoursekitError::AlreadyExists("Course")));

    // The first document is untouched.
    assert_eq!(courses.get("demo").expect("get")["title"], json!("Demo"));
}

#[test]
fn test_create_over_orphan_directory_succeeds() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());
    fs::create_dir(tmp.path().join("demo")).expect("orphan dir");

    courses.create(new_course("demo", "Demo")).expect("create");
    assert_eq!(courses.list().expect("list").len(), 1);
}

#[test]
fn test_create_drops_nulls_but_get_keeps_them() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());

    let created = courses.create(new_course("demo", "Demo")).expect("create");
    assert!(!created.contains_key("description"));
    assert_eq!(created["chapters"], json!([]));
    assert_eq!(created["slug"], json!("demo"));
    assert!(!created.contains_key("id"));

    let fetched = courses.get("demo").expect("get");
    assert_eq!(fetched["description"], Value::Null);
    assert_eq!(fetched["id"], json!("demo"));
    assert_eq!(fetched["slug"], json!("demo"));
}

#[test]
fn test_stored_document_shape() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());

    courses
        .create(NewCourse {
            slug: "demo".to_string(),
            title: "Demo".to_string(),
            description: Some("About".to_string()),
            chapters: Some(vec![Chapter {
                id: "001-intro".to_string(),
                title: "Intro".to_string(),
            }]),
        })
        .expect("create");

    let raw = fs::read_to_string(tmp.path().join("demo").join("chapters.json")).expect("read");
    let stored: Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(
        stored,
        json!({
            "id": "demo",
            "title": "Demo",
            "description": "About",
            "chapters": [{"id": "001-intro", "title": "Intro"}]
        })
    );
}

#[test]
fn test_update_merges_only_present_fields() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());
    courses
        .create(NewCourse {
            slug: "demo".to_string(),
            title: "Demo".to_string(),
            description: Some("About".to_string()),
            chapters: Some(vec![Chapter {
                id: "001-intro".to_string(),
                title: "Intro".to_string(),
            }]),
        })
        .expect("create");

    let updated = courses
        .update(
            "demo",
            CourseUpdate {
                title: Some("Renamed".to_string()),
                ..CourseUpdate::default()
            },
        )
        .expect("update title");
    assert_eq!(updated["title"], json!("Renamed"));
    assert_eq!(updated["description"], json!("About"));
    assert_eq!(updated["chapters"][0]["id"], json!("001-intro"));

    let updated = courses
        .update(
            "demo",
            CourseUpdate {
                description: Some(None),
                chapters: Some(None),
                ..CourseUpdate::default()
            },
        )
        .expect("update nulls");
    assert_eq!(updated["title"], json!("Renamed"));
    assert_eq!(updated["description"], Value::Null);
    assert_eq!(updated["chapters"], json!([]));
    assert_eq!(updated["slug"], json!("demo"));
}

#[test]
fn test_update_backfills_missing_id() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());
    fs::create_dir(tmp.path().join("legacy")).expect("dir");
    fs::write(
        tmp.path().join("legacy").join("chapters.json"),
        r#"{"title": "Legacy"}"#,
    )
    .expect("write");

    let updated = courses
        .update("legacy", CourseUpdate::default())
        .expect("update");
    assert_eq!(updated["id"], json!("legacy"));
    assert_eq!(updated["title"], json!("Legacy"));
}

#[test]
fn test_update_missing_course_is_not_found() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());
    let err = courses.update("ghost", CourseUpdate::default()).unwrap_err();
    assert!(matches!(err, CoursekitError::NotFound("Course")));
}

#[test]
fn test_corrupt_metadata_reads_as_empty() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());
    fs::create_dir(tmp.path().join("broken")).expect("dir");
    fs::write(tmp.path().join("broken").join("chapters.json"), "{not json").expect("write");

    let doc = courses.get("broken").expect("get");
    assert_eq!(Value::Object(doc), json!({"slug": "broken"}));

    let listed = courses.list().expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, Value::Null);
}

#[test]
fn test_delete_removes_nested_quizzes() {
    let tmp = tempdir().expect("tempdir");
    let (courses, quizzes) = repos(tmp.path());
    courses.create(new_course("demo", "Demo")).expect("create");
    quizzes
        .upsert(
            "demo",
            "001-intro",
            &Quiz {
                title: "Quiz".to_string(),
                questions: vec![Question {
                    id: None,
                    kind: None,
                    question: "1+1?".to_string(),
                    options: vec!["1".to_string(), "2".to_string()],
                    correct_index: 1,
                    explanation: None,
                }],
            },
        )
        .expect("quiz");

    courses.delete("demo").expect("delete");
    assert!(!tmp.path().join("demo").exists());
    assert!(matches!(
        courses.get("demo").unwrap_err(),
        CoursekitError::NotFound("Course")
    ));
    assert!(matches!(
        quizzes.get("demo", "001-intro").unwrap_err(),
        CoursekitError::NotFound("Quiz")
    ));
    assert!(matches!(
        courses.delete("demo").unwrap_err(),
        CoursekitError::NotFound("Course")
    ));
}

#[test]
fn test_delete_accepts_directory_without_metadata() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(tmp.path());
    fs::create_dir(tmp.path().join("orphan")).expect("dir");

    courses.delete("orphan").expect("delete");
    assert!(!tmp.path().join("orphan").exists());
}

#[test]
fn test_unsafe_slugs_read_as_not_found_everywhere() {
    let tmp = tempdir().expect("tempdir");
    let (courses, _) = repos(&tmp.path().join("courses"));
    fs::create_dir_all(tmp.path().join("courses")).expect("root");
    // A sibling of the store root that a traversal would reach.
    fs::write(tmp.path().join("chapters.json"), r#"{"title": "secret"}"#).expect("bait");

    for slug in ["..", "", "../courses", "a/b", "/etc", "x..y"] {
        assert!(
            matches!(courses.get(slug).unwrap_err(), CoursekitError::NotFound("Course")),
            "get {:?}",
            slug
        );
        assert!(
            matches!(
                courses.update(slug, CourseUpdate::default()).unwrap_err(),
                CoursekitError::NotFound("Course")
            ),
            "update {:?}",
            slug
        );
        assert!(
            matches!(courses.delete(slug).unwrap_err(), CoursekitError::NotFound("Course")),
            "delete {:?}",
            slug
        );
        assert!(
            matches!(
                courses.create(new_course(slug, "x")).unwrap_err(),
                CoursekitError::NotFound("Course")
            ),
            "create {:?}",
            slug
        );
    }
    assert!(tmp.path().join("chapters.json").exists());
}

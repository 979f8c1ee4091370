//! Per-user course progress.
//!
//! One `course_user` row per (user, course). Completion submissions add to the
//! completed chapter/topic sets; result submissions overwrite the score
//! columns. Rows are never deleted here, including when the course itself is.

use crate::core::db;
use crate::core::error::CoursekitError;
use crate::core::time;
use crate::core::validate::Validator;
use crate::plugins::course::CourseRepository;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Scores live in unsigned 16-bit columns upstream of the dashboard.
const MAX_ANSWERS: u64 = 65_535;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub user_id: String,
    pub course_slug: String,
    pub score: Option<u32>,
    pub total_answers: Option<u32>,
    pub correct_answers: Option<u32>,
    pub final_score: Option<u32>,
    pub completed_chapters: BTreeSet<String>,
    pub completed_topics: BTreeSet<String>,
    pub updated_at: String,
}

impl Progress {
    fn empty(user_id: &str, course_slug: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            course_slug: course_slug.to_string(),
            score: None,
            total_answers: None,
            correct_answers: None,
            final_score: None,
            completed_chapters: BTreeSet::new(),
            completed_topics: BTreeSet::new(),
            updated_at: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionInput {
    pub slug: String,
    pub chapter_id: String,
    pub topics: Vec<String>,
}

impl CompletionInput {
    pub fn from_request(body: &Value) -> Result<Self, CoursekitError> {
        let mut v = Validator::new();

        let slug = v.required_string("slug", body.get("slug"), None, Some("Course slug is required."));
        let chapter_id = v.required_string(
            "chapter_id",
            body.get("chapter_id"),
            None,
            Some("Chapter id is required."),
        );

        let mut topics = Vec::new();
        let listed = v
            .nullable_array(
                "topics",
                body.get("topics"),
                Some("Topics must be a list of topic identifiers."),
            )
            .into_option()
            .flatten();
        for (idx, topic) in listed.into_iter().flatten().enumerate() {
            match topic {
                Value::String(s) => topics.push(s.clone()),
                _ => v.fail(
                    &format!("topics.{}", idx),
                    "Each topic identifier must be a string.",
                ),
            }
        }

        v.finish()?;
        Ok(Self {
            slug: slug.unwrap_or_default(),
            chapter_id: chapter_id.unwrap_or_default(),
            topics,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsInput {
    pub slug: String,
    pub total_answers: u32,
    pub correct_answers: u32,
}

impl ResultsInput {
    pub fn from_request(body: &Value) -> Result<Self, CoursekitError> {
        let mut v = Validator::new();

        let slug = v.required_string("slug", body.get("slug"), None, Some("Course slug is required."));
        let total = v.required_integer(
            "total_answers",
            body.get("total_answers"),
            0,
            Some(MAX_ANSWERS),
            Some("Total answers is required."),
        );
        let correct = v.required_integer(
            "correct_answers",
            body.get("correct_answers"),
            0,
            Some(MAX_ANSWERS),
            Some("Correct answers is required."),
        );
        if let (Some(total), Some(correct)) = (total, correct)
            && correct > total
        {
            v.fail("correct_answers", "Correct answers cannot exceed total answers.");
        }

        v.finish()?;
        // Both are capped at MAX_ANSWERS above.
        Ok(Self {
            slug: slug.unwrap_or_default(),
            total_answers: total.unwrap_or_default() as u32,
            correct_answers: correct.unwrap_or_default() as u32,
        })
    }

    /// Percentage of correct answers, rounded; 0 when nothing was answered.
    pub fn final_score(&self) -> u32 {
        if self.total_answers == 0 {
            return 0;
        }
        (f64::from(self.correct_answers) * 100.0 / f64::from(self.total_answers)).round() as u32
    }
}

/// One dashboard row: a course the user has progress in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardCourse {
    pub slug: String,
    /// Null when the course document no longer exists.
    pub title: Value,
    pub score: Option<u32>,
    pub total_answers: Option<u32>,
    pub correct_answers: Option<u32>,
    pub final_score: Option<u32>,
    pub completed_chapters: usize,
    pub completed_topics: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressRecorder {
    db_path: PathBuf,
}

impl ProgressRecorder {
    /// Open the ledger under `data_dir`, creating the table if needed.
    pub fn open(data_dir: &Path) -> Result<Self, CoursekitError> {
        db::initialize_progress_db(data_dir)?;
        Ok(Self {
            db_path: db::progress_db_path(data_dir),
        })
    }

    pub fn record_completion(
        &self,
        user_id: &str,
        input: &CompletionInput,
    ) -> Result<Progress, CoursekitError> {
        let progress = self.merge(user_id, &input.slug, |p| {
            p.completed_chapters.insert(input.chapter_id.clone());
            p.completed_topics.extend(input.topics.iter().cloned());
        })?;
        info!(user_id, slug = %input.slug, chapter = %input.chapter_id, "completion recorded");
        Ok(progress)
    }

    pub fn record_results(
        &self,
        user_id: &str,
        input: &ResultsInput,
    ) -> Result<Progress, CoursekitError> {
        let final_score = input.final_score();
        let progress = self.merge(user_id, &input.slug, |p| {
            p.score = Some(input.correct_answers);
            p.total_answers = Some(input.total_answers);
            p.correct_answers = Some(input.correct_answers);
            p.final_score = Some(final_score);
        })?;
        info!(user_id, slug = %input.slug, final_score, "quiz results recorded");
        Ok(progress)
    }

    pub fn get(&self, user_id: &str, slug: &str) -> Result<Option<Progress>, CoursekitError> {
        let conn = db::db_connect(&self.db_path)?;
        load(&conn, user_id, slug)
    }

    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Progress>, CoursekitError> {
        let conn = db::db_connect(&self.db_path)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM course_user WHERE user_id = ?1 ORDER BY course_slug",
            COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Progress rows joined with course titles from the document store.
    pub fn dashboard(
        &self,
        user_id: &str,
        courses: &CourseRepository,
    ) -> Result<Vec<DashboardCourse>, CoursekitError> {
        let mut out = Vec::new();
        for progress in self.list_for_user(user_id)? {
            let title = match courses.get(&progress.course_slug) {
                Ok(doc) => doc.get("title").cloned().unwrap_or(Value::Null),
                Err(CoursekitError::NotFound(_)) => Value::Null,
                Err(e) => return Err(e),
            };
            out.push(DashboardCourse {
                slug: progress.course_slug,
                title,
                score: progress.score,
                total_answers: progress.total_answers,
                correct_answers: progress.correct_answers,
                final_score: progress.final_score,
                completed_chapters: progress.completed_chapters.len(),
                completed_topics: progress.completed_topics.len(),
            });
        }
        Ok(out)
    }

    /// Load-or-create the row, apply `f`, and write it back in one transaction.
    fn merge<F>(&self, user_id: &str, slug: &str, f: F) -> Result<Progress, CoursekitError>
    where
        F: FnOnce(&mut Progress),
    {
        let mut conn = db::db_connect(&self.db_path)?;
        let tx = conn.transaction()?;

        let mut progress = load(&tx, user_id, slug)?.unwrap_or_else(|| Progress::empty(user_id, slug));
        f(&mut progress);
        progress.updated_at = time::now_epoch_z();

        tx.execute(
            "INSERT INTO course_user (
                user_id, course_slug, score, total_answers, correct_answers, final_score,
                completed_chapters, completed_topics, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(user_id, course_slug) DO UPDATE SET
                score = excluded.score,
                total_answers = excluded.total_answers,
                correct_answers = excluded.correct_answers,
                final_score = excluded.final_score,
                completed_chapters = excluded.completed_chapters,
                completed_topics = excluded.completed_topics,
                updated_at = excluded.updated_at",
            params![
                progress.user_id,
                progress.course_slug,
                progress.score,
                progress.total_answers,
                progress.correct_answers,
                progress.final_score,
                serde_json::to_string(&progress.completed_chapters)?,
                serde_json::to_string(&progress.completed_topics)?,
                progress.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(progress)
    }
}

const COLUMNS: &str = "user_id, course_slug, score, total_answers, correct_answers, final_score, \
                       completed_chapters, completed_topics, updated_at";

fn load(conn: &Connection, user_id: &str, slug: &str) -> Result<Option<Progress>, CoursekitError> {
    let progress = conn
        .query_row(
            &format!(
                "SELECT {} FROM course_user WHERE user_id = ?1 AND course_slug = ?2",
                COLUMNS
            ),
            params![user_id, slug],
            from_row,
        )
        .optional()?;
    Ok(progress)
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Progress> {
    let user_id: String = row.get(0)?;
    let course_slug: String = row.get(1)?;
    let chapters: Option<String> = row.get(6)?;
    let topics: Option<String> = row.get(7)?;

    Ok(Progress {
        completed_chapters: decode_set(chapters.as_deref(), &user_id, &course_slug),
        completed_topics: decode_set(topics.as_deref(), &user_id, &course_slug),
        score: row.get(2)?,
        total_answers: row.get(3)?,
        correct_answers: row.get(4)?,
        final_score: row.get(5)?,
        updated_at: row.get(8)?,
        user_id,
        course_slug,
    })
}

/// Unreadable set columns decode as empty, mirroring how the document store
/// treats corrupt JSON.
fn decode_set(raw: Option<&str>, user_id: &str, slug: &str) -> BTreeSet<String> {
    let Some(raw) = raw else {
        return BTreeSet::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(user_id, slug, error = %e, "corrupt progress set treated as empty");
        BTreeSet::new()
    })
}

//! Course repository.
//!
//! A course is a directory under the store root named by its slug. The
//! directory only counts as a course once it holds `chapters.json`; listing
//! skips anything else, which also covers directories orphaned by a crash
//! between directory creation and the first write.

use crate::core::error::CoursekitError;
use crate::core::schemas;
use crate::core::store::{DocKey, Document, DocumentStore};
use crate::core::validate::{Presence, Validator, SLUG_PATTERN};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const COURSE: &str = "Course";

const SLUG_MESSAGE: &str =
    "Course slug may only contain letters, numbers, spaces, underscores, and dashes.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
}

/// Row returned by [`CourseRepository::list`]. Missing fields read as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub slug: String,
    pub title: Value,
    pub description: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub chapters: Option<Vec<Chapter>>,
}

/// Sparse update: `None` leaves the stored field alone, `Some(None)` is an
/// explicit null in the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub chapters: Option<Option<Vec<Chapter>>>,
}

impl NewCourse {
    pub fn from_request(body: &Value) -> Result<Self, CoursekitError> {
        let mut v = Validator::new();

        let slug = v.required_string(
            "slug",
            body.get("slug"),
            Some(255),
            Some("Course slug is required."),
        );
        if let Some(slug) = &slug {
            v.matches("slug", slug, &SLUG_PATTERN, Some(SLUG_MESSAGE));
        }
        let title = v.required_string(
            "title",
            body.get("title"),
            Some(255),
            Some("Course title is required."),
        );
        let description = v.optional_string("description", body.get("description"), None, true);
        let chapters = validate_chapters(&mut v, body.get("chapters"));

        v.finish()?;
        Ok(Self {
            slug: slug.unwrap_or_default(),
            title: title.unwrap_or_default(),
            description: description.into_option().flatten(),
            chapters: chapters.into_option().flatten(),
        })
    }
}

impl CourseUpdate {
    pub fn from_request(body: &Value) -> Result<Self, CoursekitError> {
        let mut v = Validator::new();

        let title = v.optional_string("title", body.get("title"), Some(255), false);
        let description = v.optional_string("description", body.get("description"), None, true);
        let chapters = validate_chapters(&mut v, body.get("chapters"));

        v.finish()?;
        Ok(Self {
            title: title.into_option().flatten(),
            description: description.into_option(),
            chapters: chapters.into_option(),
        })
    }
}

fn validate_chapters(v: &mut Validator, value: Option<&Value>) -> Presence<Vec<Chapter>> {
    let items = match v.nullable_array("chapters", value, None) {
        Presence::Absent => return Presence::Absent,
        Presence::Null => return Presence::Null,
        Presence::Value(items) => items,
    };

    let mut chapters = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let id_field = format!("chapters.{}.id", idx);
        let title_field = format!("chapters.{}.title", idx);

        let id = v.required_string(
            &id_field,
            item.get("id"),
            Some(255),
            Some("Each chapter must include an id."),
        );
        if let Some(id) = &id {
            v.matches(&id_field, id, &SLUG_PATTERN, None);
        }
        let title = v.required_string(
            &title_field,
            item.get("title"),
            Some(255),
            Some("Each chapter must include a title."),
        );

        if let (Some(id), Some(title)) = (id, title) {
            chapters.push(Chapter { id, title });
        }
    }
    Presence::Value(chapters)
}

/// Create the course root under `data_dir` if it is missing.
pub fn initialize_course_store(data_dir: &Path) -> Result<(), CoursekitError> {
    fs::create_dir_all(data_dir.join(schemas::COURSES_DIR)).map_err(CoursekitError::IoError)
}

#[derive(Clone)]
pub struct CourseRepository {
    store: Arc<dyn DocumentStore>,
}

impl CourseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn course_key(slug: &str) -> Result<DocKey, CoursekitError> {
        DocKey::new([slug]).map_err(|e| CoursekitError::from(e).conceal_path(COURSE))
    }

    fn metadata_key(slug: &str) -> Result<DocKey, CoursekitError> {
        DocKey::new([slug, schemas::COURSE_METADATA_FILE])
            .map_err(|e| CoursekitError::from(e).conceal_path(COURSE))
    }

    /// All courses with a metadata document, sorted by slug.
    pub fn list(&self) -> Result<Vec<CourseSummary>, CoursekitError> {
        let mut courses = Vec::new();
        for slug in self.store.list_dirs(&DocKey::root())? {
            let Ok(key) = DocKey::new([slug.as_str(), schemas::COURSE_METADATA_FILE]) else {
                continue;
            };
            if !self.store.exists(&key) {
                continue;
            }
            let doc = self.store.read(&key).into_document();
            courses.push(CourseSummary {
                title: doc.get("title").cloned().unwrap_or(Value::Null),
                description: doc.get("description").cloned().unwrap_or(Value::Null),
                slug,
            });
        }
        courses.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(courses)
    }

    /// Create a course. The response omits null fields, unlike `get`/`update`.
    pub fn create(&self, course: NewCourse) -> Result<Document, CoursekitError> {
        let metadata = Self::metadata_key(&course.slug)?;
        if self.store.exists(&metadata) {
            return Err(CoursekitError::AlreadyExists(COURSE));
        }

        self.store.create_dir(&Self::course_key(&course.slug)?)?;

        let description = course.description.map(Value::String).unwrap_or(Value::Null);
        let chapters = serde_json::to_value(course.chapters.unwrap_or_default())?;

        let mut doc = Document::new();
        doc.insert("id".to_string(), Value::String(course.slug.clone()));
        doc.insert("title".to_string(), Value::String(course.title.clone()));
        doc.insert("description".to_string(), description.clone());
        doc.insert("chapters".to_string(), chapters.clone());
        self.store.write(&metadata, &doc)?;

        info!(slug = %course.slug, "course created");

        let mut response = Document::new();
        response.insert("slug".to_string(), Value::String(course.slug));
        response.insert("title".to_string(), Value::String(course.title));
        response.insert("description".to_string(), description);
        response.insert("chapters".to_string(), chapters);
        response.retain(|_, value| !value.is_null());
        Ok(response)
    }

    /// Stored document with `slug` taken from the argument, not the stored `id`.
    pub fn get(&self, slug: &str) -> Result<Document, CoursekitError> {
        let key = Self::metadata_key(slug)?;
        if !self.store.exists(&key) {
            return Err(CoursekitError::NotFound(COURSE));
        }

        let mut doc = self.store.read(&key).into_document();
        doc.insert("slug".to_string(), Value::String(slug.to_string()));
        Ok(doc)
    }

    /// Merge the fields present in `update` into the stored document.
    pub fn update(&self, slug: &str, update: CourseUpdate) -> Result<Document, CoursekitError> {
        let key = Self::metadata_key(slug)?;
        if !self.store.exists(&key) {
            return Err(CoursekitError::NotFound(COURSE));
        }

        let mut doc = self.store.read(&key).into_document();
        if let Some(title) = update.title {
            doc.insert("title".to_string(), Value::String(title));
        }
        if let Some(description) = update.description {
            doc.insert(
                "description".to_string(),
                description.map(Value::String).unwrap_or(Value::Null),
            );
        }
        if let Some(chapters) = update.chapters {
            doc.insert(
                "chapters".to_string(),
                serde_json::to_value(chapters.unwrap_or_default())?,
            );
        }
        if doc.get("id").is_none_or(Value::is_null) {
            doc.insert("id".to_string(), Value::String(slug.to_string()));
        }

        self.store.write(&key, &doc)?;
        info!(slug, "course updated");

        doc.insert("slug".to_string(), Value::String(slug.to_string()));
        Ok(doc)
    }

    /// Remove the course directory along with every chapter and quiz in it.
    pub fn delete(&self, slug: &str) -> Result<(), CoursekitError> {
        let key = Self::course_key(slug)?;
        if !self.store.exists(&key) {
            return Err(CoursekitError::NotFound(COURSE));
        }

        self.store.delete_dir(&key)?;
        info!(slug, "course deleted");
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct CourseCli {
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text", global = true)]
    pub format: String,
    #[clap(subcommand)]
    pub command: CourseCommand,
}

#[derive(Subcommand, Debug)]
pub enum CourseCommand {
    /// List courses with a metadata document
    List,
    /// Show one course document
    Show { slug: String },
    /// Delete a course and everything under it
    Delete { slug: String },
}

pub fn run_course_cli(repo: &CourseRepository, cli: CourseCli) -> Result<(), CoursekitError> {
    let json = cli.format == "json";
    match cli.command {
        CourseCommand::List => {
            let courses = repo.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&courses)?);
                return Ok(());
            }
            if courses.is_empty() {
                println!("No courses found.");
            }
            for course in courses {
                println!(
                    "{}  {}",
                    course.slug.bright_cyan().bold(),
                    course.title.as_str().unwrap_or("(untitled)")
                );
                if let Some(description) = course.description.as_str() {
                    println!("    {}", description.dimmed());
                }
            }
        }
        CourseCommand::Show { slug } => {
            let doc = repo.get(&slug)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
                return Ok(());
            }
            print_course(&doc);
        }
        CourseCommand::Delete { slug } => {
            repo.delete(&slug)?;
            if json {
                println!("{}", serde_json::json!({ "deleted": true, "slug": slug }));
            } else {
                println!("{} {}", "Deleted".bright_red(), slug);
            }
        }
    }
    Ok(())
}

fn print_course(doc: &Document) {
    let slug = doc.get("slug").and_then(Value::as_str).unwrap_or_default();
    let title = doc.get("title").and_then(Value::as_str).unwrap_or("(untitled)");
    println!("{}  {}", slug.bright_cyan().bold(), title.bright_white());
    if let Some(description) = doc.get("description").and_then(Value::as_str) {
        println!("  {}", description);
    }

    let chapters: Vec<Chapter> = doc
        .get("chapters")
        .cloned()
        .and_then(|c| serde_json::from_value(c).ok())
        .unwrap_or_default();
    for chapter in chapters {
        println!("  {} {}  {}", "▸".bright_yellow(), chapter.id, chapter.title);
    }
}

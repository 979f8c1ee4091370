//! Quiz repository.
//!
//! One quiz per chapter, stored at `{course}/{chapter}/quiz.json`. Writes are
//! create-or-replace: there is no merge and no check that the course exists.

use crate::core::error::CoursekitError;
use crate::core::schemas;
use crate::core::store::{to_document, DocKey, Document, DocumentStore};
use crate::core::validate::Validator;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub const QUIZ: &str = "Quiz";

/// A multiple-choice question.
///
/// `correct_index` is expected to index into `options`; that is checked by
/// neither validation nor the store.
///
/// The nullable fields keep an explicit `null` (`Some(None)`) apart from an
/// absent key (`None`), so a stored quiz reads back exactly as it was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Option<String>>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<Option<String>>,
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctIndex")]
    pub correct_index: u64,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Option<String>>,
}

/// Only called when the key is present; `default` covers the absent case.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn from_request(body: &Value) -> Result<Self, CoursekitError> {
        let mut v = Validator::new();

        let title = v.required_string(
            "title",
            body.get("title"),
            Some(255),
            Some("Quiz title is required."),
        );
        let mut questions = Vec::new();
        if let Some(items) = v.required_array(
            "questions",
            body.get("questions"),
            1,
            Some("Quiz questions are required."),
        ) {
            for (idx, item) in items.iter().enumerate() {
                if let Some(question) = validate_question(&mut v, idx, item) {
                    questions.push(question);
                }
            }
        }

        v.finish()?;
        Ok(Self {
            title: title.unwrap_or_default(),
            questions,
        })
    }
}

fn validate_question(v: &mut Validator, idx: usize, item: &Value) -> Option<Question> {
    let field = |name: &str| format!("questions.{}.{}", idx, name);

    let id = v
        .optional_string(&field("id"), item.get("id"), Some(255), true)
        .into_option();
    let kind = v
        .optional_string(&field("type"), item.get("type"), Some(50), true)
        .into_option();
    let question = v.required_string(
        &field("question"),
        item.get("question"),
        None,
        Some("Each question must include text."),
    );

    let mut options = Vec::new();
    if let Some(items) = v.required_array(
        &field("options"),
        item.get("options"),
        1,
        Some("Each question must include options."),
    ) {
        for (opt_idx, option) in items.iter().enumerate() {
            let option_field = format!("questions.{}.options.{}", idx, opt_idx);
            if let Some(text) = v.required_string(&option_field, Some(option), None, None) {
                options.push(text);
            }
        }
    }

    let correct_index = v.required_integer(
        &field("correctIndex"),
        item.get("correctIndex"),
        0,
        None,
        Some("Each question must include the correct option index."),
    );
    let explanation = v
        .optional_string(&field("explanation"), item.get("explanation"), None, true)
        .into_option();

    Some(Question {
        id,
        kind,
        question: question?,
        options,
        correct_index: correct_index?,
        explanation,
    })
}

#[derive(Clone)]
pub struct QuizRepository {
    store: Arc<dyn DocumentStore>,
}

impl QuizRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn chapter_key(course: &str, chapter: &str) -> Result<DocKey, CoursekitError> {
        DocKey::new([course, chapter]).map_err(|e| CoursekitError::from(e).conceal_path(QUIZ))
    }

    fn quiz_key(course: &str, chapter: &str) -> Result<DocKey, CoursekitError> {
        DocKey::new([course, chapter, schemas::QUIZ_FILE])
            .map_err(|e| CoursekitError::from(e).conceal_path(QUIZ))
    }

    pub fn get(&self, course: &str, chapter: &str) -> Result<Document, CoursekitError> {
        let key = Self::quiz_key(course, chapter)?;
        if !self.store.exists(&key) {
            return Err(CoursekitError::NotFound(QUIZ));
        }
        Ok(self.store.read(&key).into_document())
    }

    /// Create the chapter directory if needed and replace the quiz in full.
    pub fn upsert(&self, course: &str, chapter: &str, quiz: &Quiz) -> Result<Document, CoursekitError> {
        let key = Self::quiz_key(course, chapter)?;
        self.store.create_dir(&Self::chapter_key(course, chapter)?)?;

        let doc = to_document(quiz)?;
        self.store.write(&key, &doc)?;
        info!(course, chapter, questions = quiz.questions.len(), "quiz saved");
        Ok(doc)
    }

    /// Remove `quiz.json`, leaving the chapter directory in place.
    pub fn delete(&self, course: &str, chapter: &str) -> Result<(), CoursekitError> {
        let key = Self::quiz_key(course, chapter)?;
        if !self.store.exists(&key) {
            return Err(CoursekitError::NotFound(QUIZ));
        }
        self.store.delete_file(&key)?;
        info!(course, chapter, "quiz deleted");
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[clap(name = "quiz", about = "Inspect and remove chapter quizzes")]
pub struct QuizCli {
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text", global = true)]
    pub format: String,
    #[clap(subcommand)]
    pub command: QuizCommand,
}

#[derive(Subcommand, Debug)]
pub enum QuizCommand {
    /// Show a chapter's quiz
    Show { course: String, chapter: String },
    /// Delete a chapter's quiz
    Delete { course: String, chapter: String },
}

pub fn run_quiz_cli(repo: &QuizRepository, cli: QuizCli) -> Result<(), CoursekitError> {
    let json = cli.format == "json";
    match cli.command {
        QuizCommand::Show { course, chapter } => {
            let doc = repo.get(&course, &chapter)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
                return Ok(());
            }
            print_quiz(&doc);
        }
        QuizCommand::Delete { course, chapter } => {
            repo.delete(&course, &chapter)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "deleted": true, "course": course, "chapter": chapter })
                );
            } else {
                println!("{} {}/{}", "Deleted".bright_red(), course, chapter);
            }
        }
    }
    Ok(())
}

fn print_quiz(doc: &Document) {
    let title = doc.get("title").and_then(Value::as_str).unwrap_or("(untitled)");
    println!("{}", title.bright_white().bold());

    // Stored quizzes are not re-validated, so render what parses.
    let questions: Vec<Question> = doc
        .get("questions")
        .cloned()
        .and_then(|q| serde_json::from_value(q).ok())
        .unwrap_or_default();
    for (idx, question) in questions.iter().enumerate() {
        println!("{}. {}", idx + 1, question.question);
        for (opt_idx, option) in question.options.iter().enumerate() {
            if opt_idx as u64 == question.correct_index {
                println!("   {} {}", "✓".bright_green(), option.bright_green());
            } else {
                println!("   - {}", option);
            }
        }
        if let Some(Some(explanation)) = &question.explanation {
            println!("   {}", explanation.dimmed());
        }
    }
}

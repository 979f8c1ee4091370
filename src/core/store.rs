//! Document store abstraction for course content.
//!
//! Course metadata and quizzes are JSON objects addressed by a [`DocKey`], a
//! sequence of guarded path segments relative to the store root. The
//! [`DocumentStore`] trait keeps the repositories independent of where the
//! documents live; [`FsDocumentStore`] is the filesystem implementation.
//!
//! Missing and unparseable documents both read as an empty mapping for
//! callers that only care about content. The [`DocRead`] variant still tells
//! them apart, and corrupt documents are logged, so operators can spot
//! damaged files without the public contract changing.
//!
//! There is no locking and no rename-on-write: a crash mid-write can leave a
//! truncated document behind, which later reads report as `Corrupt`.

use crate::core::error::CoursekitError;
use crate::core::guard::{self, InvalidPath};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A JSON object as stored on disk.
pub type Document = Map<String, Value>;

/// Address of a document or directory inside a store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocKey {
    segments: Vec<String>,
}

impl DocKey {
    /// The store root itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a key, running every segment through the path guard.
    pub fn new<I, S>(segments: I) -> Result<Self, InvalidPath>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for segment in segments {
            let segment = segment.as_ref();
            guard::validate_component(segment)?;
            out.push(segment.to_string());
        }
        Ok(Self { segments: out })
    }

    pub fn join(&self, segment: &str) -> Result<Self, InvalidPath> {
        guard::validate_component(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// Outcome of reading a document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocRead {
    Found(Document),
    Missing,
    /// The key exists but its content is not a JSON object.
    Corrupt { reason: String },
}

impl DocRead {
    /// Collapse to the document, treating missing and corrupt content as empty.
    pub fn into_document(self) -> Document {
        match self {
            DocRead::Found(doc) => doc,
            DocRead::Missing | DocRead::Corrupt { .. } => Document::new(),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, DocRead::Corrupt { .. })
    }
}

/// Key-value view over JSON documents grouped in directories.
pub trait DocumentStore: Send + Sync {
    fn read(&self, key: &DocKey) -> DocRead;
    /// Replace the document at `key` in full. Parent directories must exist.
    fn write(&self, key: &DocKey, doc: &Document) -> Result<(), CoursekitError>;
    fn exists(&self, key: &DocKey) -> bool;
    /// Create the directory at `key` and any missing parents. Idempotent.
    fn create_dir(&self, key: &DocKey) -> Result<(), CoursekitError>;
    /// Names of the immediate child directories of `prefix`, unordered.
    fn list_dirs(&self, prefix: &DocKey) -> Result<Vec<String>, CoursekitError>;
    fn delete_dir(&self, key: &DocKey) -> Result<(), CoursekitError>;
    fn delete_file(&self, key: &DocKey) -> Result<(), CoursekitError>;
}

/// Serialize a value that must come out as a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, CoursekitError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(CoursekitError::JsonError(serde::ser::Error::custom(
            format!("expected a JSON object, got {}", json_kind(&other)),
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Filesystem-backed store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    base: PathBuf,
}

impl FsDocumentStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Resolve a key to a path and check it stays under the base directory.
    pub fn path_for(&self, key: &DocKey) -> Result<PathBuf, CoursekitError> {
        let mut path = self.base.clone();
        for segment in key.segments() {
            path.push(segment);
        }
        if !path.starts_with(&self.base) {
            return Err(InvalidPath {
                segment: key.to_string(),
                reason: "resolved path escapes the store root",
            }
            .into());
        }
        Ok(path)
    }
}

impl DocumentStore for FsDocumentStore {
    fn read(&self, key: &DocKey) -> DocRead {
        let Ok(path) = self.path_for(key) else {
            return DocRead::Missing;
        };
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return DocRead::Missing,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable document");
                return DocRead::Corrupt {
                    reason: e.to_string(),
                };
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(doc)) => {
                debug!(path = %path.display(), "read document");
                DocRead::Found(doc)
            }
            Ok(other) => {
                warn!(path = %path.display(), kind = json_kind(&other), "document is not a JSON object");
                DocRead::Corrupt {
                    reason: format!("expected a JSON object, found {}", json_kind(&other)),
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt document treated as empty");
                DocRead::Corrupt {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn write(&self, key: &DocKey, doc: &Document) -> Result<(), CoursekitError> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec_pretty(doc)?;
        fs::write(&path, bytes).map_err(CoursekitError::IoError)?;
        debug!(path = %path.display(), "wrote document");
        Ok(())
    }

    fn exists(&self, key: &DocKey) -> bool {
        self.path_for(key).map(|p| p.exists()).unwrap_or(false)
    }

    fn create_dir(&self, key: &DocKey) -> Result<(), CoursekitError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&path).map_err(CoursekitError::IoError)
    }

    fn list_dirs(&self, prefix: &DocKey) -> Result<Vec<String>, CoursekitError> {
        let path = self.path_for(prefix)?;
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoursekitError::IoError(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(CoursekitError::IoError)?;
            if !entry.file_type().map_err(CoursekitError::IoError)?.is_dir() {
                continue;
            }
            // Non UTF-8 directory names cannot be addressed by a slug anyway.
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn delete_dir(&self, key: &DocKey) -> Result<(), CoursekitError> {
        let path = self.path_for(key)?;
        fs::remove_dir_all(&path).map_err(CoursekitError::IoError)
    }

    fn delete_file(&self, key: &DocKey) -> Result<(), CoursekitError> {
        let path = self.path_for(key)?;
        fs::remove_file(&path).map_err(CoursekitError::IoError)
    }
}

//! Path safety checks for identifiers that end up inside filesystem paths.
//!
//! Course slugs and chapter ids arrive straight from URL path parameters and
//! are joined onto the storage root. Two layers run before that happens:
//!
//! - [`validate_segment`]: rejects empty segments and any `..` substring.
//! - [`validate_component`]: additionally requires the segment to be exactly one
//!   normal path component, so absolute paths, embedded separators and NUL
//!   bytes cannot reach `Path::join`.
//!
//! Axum URL-decodes path parameters, so `%2E%2E` arrives here as `..`.

use std::ffi::OsStr;
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsafe path segment {segment:?}: {reason}")]
pub struct InvalidPath {
    pub segment: String,
    pub reason: &'static str,
}

impl InvalidPath {
    fn new(segment: &str, reason: &'static str) -> Self {
        Self {
            segment: segment.to_string(),
            reason,
        }
    }
}

/// Reject empty segments and parent-directory sequences.
pub fn validate_segment(segment: &str) -> Result<(), InvalidPath> {
    if segment.is_empty() {
        return Err(InvalidPath::new(segment, "segment is empty"));
    }
    if segment.contains("..") {
        return Err(InvalidPath::new(segment, "segment contains '..'"));
    }
    Ok(())
}

/// [`validate_segment`] plus the requirement that the segment resolves to a
/// single normal component beneath whatever directory it is joined onto.
pub fn validate_component(segment: &str) -> Result<(), InvalidPath> {
    validate_segment(segment)?;

    if segment.contains('\0') || segment.contains('\\') {
        return Err(InvalidPath::new(segment, "segment contains a reserved character"));
    }

    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == OsStr::new(segment) => Ok(()),
        _ => Err(InvalidPath::new(segment, "segment is not a single path component")),
    }
}

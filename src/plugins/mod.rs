//! Subsystems: course documents, chapter quizzes and per-user progress.

pub mod course;
pub mod progress;
pub mod quiz;

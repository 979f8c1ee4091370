//! Centralized storage layout and database schema definitions.
//!
//! Coursekit keeps two kinds of state under the configured data directory:
//! 1. `courses/`: one directory per course holding `chapters.json`, with one
//!    sub-directory per chapter holding `quiz.json`.
//! 2. `progress.db`: the per-user progress ledger.

// --- 1. Document layout ---
pub const COURSES_DIR: &str = "courses";
pub const COURSE_METADATA_FILE: &str = "chapters.json";
pub const QUIZ_FILE: &str = "quiz.json";

// --- 2. Progress bin ---
pub const PROGRESS_DB_NAME: &str = "progress.db";

/// One row per user-course pair. Set-valued columns hold sorted JSON arrays.
pub const PROGRESS_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS course_user (
        user_id TEXT NOT NULL,
        course_slug TEXT NOT NULL,
        score INTEGER,
        total_answers INTEGER,
        correct_answers INTEGER,
        final_score INTEGER,
        completed_chapters TEXT,
        completed_topics TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (user_id, course_slug)
    )
";
pub const PROGRESS_DB_SCHEMA_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_course_user_slug ON course_user(course_slug)";

//! Coursekit: course and quiz documents on disk, served over HTTP.
//!
//! Courses are directories of JSON documents under a data directory; each
//! chapter may carry one quiz. A small SQLite ledger records per-user
//! progress and feeds a dashboard. The same repositories back both the HTTP
//! API and the offline admin commands.
//!
//! # Layout
//!
//! ```text
//! {data_dir}/courses/{slug}/chapters.json
//! {data_dir}/courses/{slug}/{chapter}/quiz.json
//! {data_dir}/progress.db
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Serve the API
//! coursekit serve --bind 127.0.0.1:8080 --data-dir ./storage
//!
//! # Offline administration
//! coursekit course list
//! coursekit quiz show demo-course 001-intro --format json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: document store, path guard, validation, config, error type
//! - [`plugins`]: course, quiz and progress subsystems
//! - [`http`]: axum router, bearer auth and error responses

pub mod core;
pub mod http;
pub mod plugins;

mod cli;
mod subsystems;

use crate::cli::{Cli, Command};
use crate::core::{config, error, logging, store::FsDocumentStore};
use crate::plugins::{course, quiz};

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

pub fn run() -> Result<(), error::CoursekitError> {
    let Cli {
        config: config_path,
        data_dir,
        command,
    } = Cli::parse();

    if let Command::Version = command {
        println!("v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_settings(config_path, data_dir)?;
    logging::init(&config.log.level);

    match command {
        Command::Serve(serve) => {
            let mut config = config;
            if let Some(bind) = serve.bind {
                config.server.bind = bind;
            }
            config.validate()?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(crate::http::serve(&config))
        }
        Command::Course(course_cli) => {
            let store = Arc::new(FsDocumentStore::new(config.courses_dir()));
            course::run_course_cli(&course::CourseRepository::new(store), course_cli)
        }
        Command::Quiz(quiz_cli) => {
            let store = Arc::new(FsDocumentStore::new(config.courses_dir()));
            quiz::run_quiz_cli(&quiz::QuizRepository::new(store), quiz_cli)
        }
        Command::Version => Ok(()),
    }
}

/// Config file values with command-line overrides applied.
fn load_settings(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<config::Config, error::CoursekitError> {
    let mut config = config::load_config(config_path.as_deref())?;
    if let Some(data_dir) = data_dir {
        config.storage.data_dir = data_dir;
    }
    config.validate()?;
    Ok(config)
}

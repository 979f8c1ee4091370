//! CLI struct definitions for the coursekit command-line interface.
//!
//! All clap-derived top-level types live here. Subsystem commands are defined
//! next to the subsystem (`CourseCli`, `QuizCli`).

use crate::plugins::{course, quiz};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "coursekit",
    version = env!("CARGO_PKG_VERSION"),
    about = "Course and quiz documents on disk, served over HTTP with per-user progress tracking.",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    /// Config file. Falls back to $COURSEKIT_CONFIG, then ./coursekit.toml.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Data directory, overriding `storage.data_dir`.
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ServeCli {
    /// Address to listen on, overriding `server.bind`.
    #[clap(long)]
    pub bind: Option<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run the HTTP API until Ctrl-C
    #[clap(name = "serve")]
    Serve(ServeCli),

    /// Inspect and delete courses
    #[clap(name = "course", visible_alias = "c")]
    Course(course::CourseCli),

    /// Inspect and delete chapter quizzes
    #[clap(name = "quiz", visible_alias = "q")]
    Quiz(quiz::QuizCli),

    /// Show version information
    #[clap(name = "version")]
    Version,
}

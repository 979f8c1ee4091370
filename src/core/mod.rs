//! Core building blocks shared by the course, quiz and progress subsystems.
//!
//! Storage primitives, configuration and the error type live here. The
//! subsystems themselves live under [`crate::plugins`].

pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod logging;
pub mod schemas;
pub mod store;
pub mod time;
pub mod validate;

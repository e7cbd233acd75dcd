//! gh-pr-notify: library crate for the binary and integration tests.
//!
//! Watches your open pull requests and notifies once per PR when its review
//! decision turns `APPROVED`.

pub mod cli;
pub mod config;
pub mod detector;
pub mod errors;
pub mod jobs;
pub mod models;
pub mod notification;
pub mod source;
pub mod store;

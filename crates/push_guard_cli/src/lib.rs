//! push-guard CLI library exports for integration testing.
//!
//! This module exposes the command implementations, the configuration file
//! model and the configuration-backed directory of users, teams and pull
//! requests.

pub mod commands;
pub mod config;
pub mod directory;
pub mod errors;

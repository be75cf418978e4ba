use std::io;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that stop the push-guard CLI before a decision is reached.
///
/// Any of these makes the hook refuse the push with the internal error exit
/// status.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error occurred while loading or parsing configuration.
    ///
    /// This error is returned when the configuration file is missing, cannot
    /// be read, is not valid TOML or holds invalid rules.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The ref update lines read from standard input could not be parsed.
    #[error("Invalid input: {0}")]
    Input(String),

    /// Failed to read standard input.
    #[error("Failed to read input.")]
    ReadInput(#[source] io::Error),

    /// The repository could not be inspected.
    #[error("Git error: {0}")]
    Git(#[from] git_client::Error),
}

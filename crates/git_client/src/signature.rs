//! Commit signature verification.
//!
//! The plumbing client extracts the signature and signed payload of each
//! commit; deciding whether a signature is valid is delegated to a
//! [`SignatureVerifier`].

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::{CommitId, Error};

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

/// Result of verifying the commits of a ref update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Every commit carries a valid signature.
    Verified,

    /// The first commit found without a valid signature.
    Unverified(CommitId),
}

/// Checks a detached commit signature against the signed commit payload.
pub trait SignatureVerifier: Send + Sync {
    /// Returns `Ok(false)` for a signature that does not verify and `Err` only
    /// when verification could not be attempted.
    fn verify(
        &self,
        commit: &CommitId,
        signature: &[u8],
        signed_data: &[u8],
    ) -> Result<bool, Error>;
}

/// Verifier that runs `gpg --verify` against the local keyring.
#[derive(Debug, Clone)]
pub struct GpgVerifier {
    program: String,
}

impl GpgVerifier {
    pub fn new() -> Self {
        Self::with_program("gpg")
    }

    /// Use a different gpg executable, e.g. `gpg2` or an absolute path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GpgVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier for GpgVerifier {
    fn verify(
        &self,
        commit: &CommitId,
        signature: &[u8],
        signed_data: &[u8],
    ) -> Result<bool, Error> {
        let verification_error = |message: String| Error::Verification {
            commit: commit.to_string(),
            message,
        };

        let mut signature_file = tempfile::NamedTempFile::new()
            .map_err(|e| verification_error(format!("failed to create signature file: {}", e)))?;
        signature_file
            .write_all(signature)
            .map_err(|e| verification_error(format!("failed to write signature file: {}", e)))?;

        let mut child = Command::new(&self.program)
            .arg("--status-fd=1")
            .arg("--verify")
            .arg(signature_file.path())
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| verification_error(format!("failed to run {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(signed_data)
                .map_err(|e| verification_error(format!("failed to send payload: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| verification_error(format!("failed to wait for {}: {}", self.program, e)))?;

        let status = String::from_utf8_lossy(&output.stdout);
        let verified = has_status(&status, "GOODSIG") && has_status(&status, "VALIDSIG");
        debug!(commit = %commit, verified, "Checked commit signature with gpg");

        Ok(verified)
    }
}

fn has_status(status: &str, keyword: &str) -> bool {
    status.lines().any(|line| {
        line.strip_prefix("[GNUPG:] ")
            .is_some_and(|rest| rest.split_whitespace().next() == Some(keyword))
    })
}

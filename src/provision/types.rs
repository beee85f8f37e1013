use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use super::digest::{digests_match, sha256_file};

/// Describes a binary artifact that must exist locally before it can be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    /// Remote location the artifact is downloaded from
    pub url: String,
    /// Final location of the artifact on disk
    pub path: PathBuf,
    /// Expected SHA-256 of the artifact, hex encoded, any case
    pub expected_sha256: String,
}

impl ArtifactSpec {
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>, expected_sha256: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            expected_sha256: expected_sha256.into(),
        }
    }

    /// Sibling file the download is streamed into before it is verified.
    pub fn partial_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".part");
        self.path.with_file_name(name)
    }

    /// Derives the current state of the artifact from the filesystem.
    ///
    /// With `verify` unset a present file is reported as `PresentUnverified`
    /// without reading it.
    pub fn state(&self, verify: bool) -> io::Result<ArtifactState> {
        if !self.path.is_file() {
            return Ok(ArtifactState::Missing);
        }
        if !verify {
            return Ok(ArtifactState::PresentUnverified);
        }
        let actual = sha256_file(&self.path)?;
        if digests_match(&actual, &self.expected_sha256) {
            Ok(ArtifactState::PresentVerified)
        } else {
            Ok(ArtifactState::PresentCorrupt)
        }
    }
}

/// Observable state of an artifact on disk. Never stored, always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Missing,
    PresentUnverified,
    PresentVerified,
    PresentCorrupt,
}

impl fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArtifactState::Missing => "missing",
            ArtifactState::PresentUnverified => "present (unverified)",
            ArtifactState::PresentVerified => "present (verified)",
            ArtifactState::PresentCorrupt => "present (corrupt)",
        };
        f.write_str(label)
    }
}

/// What to do with an artifact that is already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyPolicy {
    /// Trust any existing file without hashing it.
    #[default]
    TrustExisting,
    /// Hash an existing file; delete and re-fetch it on mismatch.
    Reverify,
}

/// Errors raised while provisioning an artifact
#[derive(Debug)]
pub enum ProvisionError {
    /// The download could not be completed
    Network(String),
    /// The downloaded content does not hash to the expected digest
    Integrity { expected: String, actual: String },
    /// Local filesystem failure outside the transfer itself
    Io(io::Error),
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProvisionError::Network(msg) => write!(f, "Download failed: {}", msg),
            ProvisionError::Integrity { expected, actual } => write!(
                f,
                "SHA256 mismatch: expected {}, got {}",
                expected.to_lowercase(),
                actual.to_lowercase()
            ),
            ProvisionError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for ProvisionError {}

impl From<io::Error> for ProvisionError {
    fn from(err: io::Error) -> Self {
        ProvisionError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::digest::sha256_hex;
    use std::fs;

    #[test]
    fn test_partial_path_is_sibling() {
        let spec = ArtifactSpec::new("https://example.invalid/m.gguf", "/models/m.gguf", "00");
        assert_eq!(spec.partial_path(), PathBuf::from("/models/m.gguf.part"));
    }

    #[test]
    fn test_state_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.gguf");
        let spec = ArtifactSpec::new("u", &path, sha256_hex(b"weights").to_uppercase());

        assert_eq!(spec.state(true).unwrap(), ArtifactState::Missing);

        fs::write(&path, b"weights").unwrap();
        assert_eq!(spec.state(false).unwrap(), ArtifactState::PresentUnverified);
        assert_eq!(spec.state(true).unwrap(), ArtifactState::PresentVerified);

        fs::write(&path, b"tampered").unwrap();
        assert_eq!(spec.state(true).unwrap(), ArtifactState::PresentCorrupt);
    }

    #[test]
    fn test_integrity_error_message() {
        let err = ProvisionError::Integrity {
            expected: "ABC".to_string(),
            actual: "def".to_string(),
        };
        assert_eq!(err.to_string(), "SHA256 mismatch: expected abc, got def");
    }
}

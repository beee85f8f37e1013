use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::logging::LogSink;
use super::digest::{digests_match, sha256_file};
use super::lock::{path_lock, release_path_lock};
use super::source::{ArtifactSource, FetchError, HttpSource};
use super::types::{ArtifactSpec, ArtifactState, ProvisionError, VerifyPolicy};

/// Guarantees that an artifact is present and intact on local disk.
///
/// The provisioner owns its download source and its log sink. It keeps no state
/// between calls: every call to [`Provisioner::ensure`] re-derives the artifact
/// state from the filesystem.
pub struct Provisioner {
    source: Box<dyn ArtifactSource>,
    sink: Arc<dyn LogSink>,
    policy: VerifyPolicy,
}

impl Provisioner {
    /// Creates a provisioner over an arbitrary source.
    ///
    /// # Arguments
    ///
    /// * `source` - Where missing artifacts are fetched from
    /// * `sink` - Receives progress and failure messages
    pub fn new(source: Box<dyn ArtifactSource>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            source,
            sink,
            policy: VerifyPolicy::default(),
        }
    }

    /// Creates a provisioner that downloads over HTTP(S).
    pub fn http(sink: Arc<dyn LogSink>) -> Result<Self, ProvisionError> {
        let source = HttpSource::new().map_err(|e| ProvisionError::Network(e.to_string()))?;
        Ok(Self::new(Box::new(source), sink))
    }

    /// Sets the policy applied to an artifact that is already on disk.
    pub fn with_policy(mut self, policy: VerifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> VerifyPolicy {
        self.policy
    }

    /// Ensures the artifact described by `spec` exists locally and returns its path.
    ///
    /// An existing file is trusted as-is under [`VerifyPolicy::TrustExisting`]. A
    /// missing file is downloaded to a `.part` sibling, hashed, and only moved onto
    /// the target path when its digest matches. A mismatched download is deleted.
    ///
    /// # Errors
    ///
    /// * `ProvisionError::Network` - the download could not complete
    /// * `ProvisionError::Integrity` - the downloaded bytes hash to the wrong digest
    /// * `ProvisionError::Io` - local filesystem failure
    pub fn ensure(&self, spec: &ArtifactSpec) -> Result<PathBuf, ProvisionError> {
        let lock = path_lock(&spec.path);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            self.ensure_locked(spec)
        };
        drop(lock);
        release_path_lock(&spec.path);
        result
    }

    fn ensure_locked(&self, spec: &ArtifactSpec) -> Result<PathBuf, ProvisionError> {
        if spec.path.is_file() {
            match self.policy {
                VerifyPolicy::TrustExisting => {
                    self.sink.info(&format!("Model file already exists: {}", spec.path.display()));
                    return Ok(spec.path.clone());
                }
                VerifyPolicy::Reverify => match self.check_existing(spec)? {
                    ArtifactState::PresentVerified => {
                        self.sink.info(&format!("Model file verified: {}", spec.path.display()));
                        return Ok(spec.path.clone());
                    }
                    _ => {
                        self.sink.warn(&format!(
                            "Existing model file failed verification, re-downloading: {}",
                            spec.path.display()
                        ));
                        self.remove_quietly(&spec.path);
                    }
                },
            }
        }

        self.ensure_parent_dir(&spec.path)?;

        let partial = spec.partial_path();
        self.sink.info(&format!("Downloading model from {}...", spec.url));
        match self.download(&spec.url, &partial) {
            Ok(bytes) => self.sink.info(&format!("Download complete ({} bytes).", bytes)),
            Err(e) => {
                self.remove_quietly(&partial);
                let err = ProvisionError::Network(e.to_string());
                self.sink.error(&format!("Model download failed: {}", e));
                return Err(err);
            }
        }

        let actual = match sha256_file(&partial) {
            Ok(digest) => digest,
            Err(e) => {
                self.remove_quietly(&partial);
                self.sink.error(&format!("Failed to hash downloaded model: {}", e));
                return Err(ProvisionError::Io(e));
            }
        };

        if !digests_match(&actual, &spec.expected_sha256) {
            self.remove_quietly(&partial);
            let err = ProvisionError::Integrity {
                expected: spec.expected_sha256.clone(),
                actual,
            };
            self.sink.error(&format!("{}. Downloaded model is corrupted and was removed.", err));
            return Err(err);
        }

        if let Err(e) = fs::rename(&partial, &spec.path) {
            self.remove_quietly(&partial);
            self.sink.error(&format!(
                "Failed to move verified model into place at {}: {}",
                spec.path.display(),
                e
            ));
            return Err(ProvisionError::Io(e));
        }

        self.sink.info("SHA256 verification successful.");
        self.sink.info(&format!("Model is ready at: {}", spec.path.display()));
        Ok(spec.path.clone())
    }

    fn check_existing(&self, spec: &ArtifactSpec) -> Result<ArtifactState, ProvisionError> {
        spec.state(true).map_err(|e| {
            self.sink.error(&format!("Failed to hash existing model {}: {}", spec.path.display(), e));
            ProvisionError::Io(e)
        })
    }

    fn ensure_parent_dir(&self, path: &Path) -> Result<(), ProvisionError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Ok(()),
        };
        if parent.is_dir() {
            return Ok(());
        }
        // create_dir_all treats an existing directory as success
        fs::create_dir_all(parent).map_err(|e| {
            self.sink.error(&format!("Failed to create models directory {}: {}", parent.display(), e));
            ProvisionError::Io(e)
        })?;
        self.sink.info(&format!("Created models directory: {}", parent.display()));
        Ok(())
    }

    fn download(&self, url: &str, partial: &Path) -> Result<u64, FetchError> {
        let file = File::create(partial).map_err(FetchError::Write)?;
        let mut writer = BufWriter::new(file);
        let bytes = self.source.fetch(url, &mut writer)?;
        let file = writer.into_inner().map_err(|e| FetchError::Write(e.into_error()))?;
        file.sync_all().map_err(FetchError::Write)?;
        Ok(bytes)
    }

    fn remove_quietly(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                self.sink.warn(&format!("Failed to remove {}: {}", path.display(), e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{RecordingSink, Severity};
    use crate::provision::digest::sha256_hex;
    use crate::provision::lock::is_tracked;
    use std::io::{self, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a fixed body and counts how often it was asked to.
    struct MemorySource {
        body: Vec<u8>,
        calls: Arc<AtomicUsize>,
    }

    impl ArtifactSource for MemorySource {
        fn fetch(&self, _url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for chunk in self.body.chunks(3) {
                sink.write_all(chunk).map_err(FetchError::Write)?;
            }
            Ok(self.body.len() as u64)
        }
    }

    /// Writes part of the body and then drops the connection.
    struct BrokenSource;

    impl ArtifactSource for BrokenSource {
        fn fetch(&self, _url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
            sink.write_all(b"GGUF-partial").map_err(FetchError::Write)?;
            Err(FetchError::Transport(
                io::Error::new(io::ErrorKind::ConnectionReset, "connection reset").to_string(),
            ))
        }
    }

    fn memory(body: &[u8]) -> (Box<dyn ArtifactSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = MemorySource {
            body: body.to_vec(),
            calls: Arc::clone(&calls),
        };
        (Box::new(source), calls)
    }

    #[test]
    fn test_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Content").join("LargeLanguageModels").join("m.gguf");
        let spec = ArtifactSpec::new("https://example.invalid/m.gguf", &path, sha256_hex(b"weights"));
        let (source, _) = memory(b"weights");
        let sink = Arc::new(RecordingSink::new());

        let provisioner = Provisioner::new(source, sink.clone());
        assert_eq!(provisioner.ensure(&spec).unwrap(), path);
        assert!(sink.contains(Severity::Info, "Created models directory"));
        assert!(!spec.partial_path().exists());
    }

    #[test]
    fn test_unwritable_parent_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // The target's parent is a regular file, so nothing can be created under it
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let spec = ArtifactSpec::new("u", blocker.join("m.gguf"), sha256_hex(b"weights"));
        let (source, calls) = memory(b"weights");
        let sink = Arc::new(RecordingSink::new());

        let err = Provisioner::new(source, sink.clone()).ensure(&spec).unwrap_err();
        assert!(matches!(err, ProvisionError::Io(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(sink.contains(Severity::Error, "Failed to create models directory"));
    }

    #[test]
    fn test_broken_transfer_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ArtifactSpec::new("u", dir.path().join("m.gguf"), sha256_hex(b"weights"));
        let sink = Arc::new(RecordingSink::new());

        let err = Provisioner::new(Box::new(BrokenSource), sink.clone())
            .ensure(&spec)
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Network(_)));
        assert!(!spec.path.exists());
        assert!(!spec.partial_path().exists());
        assert!(sink.contains(Severity::Error, "connection reset"));
    }

    #[test]
    fn test_ensured_artifact_verifies_and_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ArtifactSpec::new("u", dir.path().join("m.gguf"), sha256_hex(b"weights"));
        let (source, _) = memory(b"weights");
        let provisioner = Provisioner::new(source, Arc::new(RecordingSink::new()));

        assert_eq!(spec.state(true).unwrap(), ArtifactState::Missing);
        provisioner.ensure(&spec).unwrap();
        assert_eq!(spec.state(true).unwrap(), ArtifactState::PresentVerified);
        assert!(!is_tracked(&spec.path));
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use once_cell::sync::Lazy;

/// One mutex per artifact target path, shared by every provisioner in the process.
/// Entries are dropped by [`release_path_lock`] once nobody holds them.
static PATH_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the mutex guarding provisioning of `path`.
///
/// Callers hold the returned lock for the whole check-download-verify sequence so
/// that a second caller for the same path waits and then finds the finished file.
pub(crate) fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = PATH_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
    Arc::clone(locks.entry(path.to_path_buf()).or_default())
}

/// Forgets the mutex for `path` when no caller holds a handle to it anymore.
pub(crate) fn release_path_lock(path: &Path) {
    let mut locks = PATH_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
    // Handles are only cloned under this map lock, so a count of one means idle
    if locks.get(path).is_some_and(|lock| Arc::strong_count(lock) == 1) {
        locks.remove(path);
    }
}

#[cfg(test)]
pub(crate) fn is_tracked(path: &Path) -> bool {
    PATH_LOCKS
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .contains_key(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path_shares_lock() {
        let a = path_lock(Path::new("/tmp/minemind-lock-test/a.gguf"));
        let b = path_lock(Path::new("/tmp/minemind-lock-test/a.gguf"));
        let c = path_lock(Path::new("/tmp/minemind-lock-test/c.gguf"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_release_keeps_held_locks() {
        let path = Path::new("/tmp/minemind-lock-test/release.gguf");
        let held = path_lock(path);

        release_path_lock(path);
        assert!(is_tracked(path));

        drop(held);
        release_path_lock(path);
        assert!(!is_tracked(path));
    }
}

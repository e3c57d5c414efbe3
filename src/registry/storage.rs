//! Storage backends for the register document

use std::fs;
use std::io::{self, Write};
use std::path::Path;

// ============================================================================
// Trait Definitions
// ============================================================================

/// Trait for storage backend operations
pub trait StorageBackend: Send + Sync {
    /// Replace the content at `path` atomically
    fn save(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Read the content at `path`
    fn load(&self, path: &Path) -> io::Result<String>;
}

// ============================================================================
// Production Implementation
// ============================================================================

/// Production storage backend using std::fs
#[derive(Debug, Default)]
pub struct FileSystemStorage;

impl FileSystemStorage {
    pub fn new() -> Self {
        Self
    }
}

impl StorageBackend for FileSystemStorage {
    fn save(&self, path: &Path, content: &str) -> io::Result<()> {
        // Atomic write: write to temp file, then rename
        let temp_file = path.with_extension("tmp");

        let mut file = fs::File::create(&temp_file)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        fs::rename(&temp_file, path)
    }

    fn load(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory storage with error injection
    #[derive(Default)]
    pub struct MockStorage {
        files: Mutex<HashMap<PathBuf, String>>,
        save_error: Mutex<Option<String>>,
        saves: Mutex<usize>,
    }

    impl MockStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_file(&self, path: &Path) -> Option<String> {
            self.files.lock().unwrap().get(path).cloned()
        }

        pub fn put_file(&self, path: &Path, content: &str) {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), content.to_string());
        }

        /// Number of successful saves so far
        pub fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }

        /// Fail the next save with `error`
        pub fn set_save_error(&self, error: &str) {
            *self.save_error.lock().unwrap() = Some(error.to_string());
        }
    }

    impl StorageBackend for MockStorage {
        fn save(&self, path: &Path, content: &str) -> io::Result<()> {
            if let Some(error) = self.save_error.lock().unwrap().take() {
                return Err(io::Error::other(error));
            }
            self.put_file(path, content);
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }

        fn load(&self, path: &Path) -> io::Result<String> {
            self.get_file(path)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such mock file"))
        }
    }
}

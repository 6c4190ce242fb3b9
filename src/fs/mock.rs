// src/fs/mock.rs

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use super::FileSystem;

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
    fail_writes: Option<String>,
}

/// In-memory file store for tests. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.state.lock().unwrap();
        insert_file(&mut state, path.as_ref(), content.into());
    }

    /// Make every subsequent `write` fail with `message`.
    pub fn fail_writes(&self, message: impl Into<String>) {
        self.state.lock().unwrap().fail_writes = Some(message.into());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn written_paths(&self) -> Vec<PathBuf> {
        let state = self.state.lock().unwrap();
        let mut paths: Vec<_> = state.files.keys().cloned().collect();
        paths.sort();
        paths
    }
}

fn insert_file(state: &mut MockState, path: &Path, content: Vec<u8>) {
    if let Some(parent) = path.parent() {
        add_dirs(state, parent);
    }
    state.files.insert(path.to_path_buf(), content);
}

fn add_dirs(state: &mut MockState, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        state.dirs.insert(ancestor.to_path_buf());
    }
}

impl FileSystem for MockFileSystem {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.fail_writes {
            return Err(anyhow!("{message}: {}", path.display()));
        }
        insert_file(&mut state, path, contents.to_vec());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.state.lock().unwrap();
        match state.files.get(path) {
            Some(content) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            None if state.dirs.contains(path) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        add_dirs(&mut state, path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_visible_and_create_parent_dirs() {
        let fs = MockFileSystem::new();
        fs.write_text(Path::new("/ws/k/main.py"), "print('hi')").unwrap();
        assert!(fs.exists(Path::new("/ws/k")));
        assert_eq!(fs.contents("/ws/k/main.py").as_deref(), Some("print('hi')"));
        assert!(fs.read_to_string(Path::new("/ws/k")).is_err());
    }

    #[test]
    fn failing_writes() {
        let fs = MockFileSystem::new();
        fs.fail_writes("disk full");
        let err = fs.write_text(Path::new("/x/main.c"), "int main(){}").unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(!fs.exists(Path::new("/x/main.c")));
    }
}

#![allow(dead_code)]

use hashkeeper::output::MemorySink;
use hashkeeper::reconcile::RunContext;
use hashkeeper::scanner::path_utils::{absolute_normalized, path_key};
use hashkeeper::store::HashStore;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A data tree, a separate directory for the store, and a shared sink.
pub struct Fixture {
    pub data: TempDir,
    pub db_dir: TempDir,
    pub sink: MemorySink,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            data: TempDir::new().unwrap(),
            db_dir: TempDir::new().unwrap(),
            sink: MemorySink::new(),
        }
    }

    pub fn root(&self) -> PathBuf {
        absolute_normalized(self.data.path()).unwrap()
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.path().join("hashes.sqlite")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn key(&self, relative: &str) -> String {
        path_key(&self.path(relative))
    }

    pub fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.path(relative)).unwrap();
    }

    pub fn context(&self) -> RunContext {
        let store = HashStore::open(&self.db_path()).unwrap();
        RunContext::new(store, Box::new(self.sink.clone()))
    }

    pub fn reopen(&self) -> HashStore {
        HashStore::open(&self.db_path()).unwrap()
    }
}

/// Independent SHA-256 of a file's content.
pub fn sha256_hex(path: &Path) -> String {
    let digest = Sha256::digest(fs::read(path).unwrap());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

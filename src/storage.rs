//! Filesystem-backed image store.
//!
//! Uploads land under the data directory and are served back by the HTTP
//! router under `/uploads/`. The returned URL path is the public handle the
//! client stores on memories and discoveries.

use std::path::{Path, PathBuf};

use anyhow::Context;

#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn open_default() -> anyhow::Result<Self> {
        let dirs = directories::ProjectDirs::from("com", "together-apart", "together-apart")
            .context("could not resolve data directory")?;
        Self::open(dirs.data_dir().join("uploads"))
    }

    pub fn open<P: Into<PathBuf>>(root: P) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating upload directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persists the bytes and returns the public URL path. The stored name
    /// gets a random prefix so repeated uploads of the same filename never
    /// collide.
    pub fn save(&self, filename: &str, bytes: &[u8]) -> anyhow::Result<String> {
        let safe: String = filename
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stored = format!("{}-{}", uuid::Uuid::new_v4().simple(), safe);
        let path = self.root.join(&stored);
        std::fs::write(&path, bytes)
            .with_context(|| format!("writing upload {}", path.display()))?;
        tracing::debug!(file = %stored, size = bytes.len(), "image stored");
        Ok(format!("/uploads/{stored}"))
    }
}

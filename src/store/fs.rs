//! File-backed coordination store.
//!
//! Mirrors the node tree under a root directory: node `/a/b/c` lives in
//! `<root>/a/b/c.node`, so a node can have both data and children. Change
//! notification comes from `notify`, one non-recursive watch on the node's
//! directory per subscription. Writes go through a temp file and a rename, so
//! a reader sees either the old or the new document.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::store::{ChangeEvent, ChangeKind, ChangeStream, CoordinationClient, StoreError};

const NODE_EXTENSION: &str = "node";

/// A node tree stored on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = std::fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Atomically replace the content of a node.
    pub async fn put(&self, path: &str, data: &[u8]) -> Result<(), StoreError> {
        let target = self.node_file(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = target.with_extension(format!("{NODE_EXTENSION}.{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&staging, data).await?;
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove a node. Returns false if it did not exist.
    pub async fn remove(&self, path: &str) -> Result<bool, StoreError> {
        match tokio::fs::remove_file(self.node_file(path)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Map a node path to the file holding its data.
    pub fn node_file(&self, path: &str) -> Result<PathBuf, StoreError> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\'))
        {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        let mut file = self.root.clone();
        if let Some((last, parents)) = segments.split_last() {
            file.extend(parents);
            file.push(format!("{last}.{NODE_EXTENSION}"));
        }
        Ok(file)
    }
}

/// The watch dies with its directory; ending the stream makes the caller resubscribe.
fn dir_removed(event: &Event, dir: &Path) -> bool {
    matches!(event.kind, EventKind::Remove(_)) && event.paths.iter().any(|p| p == dir)
}

fn classify(event: &Event, target: &Path) -> Option<ChangeKind> {
    if !event.paths.iter().any(|p| p == target) {
        return None;
    }
    match event.kind {
        EventKind::Access(_) => None,
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => Some(ChangeKind::DataChanged),
    }
}

#[async_trait]
impl CoordinationClient for FsStore {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.node_file(path)?).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn subscribe(&self, path: &str) -> Result<ChangeStream, StoreError> {
        let target = self.node_file(path)?;
        let dir = target.parent().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
        tokio::fs::create_dir_all(&dir).await?;
        let watched = dir.clone();
        let node_path = path.to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        // Taken on a watcher error so the stream ends and the caller resubscribes.
        let tx = Arc::new(Mutex::new(Some(tx)));

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let mut guard = match tx.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                match res {
                    Ok(event) if dir_removed(&event, &watched) => {
                        tracing::warn!(path = %node_path, "Watched directory removed, ending subscription");
                        guard.take();
                    }
                    Ok(event) => {
                        if let (Some(kind), Some(sender)) = (classify(&event, &target), guard.as_ref()) {
                            let _ = sender.send(ChangeEvent::new(node_path.clone(), kind));
                        }
                    }
                    Err(e) => {
                        tracing::error!(path = %node_path, error = %e, "Watch error, ending subscription");
                        guard.take();
                    }
                }
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %path, dir = %dir.display(), "File watcher started");

        Ok(stream::unfold((watcher, rx), |(watcher, mut rx)| async move {
            rx.recv().await.map(|event| (event, (watcher, rx)))
        })
        .boxed())
    }
}

// src/store/file.rs
// =============================================================================
// LinkStore keeps every link in memory and writes the whole set to
// <data-dir>/links.json after each change.
//
// How a mutation works:
// 1. Take the write lock (one writer at a time, readers wait)
// 2. Apply the change to a copy of the current set
// 3. Write the copy to a temp file, fsync it, rename it over links.json
// 4. Only then swap the copy in as the new in-memory set
//
// So when a call returns Ok the change is on disk, and when it returns Err
// neither the file nor the in-memory set has changed.
//
// Rust concepts:
// - tokio::sync::RwLock: many readers or one writer, and the guard can be
//   held across .await (we hold it while writing the file)
// - Closures: modify() takes the change to apply as an FnOnce
// =============================================================================

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use crate::models::{Health, Link};

/// Name of the backing file inside the data directory
pub const LINKS_FILE: &str = "links.json";

pub struct LinkStore {
    links: RwLock<Vec<Link>>,
    file: PathBuf,
}

impl LinkStore {
    /// Opens the store in `dir`, creating the directory if needed
    ///
    /// A missing or empty links.json gives an empty store. A file that
    /// cannot be read or parsed is an error: we never overwrite data we
    /// failed to understand.
    pub async fn load(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StoreError::io(dir, e))?;

        let file = dir.join(LINKS_FILE);
        let mut links: Vec<Link> = match fs::read(&file).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
                    path: file.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::io(&file, e)),
        };

        // older files can hold links saved with no path at all; give them
        // the same default add() would have
        for link in &mut links {
            link.normalize_path();
        }

        info!(path = %file.display(), links = links.len(), "link store loaded");

        Ok(Self {
            links: RwLock::new(links),
            file,
        })
    }

    /// Location of links.json
    pub fn path(&self) -> &Path {
        &self.file
    }

    /// A snapshot of every link
    ///
    /// The returned Vec is a copy: later changes to the store don't show up
    /// in it, and changing it doesn't touch the store.
    pub async fn list(&self) -> Vec<Link> {
        self.links.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Link> {
        self.links.read().await.iter().find(|l| l.id == id).cloned()
    }

    /// Adds a link and returns it as stored
    ///
    /// An empty id gets a fresh UUID and an empty path becomes
    /// ["Uncategorized"].
    pub async fn add(&self, mut link: Link) -> StoreResult<Link> {
        if link.id.is_empty() {
            link.id = Uuid::new_v4().to_string();
        }
        link.normalize_path();

        let mut links = self.links.write().await;
        if links.iter().any(|l| l.id == link.id) {
            return Err(StoreError::AlreadyExists(link.id));
        }

        let mut staged = links.clone();
        staged.push(link.clone());
        self.persist(&staged).await?;
        *links = staged;

        debug!(id = %link.id, url = %link.url, "link added");
        Ok(link)
    }

    /// Replaces every field of the link with `id`, keeping the id
    pub async fn update(&self, id: &str, mut link: Link) -> StoreResult<Link> {
        link.id = id.to_string();
        link.normalize_path();
        let stored = self.modify(id, move |existing| *existing = link).await?;
        debug!(id = %stored.id, "link updated");
        Ok(stored)
    }

    /// Writes a probe result onto the link with `id`
    ///
    /// Only `health` and `last_checked` change, so an edit made while the
    /// probe was in flight survives. Fails with NotFound if the link was
    /// deleted in the meantime.
    pub async fn record_health(
        &self,
        id: &str,
        health: Health,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<Link> {
        self.modify(id, move |existing| {
            existing.health = health;
            existing.last_checked = Some(checked_at);
        })
        .await
    }

    /// Removes the link with `id`
    ///
    /// Returns whether a link was removed; deleting an unknown id is not an
    /// error. The last link takes the removed one's place, so the order of
    /// the remaining links can change.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut links = self.links.write().await;
        let Some(index) = links.iter().position(|l| l.id == id) else {
            return Ok(false);
        };

        let mut staged = links.clone();
        staged.swap_remove(index);
        self.persist(&staged).await?;
        *links = staged;

        debug!(%id, "link deleted");
        Ok(true)
    }

    async fn modify<F>(&self, id: &str, change: F) -> StoreResult<Link>
    where
        F: FnOnce(&mut Link),
    {
        let mut links = self.links.write().await;
        let index = links
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut staged = links.clone();
        change(&mut staged[index]);
        let stored = staged[index].clone();
        self.persist(&staged).await?;
        *links = staged;

        Ok(stored)
    }

    // Writes the full set next to links.json and renames it into place, so
    // the file on disk is always a complete set.
    async fn persist(&self, links: &[Link]) -> StoreResult<()> {
        // Serialize first: if this fails nothing on disk has been touched
        let data = serde_json::to_vec_pretty(links)?;
        let tmp = self.file.with_extension("json.tmp");

        // Step 1: write and fsync the temp file
        // If any part fails, remove the partial temp file before returning
        if let Err(e) = write_synced(&tmp, &data).await {
            discard(&tmp).await;
            return Err(StoreError::io(&tmp, e));
        }

        // Step 2: swap it in
        // rename() replaces links.json in one step; readers of the file see
        // either the old set or the new one, never half of each
        if let Err(e) = fs::rename(&tmp, &self.file).await {
            discard(&tmp).await;
            return Err(StoreError::io(&self.file, e));
        }

        // Step 3: make the rename itself durable
        // The new contents are already in place at this point, so a failure
        // here is only logged; reporting Err would leave memory behind disk.
        if let Some(dir) = self.file.parent() {
            if let Err(e) = sync_dir(dir).await {
                warn!(path = %dir.display(), error = %e, "failed to sync data directory");
            }
        }
        Ok(())
    }
}

// Creates `path`, writes `data` and waits until it has reached the disk
async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

// Best-effort removal of a temp file after a failed write
async fn discard(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %tmp.display(), error = %e, "failed to remove temp file");
        }
    }
}

// On Unix a rename is only durable once the directory entry is flushed too
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

// Directories can't be opened as files on Windows
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why copy the whole Vec on every change?
//    - We write the whole set to disk anyway, so the copy is not the
//      expensive part
//    - It gives us a simple rule: memory only changes after the file did
//
// 2. Why tokio's RwLock and not std's?
//    - persist() awaits file I/O while the write guard is held
//    - A std guard held across .await would block the runtime thread and
//      makes the future !Send
//
// 3. Why swap_remove in delete?
//    - O(1) removal; the order of links in the file is not meaningful
// -----------------------------------------------------------------------------

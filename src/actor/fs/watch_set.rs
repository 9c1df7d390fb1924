use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rustc_hash::FxHashSet;

use super::filter::is_tracked;

/// Paths the Change Source monitors: the root plus every tracked file found
/// so far.
///
/// Grows as new files are discovered, never shrinks. A removed file stays
/// in the set; its watch is marked stale and re-attached if it comes back.
pub struct WatchSet {
    root: PathBuf,
    files: FxHashSet<PathBuf>,
    /// Members whose OS watch is not (or no longer) attached
    stale: FxHashSet<PathBuf>,
}

impl WatchSet {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            files: FxHashSet::default(),
            stale: FxHashSet::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[cfg(test)]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// Add a file. Returns false if it was already a member.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.files.insert(path)
    }

    /// Walk the root and return tracked files that are not members yet.
    ///
    /// Hidden directories are not descended into. Walk errors (permission
    /// denied, file vanished mid-walk) skip that entry.
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = WalkDir::new(&self.root)
            .skip_hidden(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    crate::debug!("watch"; "walk error: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path())
            .filter(|path| is_tracked(path, &self.root) && !self.files.contains(path))
            .collect();
        found.sort();
        found
    }

    pub fn mark_stale(&mut self, path: &Path) {
        if self.files.contains(path) {
            self.stale.insert(path.to_path_buf());
        }
    }

    pub fn mark_attached(&mut self, path: &Path) {
        self.stale.remove(path);
    }

    /// Stale members that exist on disk again.
    pub fn reattachable(&self) -> Vec<PathBuf> {
        self.stale.iter().filter(|p| p.exists()).cloned().collect()
    }

    #[cfg(test)]
    pub fn stale_len(&self) -> usize {
        self.stale.len()
    }
}

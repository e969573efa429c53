//! Directory listing and recursive name search over the sandboxed collection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::discovery::{is_font, is_font_name};
use crate::sandbox::{PathSandbox, SandboxError};

/// Name shown for the sentinel entry of an unreadable directory.
pub const PERMISSION_DENIED_ENTRY: &str = "[Permission Denied]";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error("listing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Folder,
    FontFile,
    /// Sentinel for a directory the process may not read.
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl CatalogEntry {
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Folder,
        }
    }

    pub fn font(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::FontFile,
        }
    }

    pub fn denied() -> Self {
        Self {
            name: PERMISSION_DENIED_ENTRY.to_string(),
            kind: EntryKind::Denied,
        }
    }

    pub fn is_denied(&self) -> bool {
        self.kind == EntryKind::Denied
    }
}

/// A font found by [`CatalogIndex::search`], possibly deep inside the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    pub display_name: String,
    pub relative_path: PathBuf,
}

impl SearchResult {
    /// Absolute location of the hit, re-checked against the sandbox.
    pub fn resolve(&self, sandbox: &PathSandbox) -> Result<PathBuf, SandboxError> {
        sandbox.resolve(&self.relative_path)
    }
}

/// Lists and searches the collection below a [`PathSandbox`].
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    sandbox: PathSandbox,
    follow_symlinks: bool,
}

impl CatalogIndex {
    pub fn new(sandbox: PathSandbox) -> Self {
        Self {
            sandbox,
            follow_symlinks: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn sandbox(&self) -> &PathSandbox {
        &self.sandbox
    }

    /// Immediate children of `directory`: folders first, then fonts, each group
    /// ordered by case-insensitive name.
    ///
    /// A permission failure does not error out; whatever was gathered is kept and
    /// a single [`EntryKind::Denied`] entry is appended.
    pub fn list(&self, directory: impl AsRef<Path>) -> Result<Vec<CatalogEntry>, CatalogError> {
        let dir = self.sandbox.resolve(directory)?;
        let children = fs::read_dir(&dir).map(|entries| {
            entries.map(|entry| {
                entry.map(|entry| {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    // Follows symlinks so a linked folder still browses as a folder.
                    let is_folder = entry.path().is_dir();
                    (name, is_folder)
                })
            })
        });

        let listing = assemble_listing(children).map_err(|source| CatalogError::Io {
            path: dir.clone(),
            source,
        })?;
        if listing.last().is_some_and(CatalogEntry::is_denied) {
            debug!(dir = %dir.display(), "permission denied while listing");
        }
        Ok(listing)
    }

    /// Case-insensitive substring search over font file names below the root.
    ///
    /// An empty query yields nothing; callers fall back to [`CatalogIndex::list`].
    /// Results follow walk order, which is not stable across platforms.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        if query.is_empty() {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        let root = self.sandbox.root();
        let mut results = Vec::new();

        for entry in WalkDir::new(root).follow_links(self.follow_symlinks) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable path during search");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_font(entry.path()) {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !name.to_lowercase().contains(&needle) {
                continue;
            }

            if let Ok(relative_path) = entry.path().strip_prefix(root) {
                results.push(SearchResult {
                    display_name: name.into_owned(),
                    relative_path: relative_path.to_path_buf(),
                });
            }
        }

        debug!(query, hits = results.len(), "search finished");
        results
    }
}

/// Orders the children of one directory read as `(name, is_folder)` pairs.
///
/// Permission failures, on the directory itself or partway through its
/// entries, end the read and append [`CatalogEntry::denied`] after whatever
/// was gathered. Other per-entry failures skip that entry.
fn assemble_listing<I>(children: io::Result<I>) -> io::Result<Vec<CatalogEntry>>
where
    I: IntoIterator<Item = io::Result<(String, bool)>>,
{
    let mut folders = Vec::new();
    let mut fonts = Vec::new();
    let mut denied = false;

    match children {
        Ok(children) => {
            for child in children {
                let (name, is_folder) = match child {
                    Ok(child) => child,
                    Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                        denied = true;
                        break;
                    }
                    Err(err) => {
                        debug!(error = %err, "skipping unreadable entry");
                        continue;
                    }
                };
                if is_folder {
                    folders.push(name);
                } else if is_font_name(&name) {
                    fonts.push(name);
                }
            }
        }
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => denied = true,
        Err(err) => return Err(err),
    }

    sort_names(&mut folders);
    sort_names(&mut fonts);

    let mut listing: Vec<CatalogEntry> = folders
        .into_iter()
        .map(CatalogEntry::folder)
        .chain(fonts.into_iter().map(CatalogEntry::font))
        .collect();
    if denied {
        listing.push(CatalogEntry::denied());
    }
    Ok(listing)
}

fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
}

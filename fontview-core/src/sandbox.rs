//! Confinement of every navigation and search path to a single root directory.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("cannot navigate outside the font collection: {}", .0.display())]
    Denied(PathBuf),
    #[error("cannot resolve sandbox root {}: {source}", .root.display())]
    Root {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fixed root that all browsing resolves against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    /// Build a sandbox; the root is made absolute and lexically normalized once.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let root = root.as_ref();
        let absolute = std::path::absolute(root).map_err(|source| SandboxError::Root {
            root: root.to_path_buf(),
            source,
        })?;
        Ok(Self {
            root: normalize(&absolute),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize `candidate` and accept it only if it is the root or lies below it.
    ///
    /// Relative candidates are taken relative to the root. The comparison is made
    /// on whole components, so a sibling such as `<root>-old` never passes.
    pub fn resolve(&self, candidate: impl AsRef<Path>) -> Result<PathBuf, SandboxError> {
        let candidate = candidate.as_ref();
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };
        let normalized = normalize(&joined);

        if normalized.starts_with(&self.root) {
            Ok(normalized)
        } else {
            Err(SandboxError::Denied(normalized))
        }
    }

    /// Root-relative form of a confined path; the root itself maps to an empty path.
    pub fn relative(&self, path: impl AsRef<Path>) -> Result<PathBuf, SandboxError> {
        let resolved = self.resolve(path)?;
        Ok(resolved
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_default())
    }

    /// Parent directory of a confined path. The root has no permitted parent.
    pub fn parent(&self, dir: impl AsRef<Path>) -> Result<PathBuf, SandboxError> {
        let resolved = self.resolve(dir)?;
        match resolved.parent() {
            Some(parent) => self.resolve(parent),
            None => Err(SandboxError::Denied(resolved)),
        }
    }
}

/// Lexical normalization: drop `.`, let `..` pop the previous normal component.
///
/// `..` never climbs above the filesystem root. The filesystem is not consulted,
/// so symlinks are not resolved.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

//! Turns a font file on disk into the current [`FontHandle`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::registry::{FontRegistry, RegistrationId};

/// Style used when the registry reports none for a family.
pub const FALLBACK_STYLE: &str = "Regular";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not load font file {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
    #[error("font file {} exposes no family name", .path.display())]
    NoFamily { path: PathBuf },
}

/// The loaded font: where it came from, its canonical family and its styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontHandle {
    pub source_path: PathBuf,
    pub family: String,
    /// Never empty.
    pub available_styles: Vec<String>,
}

impl FontHandle {
    pub fn default_style(&self) -> &str {
        self.available_styles
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_STYLE)
    }

    pub fn has_style(&self, style: &str) -> bool {
        self.available_styles.iter().any(|s| s == style)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.source_path.file_name().and_then(|n| n.to_str())
    }
}

/// Keeps exactly one font registered at a time.
///
/// Replacing the current font releases the previous registration.
#[derive(Debug)]
pub struct FontMetadataLoader<R> {
    registry: R,
    current: Option<(RegistrationId, FontHandle)>,
}

impl<R: FontRegistry> FontMetadataLoader<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn current(&self) -> Option<&FontHandle> {
        self.current.as_ref().map(|(_, handle)| handle)
    }

    /// Read and register `path`, making it the current font.
    ///
    /// On failure the previous font stays current and registered.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&FontHandle, LoadError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|err| LoadError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let registration =
            self.registry
                .register(data)
                .map_err(|err| LoadError::Unreadable {
                    path: path.to_path_buf(),
                    reason: format!("{err:#}"),
                })?;

        let Some(family) = registration.families.first().cloned() else {
            self.registry.release(registration.id);
            return Err(LoadError::NoFamily {
                path: path.to_path_buf(),
            });
        };

        let available_styles = match self.registry.styles(registration.id, &family) {
            Ok(styles) if !styles.is_empty() => styles,
            Ok(_) => vec![FALLBACK_STYLE.to_string()],
            Err(err) => {
                warn!(%family, error = %err, "style query failed, using fallback");
                vec![FALLBACK_STYLE.to_string()]
            }
        };

        if registration.families.len() > 1 {
            debug!(families = ?registration.families, "multiple families, using the first");
        }

        let handle = FontHandle {
            source_path: path.to_path_buf(),
            family,
            available_styles,
        };
        info!(path = %path.display(), family = %handle.family, styles = handle.available_styles.len(), "loaded font");

        if let Some((previous, _)) = self.current.take() {
            self.registry.release(previous);
        }
        let (_, handle) = self.current.insert((registration.id, handle));
        Ok(handle)
    }

    /// Release the current font, if any.
    pub fn unload(&mut self) {
        if let Some((id, handle)) = self.current.take() {
            debug!(family = %handle.family, "unloading font");
            self.registry.release(id);
        }
    }
}

//! Runtime configuration, resolved from the environment.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::install::ElevatedCommand;

pub const ROOT_ENV: &str = "FONTVIEW_ROOT";
pub const SYSTEM_FONT_DIR_ENV: &str = "FONTVIEW_SYSTEM_FONT_DIR";
pub const FOLLOW_SYMLINKS_ENV: &str = "FONTVIEW_FOLLOW_SYMLINKS";

pub const DEFAULT_SYSTEM_FONT_DIR: &str = "/usr/share/fonts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Collection root; all browsing is confined below it.
    pub root: PathBuf,
    /// Install target.
    pub system_font_dir: PathBuf,
    /// Program and arguments that rebuild the system font cache.
    pub cache_command: Vec<String>,
    pub follow_symlinks: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            system_font_dir: PathBuf::from(DEFAULT_SYSTEM_FONT_DIR),
            cache_command: vec!["fc-cache".to_string(), "-f".to_string()],
            follow_symlinks: false,
        }
    }
}

impl ViewerConfig {
    /// Defaults overridden by `FONTVIEW_ROOT`, `FONTVIEW_SYSTEM_FONT_DIR` and
    /// `FONTVIEW_FOLLOW_SYMLINKS`. Empty values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(root) = env_path(ROOT_ENV) {
            config.root = root;
        }
        if let Some(dir) = env_path(SYSTEM_FONT_DIR_ENV) {
            config.system_font_dir = dir;
        }
        if let Ok(raw) = env::var(FOLLOW_SYMLINKS_ENV) {
            config.follow_symlinks = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        config
    }

    /// Create the root directory if it does not exist yet.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating font collection root {}", self.root.display()))
    }

    pub fn cache_command(&self) -> ElevatedCommand {
        match self.cache_command.split_first() {
            Some((program, args)) => ElevatedCommand::new(program, args),
            None => ElevatedCommand::new("fc-cache", ["-f"]),
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn default_root() -> PathBuf {
    let home = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join("Documents").join("fontcollection")
}

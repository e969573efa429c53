//! Installing the selected font into the system font directory.
//!
//! Each attempt runs two elevated commands in sequence: a copy of the font file
//! and a font cache rebuild. The copy gates the rebuild; a failing rebuild is
//! reported as [`InstallOutcome::CacheRefreshFailed`] but leaves the font in place.

use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallStatus {
    NotSelected,
    NotInstalled,
    Installed,
}

/// Phases of one install attempt, reported to the caller's progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallPhase {
    Idle,
    CredentialPrompted,
    Copying,
    CacheRefreshing,
    Succeeded,
    FailedCopy,
    FailedCache,
}

impl InstallPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedCopy | Self::FailedCache)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Empty credential: nothing ran.
    Cancelled,
    Installed {
        destination: PathBuf,
    },
    /// The font was copied but the cache rebuild did not succeed.
    CacheRefreshFailed {
        destination: PathBuf,
        diagnostic: String,
    },
    CopyFailed {
        diagnostic: String,
    },
}

impl InstallOutcome {
    pub fn phase(&self) -> InstallPhase {
        match self {
            Self::Cancelled => InstallPhase::Idle,
            Self::Installed { .. } => InstallPhase::Succeeded,
            Self::CacheRefreshFailed { .. } => InstallPhase::FailedCache,
            Self::CopyFailed { .. } => InstallPhase::FailedCopy,
        }
    }
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("no font selected")]
    NotSelected,
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),
    #[error("an installation is already in progress")]
    Busy,
}

/// Secret handed to the elevation capability. Never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A program plus arguments, passed without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevatedCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl ElevatedCommand {
    pub fn new<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn copy(source: &Path, destination: &Path) -> Self {
        Self::new(
            "cp",
            [
                OsString::from("--"),
                source.as_os_str().to_owned(),
                destination.as_os_str().to_owned(),
            ],
        )
    }
}

impl fmt::Display for ElevatedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr.
    pub output: String,
}

/// Privilege-elevation capability: run a command with elevated rights.
pub trait Elevator {
    fn run(&self, command: &ElevatedCommand, secret: &Credential) -> Result<CommandOutput>;
}

/// Elevation through `sudo -S`, feeding the secret on stdin.
#[derive(Debug, Clone)]
pub struct SudoElevator {
    sudo: PathBuf,
}

impl SudoElevator {
    pub fn new() -> Self {
        Self {
            sudo: PathBuf::from("sudo"),
        }
    }

    pub fn with_program(sudo: impl Into<PathBuf>) -> Self {
        Self { sudo: sudo.into() }
    }
}

impl Default for SudoElevator {
    fn default() -> Self {
        Self::new()
    }
}

impl Elevator for SudoElevator {
    fn run(&self, command: &ElevatedCommand, secret: &Credential) -> Result<CommandOutput> {
        let mut child = Command::new(&self.sudo)
            .args(["-S", "-p", "", "--"])
            .arg(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning {} {command}", self.sudo.display()))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits before reading stdin closes the pipe; its exit
            // status below still tells us what happened.
            if let Err(err) = writeln!(stdin, "{}", secret.expose()) {
                warn!(error = %err, "could not write credential to sudo");
            }
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("waiting for {command}"))?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            output: combined,
        })
    }
}

/// Copies fonts into `system_font_dir` and refreshes the font cache.
#[derive(Debug)]
pub struct InstallationManager<E> {
    system_font_dir: PathBuf,
    cache_command: ElevatedCommand,
    elevator: E,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<E: Elevator> InstallationManager<E> {
    pub fn new(system_font_dir: impl Into<PathBuf>, cache_command: ElevatedCommand, elevator: E) -> Self {
        Self {
            system_font_dir: system_font_dir.into(),
            cache_command,
            elevator,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn elevator(&self) -> &E {
        &self.elevator
    }

    /// Where `selected` would be installed.
    pub fn destination(&self, selected: &Path) -> Result<PathBuf, InstallError> {
        let name = selected
            .file_name()
            .ok_or_else(|| InstallError::NoFileName(selected.to_path_buf()))?;
        Ok(self.system_font_dir.join(name))
    }

    /// Installed when a file of the same name already exists in the system directory.
    pub fn check_status(&self, selected: Option<&Path>) -> InstallStatus {
        let Some(selected) = selected else {
            return InstallStatus::NotSelected;
        };
        match self.destination(selected) {
            Ok(dest) if dest.exists() => InstallStatus::Installed,
            _ => InstallStatus::NotInstalled,
        }
    }

    /// Run one install attempt. `progress` sees every phase the attempt enters.
    ///
    /// An empty credential is a cancelled prompt: nothing is spawned or written.
    pub fn install(
        &self,
        selected: Option<&Path>,
        credential: &Credential,
        progress: &mut dyn FnMut(InstallPhase),
    ) -> Result<InstallOutcome, InstallError> {
        let selected = selected.ok_or(InstallError::NotSelected)?;
        if credential.is_empty() {
            return Ok(InstallOutcome::Cancelled);
        }
        let destination = self.destination(selected)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(InstallError::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        progress(InstallPhase::CredentialPrompted);
        progress(InstallPhase::Copying);
        let copy = ElevatedCommand::copy(selected, &destination);
        let copied = match self.elevator.run(&copy, credential) {
            Ok(out) if out.success => Ok(()),
            Ok(out) => Err(if out.output.trim().is_empty() {
                format!("{copy} exited with status {:?}", out.code)
            } else {
                out.output
            }),
            Err(err) => Err(format!("{err:#}")),
        };
        if let Err(diagnostic) = copied {
            warn!(source = %selected.display(), %diagnostic, "font copy failed");
            progress(InstallPhase::FailedCopy);
            return Ok(InstallOutcome::CopyFailed { diagnostic });
        }

        progress(InstallPhase::CacheRefreshing);
        let refreshed = match self.elevator.run(&self.cache_command, credential) {
            Ok(out) if out.success => None,
            Ok(out) => Some(if out.output.trim().is_empty() {
                format!("{} exited with status {:?}", self.cache_command, out.code)
            } else {
                out.output
            }),
            Err(err) => Some(format!("{err:#}")),
        };

        match refreshed {
            None => {
                info!(destination = %destination.display(), "font installed");
                progress(InstallPhase::Succeeded);
                Ok(InstallOutcome::Installed { destination })
            }
            Some(diagnostic) => {
                warn!(destination = %destination.display(), %diagnostic, "font cache refresh failed");
                progress(InstallPhase::FailedCache);
                Ok(InstallOutcome::CacheRefreshFailed {
                    destination,
                    diagnostic,
                })
            }
        }
    }
}

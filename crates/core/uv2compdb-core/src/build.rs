//! Triggering a µVision build to produce missing artifacts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Error;

/// Outcome of a command-line build, decoded from the `uv4` exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// No errors or warnings.
    Success,
    /// Warnings only.
    WarningsOnly,
    /// Errors.
    Errors,
    /// Fatal errors.
    Fatal,
    /// Any other exit code (project or device problems).
    Other(i32),
}

impl BuildStatus {
    /// Decodes a `uv4` exit code.
    #[must_use]
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::WarningsOnly,
            2 => Self::Errors,
            3 => Self::Fatal,
            other => Self::Other(other),
        }
    }

    /// Whether the build left usable artifacts behind.
    #[must_use]
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Success | Self::WarningsOnly)
    }

    /// Human-readable meaning of the exit code.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "No Errors or Warnings",
            Self::WarningsOnly => "Warnings Only",
            Self::Errors => "Errors",
            Self::Fatal => "Fatal Errors",
            Self::Other(11) => "Cannot open project file for writing",
            Self::Other(12) => "Device with given name is not found in database",
            Self::Other(13) => "Error writing project file",
            Self::Other(15) => "Error reading import XML file",
            Self::Other(20) => "Error converting project",
            Self::Other(_) => "Unknown exit code",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// An external action that builds one target of a project.
pub trait BuildAction {
    /// Builds `target` of the project at `project`, blocking until done.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalInvocation`] if the build tool cannot be
    /// started.
    fn build(&self, project: &Path, target: &str) -> Result<BuildStatus, Error>;
}

/// Command-line build through the µVision IDE (`uv4 -b`).
#[derive(Debug, Clone, Default)]
pub struct Uv4 {
    /// Explicit executable; `uv4` is looked up on `PATH` when unset.
    pub program: Option<PathBuf>,
}

impl Uv4 {
    fn locate(&self) -> Result<PathBuf, Error> {
        if let Some(program) = &self.program {
            return Ok(program.clone());
        }
        which::which("uv4").map_err(|e| Error::ExternalInvocation {
            program: "uv4".into(),
            reason: e.to_string(),
        })
    }
}

impl BuildAction for Uv4 {
    fn build(&self, project: &Path, target: &str) -> Result<BuildStatus, Error> {
        let program = self.locate()?;
        let project = std::path::absolute(project).unwrap_or_else(|_| project.to_path_buf());

        let mut cmd = Command::new(&program);
        cmd.arg("-b").arg("-t").arg(target).arg(&project).arg("-j0");
        tracing::info!(
            "Run: `{} -b -t {target} {} -j0`",
            program.display(),
            project.display()
        );

        let output = cmd.output().map_err(|e| Error::ExternalInvocation {
            program: program.display().to_string(),
            reason: e.to_string(),
        })?;

        let status = output
            .status
            .code()
            .map_or(BuildStatus::Fatal, BuildStatus::from_exit_code);
        tracing::info!("Exit Code: {status:?} ({status})");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(BuildStatus::from_exit_code(0), BuildStatus::Success);
        assert_eq!(BuildStatus::from_exit_code(1), BuildStatus::WarningsOnly);
        assert_eq!(BuildStatus::from_exit_code(2), BuildStatus::Errors);
        assert_eq!(BuildStatus::from_exit_code(3), BuildStatus::Fatal);
        assert_eq!(BuildStatus::from_exit_code(12), BuildStatus::Other(12));
    }

    #[test]
    fn only_success_and_warnings_are_usable() {
        assert!(BuildStatus::Success.is_usable());
        assert!(BuildStatus::WarningsOnly.is_usable());
        assert!(!BuildStatus::Errors.is_usable());
        assert!(!BuildStatus::Fatal.is_usable());
        assert!(!BuildStatus::Other(20).is_usable());
    }

    #[test]
    fn descriptions() {
        assert_eq!(
            BuildStatus::Other(12).to_string(),
            "Device with given name is not found in database"
        );
        assert_eq!(BuildStatus::Other(99).description(), "Unknown exit code");
    }
}

//! Per-project resolution session.
//!
//! A [`Session`] ties the components together for one loaded project:
//! toolchain identification, the choice between the dependency record and
//! the declared project flags, optional build triggering, and command
//! assembly. It owns the state that must outlive a single target: the set
//! of targets already built and the predefined-macro memo.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use uvproj::{EffectiveFlags, FlagSet, Project, RenderOptions, Target, to_posix_path};

use crate::build::{BuildAction, Uv4};
use crate::command::{self, CommandObject, FileObject};
use crate::dep;
use crate::error::Error;
use crate::family::Family;
use crate::macros::{CompilerRunner, MacroExtractor, ProcessRunner};
use crate::toolchain::{self, Toolchain};

/// Caller-controlled behavior of a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Run the build when a needed artifact is missing.
    pub trigger_build: bool,
    /// Prepend the compiler's predefined macros to non-assembly commands.
    pub predefined_macros: bool,
    /// Appended to every command before `-c` and the file.
    pub extra_args: Vec<String>,
    /// Rendering of project-declared flags.
    pub render: RenderOptions,
    /// Overrides `PATH` when looking for compilers.
    pub search_path: Option<OsString>,
}

/// Where a target's per-file arguments came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSource {
    /// The `.dep` record of the last build.
    DependencyRecord,
    /// Flags declared in the project, merged target → group → file.
    ProjectFlags,
}

/// A target resolved down to its files.
#[derive(Debug, Clone)]
pub struct TargetSetting {
    /// Target name.
    pub name: String,
    /// The toolchain used for every file of the target.
    pub toolchain: Toolchain,
    /// Files in project or record order.
    pub files: Vec<FileObject>,
    /// Origin of the file arguments.
    pub source: FileSource,
}

/// Resolves the targets of one project.
pub struct Session<'p> {
    project: &'p Project,
    options: Options,
    directory: String,
    builder: Box<dyn BuildAction>,
    macros: MacroExtractor,
    built: HashSet<String>,
}

impl<'p> Session<'p> {
    /// Creates a session that builds with `uv4` and queries compilers as
    /// child processes.
    #[must_use]
    pub fn new(project: &'p Project, options: Options) -> Self {
        Self::with_collaborators(
            project,
            options,
            Box::new(Uv4::default()),
            Box::new(ProcessRunner),
        )
    }

    /// Creates a session with explicit external collaborators.
    #[must_use]
    pub fn with_collaborators(
        project: &'p Project,
        options: Options,
        builder: Box<dyn BuildAction>,
        runner: Box<dyn CompilerRunner>,
    ) -> Self {
        Self {
            project,
            options,
            directory: working_directory(project.dir()),
            builder,
            macros: MacroExtractor::new(runner),
            built: HashSet::new(),
        }
    }

    /// The project being resolved.
    #[must_use]
    pub fn project(&self) -> &'p Project {
        self.project
    }

    /// Directory recorded in every command object.
    #[must_use]
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Resolves `target_name` into its toolchain and files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotFound`] for an unknown name and
    /// [`Error::ToolchainUnresolved`] when no toolchain can be identified.
    pub fn resolve(&mut self, target_name: &str) -> Result<TargetSetting, Error> {
        let project = self.project;
        let target = project
            .target(target_name)
            .ok_or_else(|| Error::TargetNotFound(target_name.to_owned()))?;

        let toolchain = self.resolve_toolchain(target)?;
        tracing::info!("Toolchain: {toolchain}");

        let (files, source) = if toolchain.family.has_dependency_record() {
            let files = self.parse_dependency_record(target);
            if files.is_empty() {
                tracing::warn!("no usable dependency record, falling back to project flags");
                (
                    self.parse_project_flags(target, toolchain.family),
                    FileSource::ProjectFlags,
                )
            } else {
                (files, FileSource::DependencyRecord)
            }
        } else {
            (
                self.parse_project_flags(target, toolchain.family),
                FileSource::ProjectFlags,
            )
        };
        tracing::debug!("target '{target_name}': {} file(s) from {source:?}", files.len());

        Ok(TargetSetting {
            name: target_name.to_owned(),
            toolchain,
            files,
            source,
        })
    }

    /// Identifies the toolchain of `target`: build log first, declared
    /// toolset second.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolchainUnresolved`] when both strategies fail.
    pub fn resolve_toolchain(&mut self, target: &Target) -> Result<Toolchain, Error> {
        if let Some(path) = toolchain::build_log_path(self.project, target) {
            match self.ensure_artifact(path, target.name()) {
                Ok(path) => {
                    if let Some(tc) = toolchain::read_build_log(&path) {
                        return Ok(tc);
                    }
                    tracing::debug!("build log {} names no known toolchain", path.display());
                }
                Err(e) => tracing::debug!("{e}"),
            }
        }

        toolchain::from_metadata(
            target,
            self.options.search_path.as_deref(),
            self.project.dir(),
        )
        .ok_or_else(|| Error::ToolchainUnresolved(target.name().to_owned()))
    }

    /// Reads the target's `.dep` record. Empty when the record is missing
    /// or holds no file entries.
    pub fn parse_dependency_record(&mut self, target: &Target) -> Vec<FileObject> {
        let Some(path) = dep::dep_path(self.project, target) else {
            tracing::warn!("target '{}' declares no output directory", target.name());
            return Vec::new();
        };

        let path = match self.ensure_artifact(path, target.name()) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("{e}");
                return Vec::new();
            }
        };

        match std::fs::read(&path) {
            Ok(bytes) => dep::parse(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                tracing::warn!("failed to read {}: {e}", path.display());
                Vec::new()
            }
        }
    }

    /// Merges the declared flags of every included source file of
    /// `target`.
    #[must_use]
    pub fn parse_project_flags(&self, target: &Target, family: Family) -> Vec<FileObject> {
        let dialect = family.dialect();
        let Some(target_flags) = FlagSet::resolve(target, dialect) else {
            tracing::warn!("target '{}' is excluded from the build", target.name());
            return Vec::new();
        };
        let base = EffectiveFlags::from(&target_flags);

        let mut files = Vec::new();
        for group in target.groups() {
            let Some(group_flags) = FlagSet::resolve(&group, dialect) else {
                tracing::debug!("skipping excluded group {:?}", group.name().unwrap_or_default());
                continue;
            };
            let group_level = base.merge(&group_flags);

            for entry in group.files() {
                let Some(path) = entry.path().filter(|p| command::is_source(p)) else {
                    continue;
                };
                let Some(file_flags) = FlagSet::resolve(&entry, dialect) else {
                    tracing::debug!("skipping excluded file {path}");
                    continue;
                };
                files.push(FileObject {
                    file: to_posix_path(path),
                    arguments: group_level.merge(&file_flags).render(&self.options.render),
                });
            }
        }
        files
    }

    /// Turns a resolved target into command objects.
    pub fn command_objects(&mut self, setting: &TargetSetting) -> Vec<CommandObject> {
        setting
            .files
            .iter()
            .map(|file| {
                let predefined =
                    if self.options.predefined_macros && !command::is_assembly(&file.file) {
                        self.macros.extract(&setting.toolchain, &file.arguments)
                    } else {
                        Vec::new()
                    };
                command::assemble(
                    &self.directory,
                    &setting.toolchain,
                    file,
                    &predefined,
                    &self.options.extra_args,
                )
            })
            .collect()
    }

    /// Resolves `target_name` and assembles its commands.
    ///
    /// # Errors
    ///
    /// See [`Session::resolve`].
    pub fn generate(&mut self, target_name: &str) -> Result<Vec<CommandObject>, Error> {
        let setting = self.resolve(target_name)?;
        Ok(self.command_objects(&setting))
    }

    /// Returns `path` if it exists, building the target at most once per
    /// session to produce it.
    fn ensure_artifact(&mut self, path: PathBuf, target: &str) -> Result<PathBuf, Error> {
        if path.is_file() {
            return Ok(path);
        }
        if !self.options.trigger_build || !self.built.insert(target.to_owned()) {
            return Err(Error::ArtifactUnavailable(path));
        }

        match self.builder.build(self.project.path(), target) {
            Ok(status) if status.is_usable() => {
                if path.is_file() {
                    return Ok(path);
                }
            }
            Ok(status) => tracing::warn!("build of '{target}' failed: {status}"),
            Err(e) => tracing::warn!("{e}"),
        }
        Err(Error::ArtifactUnavailable(path))
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("project", &self.project.path())
            .field("options", &self.options)
            .field("directory", &self.directory)
            .field("built", &self.built)
            .finish_non_exhaustive()
    }
}

/// Absolute project directory with `/` separators and no verbatim prefix.
fn working_directory(dir: &Path) -> String {
    let resolved = dir
        .canonicalize()
        .or_else(|_| std::path::absolute(dir))
        .unwrap_or_else(|_| dir.to_path_buf());
    let text = resolved.to_string_lossy();
    let text = text.strip_prefix(r"\\?\").unwrap_or(&text);
    to_posix_path(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_directory_is_absolute() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = working_directory(tmp.path());
        assert!(Path::new(&dir).is_absolute());
        assert!(!dir.contains('\\'));
    }

    #[test]
    fn unknown_target() {
        let project = Project::parse(
            "<Project><Targets><Target><TargetName>A</TargetName></Target></Targets></Project>",
            "p.uvprojx",
        )
        .unwrap();
        let mut session = Session::new(&project, Options::default());
        assert!(matches!(session.resolve("B"), Err(Error::TargetNotFound(name)) if name == "B"));
    }
}

//! Per-file resolution results and final command assembly.

use serde::Serialize;

use crate::policy;
use crate::toolchain::Toolchain;

/// Extensions of files that take part in a build.
pub const SOURCE_EXTENSIONS: &[&str] = &[".a51", ".s", ".c", ".cpp", ".cc", ".cx", ".cxx"];

/// Extensions handled by the assembler rather than the compiler.
pub const ASSEMBLY_EXTENSIONS: &[&str] = &[".a51", ".s"];

fn has_extension(file: &str, extensions: &[&str]) -> bool {
    let file = file.to_ascii_lowercase();
    extensions.iter().any(|ext| file.ends_with(ext))
}

/// Whether `file` is a compilable or assemblable source.
#[must_use]
pub fn is_source(file: &str) -> bool {
    has_extension(file, SOURCE_EXTENSIONS)
}

/// Whether `file` goes to the assembler.
#[must_use]
pub fn is_assembly(file: &str) -> bool {
    has_extension(file, ASSEMBLY_EXTENSIONS)
}

/// One source file of a resolved target with its own arguments, before the
/// program and toolchain-derived flags are added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileObject {
    /// Path as written in the project or dependency record.
    pub file: String,
    /// Resolved arguments.
    pub arguments: Vec<String>,
}

/// One entry of a compilation database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandObject {
    /// Working directory of the invocation.
    pub directory: String,
    /// The source file.
    pub file: String,
    /// Full argument vector, program first.
    pub arguments: Vec<String>,
}

/// Assembles the final command for one file.
///
/// `predefined` is prepended right after the program; it is expected to be
/// empty for assembly files.
#[must_use]
pub fn assemble(
    directory: &str,
    toolchain: &Toolchain,
    file: &FileObject,
    predefined: &[String],
    extra_args: &[String],
) -> CommandObject {
    let assembly = is_assembly(&file.file);
    let program = if assembly {
        &toolchain.assembler
    } else {
        &toolchain.compiler
    };

    let own = policy::filter_args(&file.arguments, toolchain.family.unknown_args());

    let mut arguments = Vec::with_capacity(1 + predefined.len() + own.len() + extra_args.len() + 2);
    arguments.push(program.clone());
    arguments.extend_from_slice(predefined);
    arguments.extend(own);
    arguments.extend_from_slice(extra_args);
    if !assembly {
        arguments.push("-c".to_owned());
    }
    arguments.push(file.file.clone());

    CommandObject {
        directory: directory.to_owned(),
        file: file.file.clone(),
        arguments,
    }
}

//! Toolchain identification.
//!
//! Two sources are consulted, most authoritative first:
//!
//! 1. The `.build_log.htm` left by a previous build, which names the exact
//!    compiler and assembler that were used.
//! 2. The toolset declared in the project, mapped to a nominal executable
//!    that is then looked up on the search path.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use uvproj::{Project, Target, to_posix_path};

use crate::family::Family;

/// A resolved toolchain. Fixed for the rest of a target's processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Compiler family.
    pub family: Family,
    /// Installation `bin` directory, empty when unknown.
    pub dir: String,
    /// Compiler executable.
    pub compiler: String,
    /// Assembler executable.
    pub assembler: String,
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (compiler: {}, assembler: {})",
            self.family, self.compiler, self.assembler
        )
    }
}

fn build_log_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Toolchain Path:[ \t]+([^\n]+)\nC Compiler:[ \t]+(\S+)[^\n]*\nAssembler:[ \t]+(\S+)")
            .expect("build log pattern is valid")
    })
}

/// Location of the build log: `{project_dir}/{OutputDirectory}/{OutputName}.build_log.htm`.
#[must_use]
pub fn build_log_path(project: &Project, target: &Target) -> Option<PathBuf> {
    let dir = target.output_directory().filter(|d| !d.is_empty())?;
    let name = target.output_name().filter(|n| !n.is_empty())?;
    Some(
        project
            .dir()
            .join(to_posix_path(dir))
            .join(format!("{name}.build_log.htm")),
    )
}

/// Extracts the toolchain from build-log text.
///
/// Returns `None` if the three `Toolchain Path` / `C Compiler` /
/// `Assembler` lines are not found consecutively or the compiler name
/// belongs to no known family.
#[must_use]
pub fn parse_build_log(text: &str) -> Option<Toolchain> {
    let text = text.replace("\r\n", "\n");
    let caps = build_log_regex().captures(&text)?;

    let dir = to_posix_path(caps[1].trim());
    let compiler = &caps[2];
    let assembler = &caps[3];

    let Some(family) = Family::from_compiler_name(compiler) else {
        tracing::warn!("unrecognized compiler '{compiler}' in build log");
        return None;
    };

    Some(Toolchain {
        family,
        compiler: format!("{dir}/{compiler}"),
        assembler: format!("{dir}/{assembler}"),
        dir,
    })
}

/// Reads a build log, tolerating invalid UTF-8.
pub(crate) fn read_build_log(path: &Path) -> Option<Toolchain> {
    match std::fs::read(path) {
        Ok(bytes) => parse_build_log(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            tracing::warn!("failed to read {}: {e}", path.display());
            None
        }
    }
}

/// Resolves the toolchain from the declared toolset.
///
/// `search_path` overrides `PATH` for the executable lookup. When the
/// compiler is not found the bare executable names are used with an empty
/// directory.
#[must_use]
pub fn from_metadata(target: &Target, search_path: Option<&OsStr>, cwd: &Path) -> Option<Toolchain> {
    let key = format!(
        "{}{}",
        target.toolset_number()?,
        target.uac6().unwrap_or_default()
    );
    let Some(family) = Family::from_toolset_key(&key) else {
        tracing::warn!("unknown toolset '{key}' in target '{}'", target.name());
        return None;
    };

    let compiler = family.nominal_compiler();
    let assembler = family.nominal_assembler();
    let found = match search_path {
        Some(paths) => which::which_in(compiler, Some(paths), cwd),
        None => which::which(compiler),
    };

    match found {
        Ok(path) => {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            Some(Toolchain {
                family,
                compiler: to_posix_path(&path.to_string_lossy()),
                assembler: to_posix_path(&dir.join(assembler).to_string_lossy()),
                dir: to_posix_path(&dir.to_string_lossy()),
            })
        }
        Err(_) => {
            tracing::debug!("'{compiler}' not found on the search path");
            Some(Toolchain {
                family,
                dir: String::new(),
                compiler: compiler.to_owned(),
                assembler: assembler.to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "<pre>\r\n\
        <h2>Tool Versions:</h2>\r\n\
        IDE-Version: uVision V5.38.0.0\r\n\
        Toolchain:       MDK-ARM Plus  Version: 5.38.0.0\r\n\
        Toolchain Path:  C:\\Keil_v5\\ARM\\ARMCLANG\\Bin\r\n\
        C Compiler:      ArmClang.exe V6.19\r\n\
        Assembler:       Armasm.exe V6.19\r\n\
        Linker/Locator:  ArmLink.exe V6.19\r\n";

    #[test]
    fn parses_build_log() {
        let tc = parse_build_log(LOG).unwrap();
        assert_eq!(tc.family, Family::ArmClang);
        assert_eq!(tc.dir, "C:/Keil_v5/ARM/ARMCLANG/Bin");
        assert_eq!(tc.compiler, "C:/Keil_v5/ARM/ARMCLANG/Bin/ArmClang.exe");
        assert_eq!(tc.assembler, "C:/Keil_v5/ARM/ARMCLANG/Bin/Armasm.exe");
    }

    #[test]
    fn c51_build_log() {
        let log = "Toolchain Path:  C:\\Keil\\C51\\BIN\nC Compiler:      C51.exe V9.60\nAssembler:       A51.exe V8.2\n";
        let tc = parse_build_log(log).unwrap();
        assert_eq!(tc.family, Family::C51);
        assert_eq!(tc.assembler, "C:/Keil/C51/BIN/A51.exe");
    }

    #[test]
    fn build_log_without_toolchain_lines() {
        assert!(parse_build_log("Build target 'Debug'\nlinking...\n").is_none());
    }

    #[test]
    fn build_log_with_unknown_compiler() {
        let log = "Toolchain Path:  /opt/gcc/bin\nC Compiler:      gcc V12\nAssembler:       as V2\n";
        assert!(parse_build_log(log).is_none());
    }
}

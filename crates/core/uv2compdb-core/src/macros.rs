//! Compiler-intrinsic predefined macros.
//!
//! Language servers do not know the vendor compilers' built-in macros, so
//! they are appended to each command as `-D` flags. ARM compilers are asked
//! directly; C51 has no such query and uses a fixed table instead.

use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Error;
use crate::family::MacroQuery;
use crate::policy::{self, MACRO_QUERY_ARGS};
use crate::toolchain::Toolchain;

/// Cx51 language-extension keywords and the C they stand for.
const C51_EXTENSION_KEYWORDS: &[(&str, &str)] = &[
    // Data types
    ("bit", "unsigned char"),
    ("sbit", "volatile unsigned char"),
    ("sfr", "volatile unsigned char"),
    ("sfr16", "volatile unsigned short"),
    // Memory models
    ("small", ""),
    ("compact", ""),
    ("large", ""),
    // Memory types
    ("bdata", ""),
    ("data", ""),
    ("idata", ""),
    ("pdata", ""),
    ("xdata", ""),
    ("far", ""),
    ("code", ""),
    // Other
    ("_at_", ""),
    ("alien", ""),
    ("interrupt", ""),
    ("_priority_", ""),
    ("reentrant", ""),
    ("_task_", ""),
    ("using", ""),
];

// ---- Runner -----------------------------------------------------------------

/// Runs a compiler and captures its standard output.
pub trait CompilerRunner {
    /// Runs `program` with `args` and empty stdin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalInvocation`] if the program cannot be
    /// started or exits unsuccessfully.
    fn run(&self, program: &str, args: &[String]) -> Result<String, Error>;
}

/// Runs compilers as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CompilerRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, Error> {
        tracing::info!("Get predefined macros by: `{program} {}`", args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::ExternalInvocation {
                program: program.to_owned(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ExternalInvocation {
                program: program.to_owned(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ---- Extractor --------------------------------------------------------------

/// Produces predefined-macro flags, memoized per compiler and filtered
/// argument list.
pub struct MacroExtractor {
    runner: Box<dyn CompilerRunner>,
    cache: HashMap<(String, Vec<String>), Vec<String>>,
}

impl MacroExtractor {
    /// Creates an extractor that runs compilers through `runner`.
    #[must_use]
    pub fn new(runner: Box<dyn CompilerRunner>) -> Self {
        Self {
            runner,
            cache: HashMap::new(),
        }
    }

    /// Returns the macro flags for a file compiled with `args`.
    ///
    /// Never fails: an unsuccessful query logs a warning and yields an
    /// empty list, which is remembered like any other result.
    pub fn extract(&mut self, toolchain: &Toolchain, args: &[String]) -> Vec<String> {
        let flags = match toolchain.family.macro_query() {
            MacroQuery::Static => return c51_macros(&toolchain.dir),
            MacroQuery::Invoke(flags) => flags,
        };

        let filtered = policy::filter_args(args, MACRO_QUERY_ARGS);
        let key = (toolchain.compiler.clone(), filtered);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let mut query = key.1.clone();
        query.extend(flags.iter().map(|f| (*f).to_owned()));

        let macros = match self.runner.run(&toolchain.compiler, &query) {
            Ok(stdout) => parse_macro_listing(&stdout),
            Err(e) => {
                tracing::warn!("{e}");
                Vec::new()
            }
        };
        self.cache.insert(key, macros.clone());
        macros
    }
}

impl Default for MacroExtractor {
    fn default() -> Self {
        Self::new(Box::new(ProcessRunner))
    }
}

impl std::fmt::Debug for MacroExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroExtractor")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Fixed C51 macros plus the include directory next to the toolchain's
/// `bin` directory.
fn c51_macros(dir: &str) -> Vec<String> {
    let mut out = vec!["-D__C51__".to_owned()];
    out.extend(
        C51_EXTENSION_KEYWORDS
            .iter()
            .map(|(kw, val)| format!("-D{kw}={val}")),
    );
    if let Some(idx) = dir.to_ascii_lowercase().rfind("bin") {
        out.push(format!("-I{}inc{}", &dir[..idx], &dir[idx + 3..]));
    }
    out
}

fn define_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#define\s+(\S+)(?:\s+(.*))?$").expect("define pattern is valid"))
}

/// Converts a `#define NAME VALUE` listing into `-DNAME=VALUE` flags.
#[must_use]
pub fn parse_macro_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| define_regex().captures(line.trim()))
        .map(|caps| {
            let value = caps.get(2).map_or("", |m| m.as_str().trim());
            format!("-D{}={value}", &caps[1])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::family::Family;

    #[derive(Clone, Default)]
    struct Recording {
        calls: Rc<RefCell<Vec<(String, Vec<String>)>>>,
        fail: bool,
    }

    impl CompilerRunner for Recording {
        fn run(&self, program: &str, args: &[String]) -> Result<String, Error> {
            self.calls
                .borrow_mut()
                .push((program.to_owned(), args.to_vec()));
            if self.fail {
                return Err(Error::ExternalInvocation {
                    program: program.to_owned(),
                    reason: "exit status: 1".into(),
                });
            }
            Ok("#define __ARMCC_VERSION 6190004\n#define __arm__ 1\nnot a define\n#define __EMPTY\n".into())
        }
    }

    fn toolchain(family: Family, dir: &str) -> Toolchain {
        Toolchain {
            family,
            dir: dir.into(),
            compiler: format!("{dir}/{}", family.nominal_compiler()),
            assembler: format!("{dir}/{}", family.nominal_assembler()),
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn listing_parsing() {
        let out = parse_macro_listing("#define A 1\n  #define B  two words \n#define C\n#undef D\n");
        assert_eq!(out, ["-DA=1", "-DB=two words", "-DC="]);
    }

    #[test]
    fn armclang_query_shape() {
        let runner = Recording::default();
        let mut ex = MacroExtractor::new(Box::new(runner.clone()));
        let tc = toolchain(Family::ArmClang, "/keil/ARMCLANG/bin");

        let out = ex.extract(&tc, &strings(&["-xc", "-Iinc", "-DX", "-o", "a.o", "-MD"]));

        assert_eq!(out, ["-D__ARMCC_VERSION=6190004", "-D__arm__=1", "-D__EMPTY="]);
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/keil/ARMCLANG/bin/armclang");
        assert_eq!(
            calls[0].1,
            strings(&["-xc", "-Iinc", "-DX", "--target=arm-arm-none-eabi", "-dM", "-E", "-"])
        );
    }

    #[test]
    fn armcc_lists_macros() {
        let runner = Recording::default();
        let mut ex = MacroExtractor::new(Box::new(runner.clone()));
        ex.extract(&toolchain(Family::ArmCc, "/keil/ARMCC/bin"), &strings(&["--c99"]));
        assert_eq!(runner.calls.borrow()[0].1, strings(&["--c99", "--list_macros"]));
    }

    #[test]
    fn memoized_per_filtered_arguments() {
        let runner = Recording::default();
        let mut ex = MacroExtractor::new(Box::new(runner.clone()));
        let tc = toolchain(Family::ArmClang, "/bin");

        let first = ex.extract(&tc, &strings(&["-O2", "-o", "a.o"]));
        let second = ex.extract(&tc, &strings(&["-O2", "-o", "b.o"]));
        ex.extract(&tc, &strings(&["-O0"]));

        assert_eq!(first, second);
        assert_eq!(runner.calls.borrow().len(), 2);
    }

    #[test]
    fn failures_are_empty_and_memoized() {
        let runner = Recording {
            fail: true,
            ..Recording::default()
        };
        let mut ex = MacroExtractor::new(Box::new(runner.clone()));
        let tc = toolchain(Family::ArmClang, "/bin");

        assert!(ex.extract(&tc, &[]).is_empty());
        assert!(ex.extract(&tc, &[]).is_empty());
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn c51_is_static() {
        let runner = Recording::default();
        let mut ex = MacroExtractor::new(Box::new(runner.clone()));
        let out = ex.extract(&toolchain(Family::C51, "C:/Keil/C51/BIN"), &[]);

        assert!(runner.calls.borrow().is_empty());
        assert_eq!(out[0], "-D__C51__");
        assert_eq!(out[1], "-Dbit=unsigned char");
        assert!(out.contains(&"-Dreentrant=".to_owned()));
        assert_eq!(out.last().map(String::as_str), Some("-IC:/Keil/C51/inc"));
        assert_eq!(out.len(), 1 + C51_EXTENSION_KEYWORDS.len() + 1);
    }

    #[test]
    fn c51_without_bin_dir_has_no_include() {
        let out = c51_macros("");
        assert_eq!(out.len(), 1 + C51_EXTENSION_KEYWORDS.len());
        assert!(out.iter().all(|a| !a.starts_with("-I")));
    }
}

//! `.dep` dependency records.
//!
//! ARM builds leave `{OutputDirectory}/{project}_{target}.dep` behind. Among
//! other lines it holds one record per compiled source and per included
//! header:
//!
//! ```text
//! F (.\src\main.c)(0x65A0B1C2)(-xc -std=c99 -I ./inc -DUSE_HAL -o ./obj/main.o)
//! I (.\inc\main.h)(0x65A0B1C2)
//! ```
//!
//! These are the arguments of the last real build, so they take precedence
//! over the flags declared in the project.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use uvproj::{Project, Target, to_posix_path};

use crate::command::FileObject;

fn file_record_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bF\s\(([^)]+)\)\([^)]*\)\(([^)]*)\)").expect("file record pattern is valid")
    })
}

fn header_record_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bI\s\(([^)]+)\)\([^)]*\)").expect("header record pattern is valid")
    })
}

/// Location of the record: `{project_dir}/{OutputDirectory}/{stem}_{TargetName}.dep`.
#[must_use]
pub fn dep_path(project: &Project, target: &Target) -> Option<PathBuf> {
    let dir = target.output_directory().filter(|d| !d.is_empty())?;
    Some(
        project
            .dir()
            .join(to_posix_path(dir))
            .join(format!("{}_{}.dep", project.stem(), target.name())),
    )
}

/// Parses record text into one [`FileObject`] per `F` record, in file
/// order.
///
/// Every directory holding a recorded header is appended as `-I<dir>` to
/// each file that does not already pass it. A record with an empty
/// argument field is kept with no arguments of its own; one missing the
/// field entirely is ignored.
#[must_use]
pub fn parse(text: &str) -> Vec<FileObject> {
    let content = normalize(text);

    let header_dirs: BTreeSet<String> = header_record_regex()
        .captures_iter(&content)
        .map(|caps| parent_dir(&caps[1]))
        .collect();

    file_record_regex()
        .captures_iter(&content)
        .map(|caps| {
            let file = caps[1].to_owned();
            let mut arguments = split_arguments(&caps[2]);

            let existing: BTreeSet<String> = arguments
                .iter()
                .filter_map(|a| a.strip_prefix("-I"))
                .map(normalize_dir)
                .collect();
            arguments.extend(
                header_dirs
                    .iter()
                    .filter(|d| !existing.contains(*d))
                    .map(|d| format!("-I{d}")),
            );

            FileObject { file, arguments }
        })
        .collect()
}

/// Folds the record into one searchable line.
///
/// Backslashes become `/` unless they escape a quote, `-I <dir>` loses its
/// space so the value stays attached, and line breaks become spaces.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() != Some(&'"') => out.push('/'),
            '\r' => {}
            '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out.replace("-I ", "-I")
}

/// Tokenizes with POSIX shell rules, falling back to whitespace on
/// unbalanced quotes.
fn split_arguments(args: &str) -> Vec<String> {
    shlex::split(args).unwrap_or_else(|| {
        tracing::warn!("unbalanced quoting in dependency record arguments: {args}");
        args.split_whitespace().map(str::to_owned).collect()
    })
}

fn parent_dir(header: &str) -> String {
    let header = header.trim();
    match header.rsplit_once('/') {
        Some(("", _)) => "/".to_owned(),
        Some((dir, _)) => normalize_dir(dir),
        None => ".".to_owned(),
    }
}

/// Drops leading `./` and trailing `/` so equivalent spellings compare
/// equal.
fn normalize_dir(dir: &str) -> String {
    let mut dir = dir.trim();
    while let Some(rest) = dir.strip_prefix("./") {
        dir = rest;
    }
    let dir = if dir.len() > 1 { dir.trim_end_matches('/') } else { dir };
    if dir.is_empty() || dir == "." {
        ".".to_owned()
    } else {
        dir.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_dir_already_present_is_not_repeated() {
        let files = parse("F (src/a.c)(0x1)(-Iinc -DX)\nI (inc/hdr.h)(0x1)\n");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file, "src/a.c");
        assert_eq!(files[0].arguments, ["-Iinc", "-DX"]);
    }

    #[test]
    fn missing_header_dirs_are_appended_sorted() {
        let text = "F (a.c)(0x1)(-DX)\r\nI (zeta/z.h)(0x1)\r\nI (alpha/a.h)(0x2)\r\nI (alpha/b.h)(0x3)\r\n";
        let files = parse(text);
        assert_eq!(files[0].arguments, ["-DX", "-Ialpha", "-Izeta"]);
    }

    #[test]
    fn windows_paths_and_split_include_flags() {
        let text = "F (.\\src\\main.c)(0x65A0)(-xc -I .\\inc -I./RTE -o .\\obj\\main.o)\n\
                    I (.\\inc\\main.h)(0x65A0)\n\
                    I (C:\\Keil\\ARM\\include\\stdint.h)(0x1)\n";
        let files = parse(text);
        assert_eq!(files[0].file, "./src/main.c");
        assert_eq!(
            files[0].arguments,
            ["-xc", "-I./inc", "-I./RTE", "-o", "./obj/main.o", "-IC:/Keil/ARM/include"]
        );
    }

    #[test]
    fn escaped_quotes_survive_tokenizing() {
        let files = parse(r#"F (a.c)(0x1)(-DCFG=\"cfg.h\" -DNAME="two words")"#);
        assert_eq!(files[0].arguments, [r#"-DCFG="cfg.h""#, "-DNAME=two words"]);
    }

    #[test]
    fn empty_argument_field_keeps_the_file() {
        let files = parse("F (a.c)(0x1)()\nI (inc/a.h)(0x1)\n");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].arguments, ["-Iinc"]);
    }

    #[test]
    fn record_without_argument_field_is_ignored() {
        assert!(parse("F (a.c)(0x1)\n").is_empty());
    }

    #[test]
    fn records_in_file_order() {
        let files = parse("F (b.c)(0x1)(-O1)\nF (a.c)(0x1)(-O2)\n");
        let names: Vec<_> = files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(names, ["b.c", "a.c"]);
    }

    #[test]
    fn unbalanced_quotes_fall_back_to_whitespace() {
        let files = parse("F (a.c)(0x1)(-DX=\"oops -O2)\n");
        assert_eq!(files[0].arguments, ["-DX=\"oops", "-O2"]);
    }

    #[test]
    fn header_parents() {
        assert_eq!(parent_dir("h.h"), ".");
        assert_eq!(parent_dir("./h.h"), ".");
        assert_eq!(parent_dir("/h.h"), "/");
        assert_eq!(parent_dir("./a/b/h.h"), "a/b");
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        let text = "Dependencies for Project 'p', Target 'T': (DO NOT MODIFY !)\n\
                    CompilerVersion: 6190000::V6.19::ARMCLANG\n";
        assert!(parse(text).is_empty());
    }
}

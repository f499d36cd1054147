//! Writing the compilation database.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use uv2compdb_core::CommandObject;

/// Default database file name.
pub const DEFAULT_OUTPUT: &str = "compile_commands.json";

/// Turns the `--output` value into a file path. A trailing separator or an
/// existing directory means "put the default file name in there".
pub fn resolve_path(raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if raw.ends_with(['/', '\\']) || path.is_dir() {
        path.join(DEFAULT_OUTPUT)
    } else {
        path
    }
}

/// Serializes `commands` as a JSON array with four-space indentation,
/// creating parent directories as needed.
pub fn write(path: &Path, commands: &[CommandObject]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    commands
        .serialize(&mut ser)
        .context("failed to serialize compile commands")?;
    buf.push(b'\n');

    std::fs::write(path, buf).with_context(|| format!("failed to write {}", path.display()))
}

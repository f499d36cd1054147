//! Optional `uv2compdb.toml` configuration.
//!
//! The file supplies defaults for the command-line flags:
//!
//! ```toml
//! [defaults]
//! target = "Debug"
//! build = true
//! predefined = true
//! arguments = ["--target=arm-arm-none-eabi", "-mcpu=cortex-m4"]
//!
//! [render]
//! define-unescape = "backslash-quote"
//! ```
//!
//! Flags given on the command line win over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use uv2compdb_core::DefineUnescape;

/// File name looked up next to the project.
pub const CONFIG_FILE: &str = "uv2compdb.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub render: Render,
}

/// `[defaults]` section.
#[derive(Debug, Default, Deserialize)]
pub struct Defaults {
    pub target: Option<String>,
    pub build: Option<bool>,
    pub predefined: Option<bool>,
    #[serde(default)]
    pub arguments: Vec<String>,
}

/// `[render]` section.
#[derive(Debug, Default, Deserialize)]
pub struct Render {
    #[serde(rename = "define-unescape")]
    pub define_unescape: Option<String>,
}

impl Config {
    /// Parses the `define-unescape` setting, if present.
    pub fn define_unescape(&self) -> Result<Option<DefineUnescape>> {
        self.render
            .define_unescape
            .as_deref()
            .map(|s| s.parse().map_err(|e: String| anyhow!(e)))
            .transpose()
    }
}

/// Loads `explicit`, or `uv2compdb.toml` next to `project` if it exists.
///
/// An explicitly named file must exist; the implicit one is optional.
pub fn load(explicit: Option<&Path>, project: &Path) -> Result<Config> {
    let path: PathBuf = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let implicit = project.with_file_name(CONFIG_FILE);
            if !implicit.is_file() {
                return Ok(Config::default());
            }
            implicit
        }
    };

    tracing::debug!("Loading {}", path.display());
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

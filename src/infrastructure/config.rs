//! Optional `cflowgraph.toml` with defaults for the command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::ports::OutputFormat;

pub const DEFAULT_CONFIG_FILE: &str = "cflowgraph.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// cflow executable.
    pub cflow: String,
    pub timeout_secs: u64,
    /// Extra path substrings to skip during discovery.
    pub excludes: Vec<String>,
    /// Also skip the built-in excludes.
    pub builtin_excludes: bool,
    pub formats: Vec<OutputFormat>,
    pub show_signatures: bool,
    pub static_label: String,
    pub dotfile: PathBuf,
    /// Location components kept in tree output; 0 keeps whole paths.
    pub path_parts: usize,
    pub file_list: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cflow: "cflow".to_string(),
            timeout_secs: super::cflow_runner::DEFAULT_TIMEOUT.as_secs(),
            excludes: Vec::new(),
            builtin_excludes: true,
            formats: vec![OutputFormat::Tree],
            show_signatures: false,
            static_label: "(static) ".to_string(),
            dotfile: PathBuf::from("dot.svg"),
            path_parts: 5,
            file_list: PathBuf::from(super::DEFAULT_FILE_LIST),
        }
    }
}

impl Config {
    /// Load `explicit` if given (it must exist), otherwise `cflowgraph.toml`
    /// in the working directory when present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(local);
        }
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

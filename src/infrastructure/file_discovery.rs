//! Source discovery: which C files get handed to cflow.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use walkdir::WalkDir;

/// Path substrings skipped unless built-in excludes are turned off.
pub const ALWAYS_EXCLUDED: &[&str] = &["site-packages"];

pub const SOURCE_EXTENSIONS: &[&str] = &["c", "h"];

/// Where the discovered list is saved for `--uselastfile`.
pub const DEFAULT_FILE_LIST: &str = "c.files";

pub fn effective_excludes(extra: &[String], builtin: bool) -> Vec<String> {
    let mut excludes: Vec<String> = if builtin {
        ALWAYS_EXCLUDED.iter().map(|s| s.to_string()).collect()
    } else {
        Vec::new()
    };
    for exclude in extra {
        if !excludes.contains(exclude) {
            excludes.push(exclude.clone());
        }
    }
    excludes
}

/// A file is skipped when its directory path contains any exclude.
pub fn is_excluded(path: &Path, excludes: &[String]) -> bool {
    let parent = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    excludes.iter().any(|exclude| parent.contains(exclude.as_str()))
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// `~/x` becomes `$HOME/x`.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// All `.c`/`.h` files below `root`, sorted.
pub fn discover_sources(root: &Path, excludes: &[String]) -> Result<Vec<PathBuf>> {
    let root = expand_home(root);
    if !root.is_dir() {
        bail!("Root path {} is not a directory", root.display());
    }

    let mut files = Vec::new();
    let mut skipped = 0usize;
    for entry in WalkDir::new(&root).into_iter().filter_map(|e| match e {
        Ok(entry) => Some(entry),
        Err(err) => {
            warn!("Skipping directory entry: {}", err);
            None
        }
    }) {
        if !entry.file_type().is_file() || !is_source(entry.path()) {
            continue;
        }
        if is_excluded(entry.path(), excludes) {
            skipped += 1;
            continue;
        }
        files.push(entry.into_path());
    }
    files.sort();

    info!(
        "Found {} source files below {} ({} excluded)",
        files.len(),
        root.display(),
        skipped
    );
    Ok(files)
}

/// One path per line.
pub fn write_file_list(path: &Path, files: &[PathBuf]) -> Result<()> {
    let mut text = String::new();
    for file in files {
        text.push_str(&file.display().to_string());
        text.push('\n');
    }
    fs::write(path, text).with_context(|| format!("Failed to write file list {}", path.display()))?;
    debug!("Wrote {} paths to {}", files.len(), path.display());
    Ok(())
}

pub fn read_file_list(path: &Path) -> Result<Vec<PathBuf>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file list {}", path.display()))?;
    let files: Vec<PathBuf> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect();
    debug!("Read {} paths from {}", files.len(), path.display());
    Ok(files)
}

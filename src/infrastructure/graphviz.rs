//! Writes DOT text to disk and, for image formats, runs Graphviz `dot`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use super::CommandSpec;

/// Image formats handed to `dot -T<ext>`.
pub const IMAGE_FORMATS: &[&str] = &["svg", "png", "pdf"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOutput {
    /// `.dot`/`.gv`: the DOT text is the artifact.
    Source(PathBuf),
    /// Write the DOT text to `source`, then render it with `command`.
    Image {
        source: PathBuf,
        image: PathBuf,
        command: CommandSpec,
    },
}

/// Decide what `--dotfile` produces.
pub fn plan_output(dotfile: &Path) -> Result<GraphOutput> {
    let ext = dotfile
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "dot" | "gv" => Ok(GraphOutput::Source(dotfile.to_path_buf())),
        e if IMAGE_FORMATS.contains(&e) => {
            let source = dotfile.with_extension("gv");
            let command = CommandSpec {
                program: "dot".to_string(),
                args: vec![
                    format!("-T{}", e),
                    source.display().to_string(),
                    "-o".to_string(),
                    dotfile.display().to_string(),
                ],
            };
            Ok(GraphOutput::Image {
                source,
                image: dotfile.to_path_buf(),
                command,
            })
        }
        _ => bail!(
            "Unsupported graph file {}: use .dot, .gv, {}",
            dotfile.display(),
            IMAGE_FORMATS
                .iter()
                .map(|f| format!(".{}", f))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Write `dot` as planned and return the path of the final artifact.
pub fn write_graph(dot: &str, plan: &GraphOutput) -> Result<PathBuf> {
    match plan {
        GraphOutput::Source(path) => {
            write_source(path, dot)?;
            info!("Graph written to {}", path.display());
            Ok(path.clone())
        }
        GraphOutput::Image {
            source,
            image,
            command,
        } => {
            write_source(source, dot)?;
            let status = command
                .command()
                .status()
                .context("Failed to execute dot; is Graphviz installed?")?;
            if !status.success() {
                bail!("dot failed with exit code {:?}", status.code());
            }
            info!("Graph rendered to {}", image.display());
            Ok(image.clone())
        }
    }
}

fn write_source(path: &Path, dot: &str) -> Result<()> {
    fs::write(path, dot).with_context(|| format!("Failed to write {}", path.display()))
}

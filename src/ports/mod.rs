// Output ports: every renderer turns the same selection into one artifact.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{CallTree, OriginHint};

pub mod dot_renderer;
pub mod json_renderer;
pub mod raw_renderer;
pub mod tree_renderer;

pub use dot_renderer::{DotOptions, DotRenderer};
pub use json_renderer::JsonRenderer;
pub use raw_renderer::RawRenderer;
pub use tree_renderer::{TreeOptions, TreeRenderer};

/// Output formats a run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented call tree
    Tree,
    /// Graphviz DOT description
    #[value(alias = "graph")]
    #[serde(alias = "graph")]
    Dot,
    /// cflow lines of the selected subtree, verbatim
    Raw,
    /// Selected trees as JSON
    Json,
}

/// A bounded tree picked for rendering, with the context it was found in.
#[derive(Debug, Clone)]
pub struct SelectedTree {
    pub tree: CallTree,
    /// `None` when the whole forest is rendered.
    pub origin: Option<OriginHint>,
}

/// What the renderers read: the chosen trees plus the text they came from.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub source: &'a str,
    pub trees: Vec<SelectedTree>,
}

/// Pure transformation of a selection into one output artifact.
pub trait Renderer: Send + Sync {
    fn format(&self) -> OutputFormat;
    fn render(&self, selection: &Selection<'_>) -> anyhow::Result<String>;
}

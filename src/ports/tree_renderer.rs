//! Tree Renderer
//!
//! Human-readable call tree with box-drawing guides, one call per line in
//! call order.

use std::fmt::Write;
use std::path::Path;

use colored::Colorize;

use super::{OutputFormat, Renderer, SelectedTree, Selection};
use crate::domain::CallTree;

/// Marker appended to nodes whose callees were cut by the depth bound.
pub const TRUNCATED_MARKER: &str = "[...]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    pub show_signatures: bool,
    /// Prepended to the root line when the root function is static.
    pub static_label: String,
    /// Keep only the last N path components of locations.
    pub path_parts: Option<usize>,
    /// ANSI colours.
    pub color: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            show_signatures: false,
            static_label: "(static) ".to_string(),
            path_parts: None,
            color: false,
        }
    }
}

#[derive(Clone, Copy)]
enum Role {
    Root,
    Guide,
    Level,
    Name,
    Signature,
    Path,
    Marker,
}

pub struct TreeRenderer {
    options: TreeOptions,
}

impl TreeRenderer {
    pub fn new(options: TreeOptions) -> Self {
        Self { options }
    }

    pub fn render_tree(&self, selected: &SelectedTree) -> String {
        let tree = &selected.tree;
        let mut out = String::new();
        out.push_str(&self.root_line(tree));
        out.push('\n');
        self.write_children(&mut out, tree, "");
        out
    }

    fn write_children(&self, out: &mut String, tree: &CallTree, prefix: &str) {
        let count = tree.children.len();
        for (i, child) in tree.children.iter().enumerate() {
            let (branch, extension) = if i + 1 == count {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            let guide = format!("{}{}", prefix, branch);
            let _ = writeln!(
                out,
                "{}{}",
                self.paint(&guide, Role::Guide),
                self.call_line(child)
            );
            self.write_children(out, child, &format!("{}{}", prefix, extension));
        }
    }

    fn root_line(&self, tree: &CallTree) -> String {
        let mut line = String::new();
        if tree.record.is_static {
            line.push_str(&self.options.static_label);
        }
        line.push_str(&self.paint(&format!("{}()", tree.name()), Role::Root));
        self.push_details(&mut line, tree);
        line
    }

    fn call_line(&self, tree: &CallTree) -> String {
        let mut line = format!(
            "{} {}",
            self.paint(&format!("[{}]", tree.depth), Role::Level),
            self.paint(&format!("{}()", tree.name()), Role::Name)
        );
        self.push_details(&mut line, tree);
        line
    }

    fn push_details(&self, line: &mut String, tree: &CallTree) {
        let record = &tree.record;
        if self.options.show_signatures {
            if let Some(signature) = &record.signature {
                line.push_str("  ");
                line.push_str(&self.paint(signature, Role::Signature));
            }
        }
        if let Some(location) = &record.location {
            let shown = format!(
                "{}:{}",
                shorten_path(&location.file, self.options.path_parts),
                location.line
            );
            line.push_str("  ");
            line.push_str(&self.paint(&shown, Role::Path));
        }
        if record.recursive {
            line.push_str(&self.paint(" (R)", Role::Marker));
        }
        if let Some(back) = record.back_reference {
            line.push_str(&self.paint(&format!(" {}", back), Role::Marker));
        }
        if tree.truncated {
            line.push_str(&self.paint(&format!(" {}", TRUNCATED_MARKER), Role::Marker));
        }
    }

    fn paint(&self, text: &str, role: Role) -> String {
        if !self.options.color {
            return text.to_string();
        }
        match role {
            Role::Root => text.yellow().bold().to_string(),
            Role::Guide => text.red().to_string(),
            Role::Level => text.cyan().to_string(),
            Role::Name => text.bright_blue().to_string(),
            Role::Signature => text.yellow().dimmed().to_string(),
            Role::Path => text.magenta().to_string(),
            Role::Marker => text.green().to_string(),
        }
    }
}

impl Renderer for TreeRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Tree
    }

    fn render(&self, selection: &Selection<'_>) -> anyhow::Result<String> {
        let several = selection.trees.len() > 1;
        let rendered: Vec<String> = selection
            .trees
            .iter()
            .map(|selected| match (&selected.origin, several) {
                (Some(origin), true) => format!("== {} ==\n{}", origin, self.render_tree(selected)),
                _ => self.render_tree(selected),
            })
            .collect();
        Ok(rendered.join("\n"))
    }
}

/// `.../b/c.c` for `a/b/c.c` with two parts kept.
pub fn shorten_path(file: &str, parts: Option<usize>) -> String {
    let Some(keep) = parts.filter(|&k| k > 0) else {
        return file.to_string();
    };
    let components: Vec<String> = Path::new(file)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if components.len() <= keep {
        return file.to_string();
    }
    format!(".../{}", components[components.len() - keep..].join("/"))
}

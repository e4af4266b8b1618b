//! Graph Renderer
//!
//! Exports the selected call trees as Graphviz DOT. Vertex ids are
//! position-qualified (`n0_2_1` is the second callee of the third callee of
//! the first tree), so a function called from several places gets one
//! vertex per call site.

use super::{OutputFormat, Renderer, Selection};
use crate::domain::{BackReference, CallTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotOptions {
    pub graph_name: String,
    /// Prepended to the label of static roots.
    pub static_label: String,
    pub rankdir: String,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self {
            graph_name: "CallGraph".to_string(),
            static_label: "(static) ".to_string(),
            rankdir: "LR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Root,
    StaticRoot,
    Call,
    Recursive,
    /// No definition seen by cflow: library or unresolved call.
    External,
}

pub struct DotRenderer {
    options: DotOptions,
}

#[derive(Default)]
struct DotGraph {
    nodes: Vec<String>,
    edges: Vec<String>,
    /// Vertex ids per level below the tree roots.
    layers: Vec<Vec<String>>,
}

impl DotRenderer {
    pub fn new(options: DotOptions) -> Self {
        Self { options }
    }

    /// Convert a selection to DOT text.
    pub fn to_dot(&self, selection: &Selection<'_>) -> String {
        let mut graph = DotGraph::default();
        for (index, selected) in selection.trees.iter().enumerate() {
            self.add_tree(&mut graph, &selected.tree, &format!("n{}", index), 0);
        }

        let mut lines = Vec::new();
        lines.push(format!(
            "digraph \"{}\" {{",
            escape_label(&self.options.graph_name)
        ));
        lines.push(format!("    rankdir={};", self.options.rankdir));
        lines.push("    nodesep=0.4;".to_string());
        lines.push("    node [fontname=\"Helvetica\", fontsize=12];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=10];".to_string());
        lines.push("".to_string());
        lines.extend(graph.nodes);
        lines.push("".to_string());
        lines.extend(graph.edges);

        for layer in graph.layers.iter().filter(|layer| layer.len() > 1) {
            let ids: Vec<String> = layer.iter().map(|id| format!("\"{}\"", id)).collect();
            lines.push(format!("    {{ rank=same; {} }}", ids.join("; ")));
        }

        lines.push("}".to_string());
        let mut dot = lines.join("\n");
        dot.push('\n');
        dot
    }

    fn add_tree(&self, graph: &mut DotGraph, tree: &CallTree, id: &str, level: usize) {
        let kind = Self::node_kind(tree, level == 0);
        let (shape, fill, style) = Self::node_style(kind);
        graph.nodes.push(format!(
            "    \"{}\" [label=\"{}\", shape={}, style=\"{}\", fillcolor=\"{}\", color=\"{}\"];",
            id,
            escape_label(&self.label(tree, kind)),
            shape,
            style,
            fill,
            Self::border_color(kind)
        ));

        if graph.layers.len() <= level {
            graph.layers.resize_with(level + 1, Vec::new);
        }
        graph.layers[level].push(id.to_string());

        for (index, child) in tree.children.iter().enumerate() {
            let child_id = format!("{}_{}", id, index);
            graph
                .edges
                .push(format!("    \"{}\" -> \"{}\";", id, child_id));
            self.add_tree(graph, child, &child_id, level + 1);
        }

        if tree.truncated {
            let more = format!("{}_more", id);
            graph.nodes.push(format!(
                "    \"{}\" [label=\"...\", shape=plaintext];",
                more
            ));
            graph.edges.push(format!(
                "    \"{}\" -> \"{}\" [style=dashed, arrowhead=none];",
                id, more
            ));
        }
    }

    fn label(&self, tree: &CallTree, kind: NodeKind) -> String {
        let mut label = String::new();
        if kind == NodeKind::StaticRoot {
            label.push_str(&self.options.static_label);
        }
        label.push_str(tree.name());
        if let Some(location) = &tree.record.location {
            label.push('\n');
            label.push_str(&location.to_string());
        }
        label
    }

    fn node_kind(tree: &CallTree, is_root: bool) -> NodeKind {
        let record = &tree.record;
        if is_root {
            if record.is_static {
                NodeKind::StaticRoot
            } else {
                NodeKind::Root
            }
        } else if record.recursive
            || matches!(record.back_reference, Some(BackReference::Recursive(_)))
        {
            NodeKind::Recursive
        } else if record.location.is_none() {
            NodeKind::External
        } else {
            NodeKind::Call
        }
    }

    fn node_style(kind: NodeKind) -> (&'static str, &'static str, &'static str) {
        match kind {
            NodeKind::Root => ("box", "#a6e3a1", "filled,rounded"),
            NodeKind::StaticRoot => ("box", "#f9e2af", "filled,rounded"),
            NodeKind::Call => ("box", "#89b4fa", "filled"),
            NodeKind::Recursive => ("box", "#cba6f7", "filled,bold"),
            NodeKind::External => ("box", "#6c7086", "filled,dashed"),
        }
    }

    fn border_color(kind: NodeKind) -> &'static str {
        match kind {
            NodeKind::Root => "#40a02b",
            NodeKind::StaticRoot => "#df8e1d",
            NodeKind::Call => "#1e66f5",
            NodeKind::Recursive => "#8839ef",
            NodeKind::External => "#5c5f77",
        }
    }
}

impl Renderer for DotRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Dot
    }

    fn render(&self, selection: &Selection<'_>) -> anyhow::Result<String> {
        Ok(self.to_dot(selection))
    }
}

fn escape_label(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{limit_depth, CallForest};
    use crate::ports::SelectedTree;

    fn selection(text: &str, max_depth: Option<usize>) -> (CallForest, Vec<SelectedTree>) {
        let forest = CallForest::parse(text).unwrap().forest;
        let trees = forest
            .roots()
            .iter()
            .map(|&root| SelectedTree {
                tree: limit_depth(&forest, root, max_depth),
                origin: None,
            })
            .collect();
        (forest, trees)
    }

    #[test]
    fn test_to_dot() {
        let (forest, trees) = selection("main() <int main (void) at m.c:1>:\n    foo()\n", None);
        let dot = DotRenderer::new(DotOptions::default()).to_dot(&Selection {
            source: forest.source(),
            trees,
        });
        assert!(dot.starts_with("digraph \"CallGraph\" {"));
        assert!(dot.contains("rankdir=LR"));
        assert!(dot.contains("\"n0\" [label=\"main\\nm.c:1\""));
        assert!(dot.contains("\"n0_0\" [label=\"foo\""));
        assert!(dot.contains("\"n0\" -> \"n0_0\";"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_same_name_gets_distinct_vertices() {
        let text = "main()\n    log()\n    work()\n        log()\n";
        let (forest, trees) = selection(text, None);
        let dot = DotRenderer::new(DotOptions::default()).to_dot(&Selection {
            source: forest.source(),
            trees,
        });
        assert!(dot.contains("\"n0_0\" [label=\"log\""));
        assert!(dot.contains("\"n0_1_0\" [label=\"log\""));
    }

    #[test]
    fn test_truncated_node_gets_sentinel() {
        let (forest, trees) = selection("main()\n    foo()\n        bar()\n", Some(1));
        let dot = DotRenderer::new(DotOptions::default()).to_dot(&Selection {
            source: forest.source(),
            trees,
        });
        assert!(dot.contains("\"n0_0_more\" [label=\"...\", shape=plaintext];"));
        assert!(dot.contains("\"n0_0\" -> \"n0_0_more\" [style=dashed"));
        assert!(!dot.contains("bar"));
    }

    #[test]
    fn test_static_root_label() {
        let (forest, trees) = selection("init() <static void init (void) at a.c:2>\n", None);
        let options = DotOptions {
            static_label: "static ".to_string(),
            ..DotOptions::default()
        };
        let dot = DotRenderer::new(options).to_dot(&Selection {
            source: forest.source(),
            trees,
        });
        assert!(dot.contains("label=\"static init\\na.c:2\""));
        assert!(dot.contains("#f9e2af"));
    }

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }
}

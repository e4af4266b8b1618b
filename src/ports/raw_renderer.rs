//! Raw Renderer
//!
//! Passes the selected cflow lines through untouched, in input order.

use super::{OutputFormat, Renderer, Selection};

pub struct RawRenderer;

impl RawRenderer {
    /// Lines keep their own terminators. A line without one (end of input)
    /// gets `\n` only when another line follows it.
    pub fn to_raw(selection: &Selection<'_>) -> String {
        let lines: Vec<&str> = selection
            .trees
            .iter()
            .flat_map(|selected| selected.tree.preorder())
            .map(|node| {
                selection
                    .source
                    .get(node.record.full_span.clone())
                    .unwrap_or_default()
            })
            .collect();

        let mut out = String::new();
        for (i, line) in lines.iter().enumerate() {
            out.push_str(line);
            if !line.ends_with('\n') && i + 1 < lines.len() {
                out.push('\n');
            }
        }
        out
    }
}

impl Renderer for RawRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Raw
    }

    fn render(&self, selection: &Selection<'_>) -> anyhow::Result<String> {
        Ok(Self::to_raw(selection))
    }
}

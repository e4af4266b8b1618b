//! Call Forest
//!
//! Rebuilds the nesting that cflow encodes in indentation. Nodes live in a
//! flat arena and refer to their parent and children by [`NodeId`]; the
//! forest keeps its source text so any node can be mapped back to the line
//! it came from.

use std::ops::RangeInclusive;

use log::debug;

use crate::domain::error::{ForestError, ParseIssue};
use crate::domain::line::{classify, CallRecord, Classified};

/// Index of a node in its forest's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One function appearance in the call forest.
#[derive(Debug, Clone)]
pub struct CallNode {
    pub record: CallRecord,
    /// Depth in the rebuilt forest; equals `record.depth` unless the line
    /// skipped levels and was reattached.
    pub depth: usize,
    pub parent: Option<NodeId>,
    /// Callees in call order.
    pub children: Vec<NodeId>,
}

impl CallNode {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Forest of call trees, one root per function cflow analysed.
#[derive(Debug, Clone)]
pub struct CallForest {
    source: String,
    nodes: Vec<CallNode>,
    roots: Vec<NodeId>,
}

/// A forest plus everything the parse had to report.
#[derive(Debug, Clone)]
pub struct ParsedForest {
    pub forest: CallForest,
    pub issues: Vec<ParseIssue>,
    /// Blank, banner and diagnostic lines.
    pub skipped_lines: usize,
}

impl CallForest {
    /// Parse cflow output. Malformed lines are collected in
    /// [`ParsedForest::issues`]; only input without a single data line fails.
    pub fn parse(text: &str) -> Result<ParsedForest, ForestError> {
        let mut builder = ForestBuilder::default();
        let mut skipped = 0;
        let mut offset = 0;

        for (index, raw) in text.split_inclusive('\n').enumerate() {
            match classify(index + 1, offset, raw) {
                Classified::Data(record) => builder.push(record),
                Classified::NonData => skipped += 1,
                Classified::Failure(issue) => builder.issues.push(issue),
            }
            offset += raw.len();
        }

        if builder.nodes.is_empty() {
            return Err(ForestError::EmptyInput {
                skipped,
                issues: builder.issues,
            });
        }

        debug!(
            "Built call forest: {} nodes, {} roots, {} skipped lines, {} issues",
            builder.nodes.len(),
            builder.roots.len(),
            skipped,
            builder.issues.len()
        );

        Ok(ParsedForest {
            forest: CallForest {
                source: text.to_string(),
                nodes: builder.nodes,
                roots: builder.roots,
            },
            issues: builder.issues,
            skipped_lines: skipped,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &CallNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in textual order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CallNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &CallNode)> {
        self.node(id)
            .children
            .iter()
            .map(move |&child| (child, self.node(child)))
    }

    /// The verbatim input line a node was parsed from.
    pub fn source_line(&self, id: NodeId) -> &str {
        self.source
            .get(self.node(id).record.span.clone())
            .unwrap_or_default()
    }

    /// Input lines covered by the subtree rooted at `id`.
    pub fn line_range(&self, id: NodeId) -> RangeInclusive<usize> {
        let mut last = id;
        while let Some(&child) = self.node(last).children.last() {
            last = child;
        }
        self.node(id).record.line..=self.node(last).record.line
    }
}

/// Depth-keyed stack of open nodes.
#[derive(Default)]
struct ForestBuilder {
    nodes: Vec<CallNode>,
    roots: Vec<NodeId>,
    /// (depth as written, node) for every node whose callees may still follow.
    open: Vec<(usize, NodeId)>,
    issues: Vec<ParseIssue>,
}

impl ForestBuilder {
    fn push(&mut self, record: CallRecord) {
        let written_depth = record.depth;
        while self.open.last().is_some_and(|&(d, _)| d >= written_depth) {
            self.open.pop();
        }

        let id = NodeId(self.nodes.len());
        let (parent, depth) = match self.open.last() {
            None => {
                self.roots.push(id);
                (None, 0)
            }
            Some(&(parent_written, parent_id)) => {
                let depth = self.nodes[parent_id.0].depth + 1;
                if written_depth > parent_written + 1 {
                    self.anomaly(&record, depth);
                }
                self.nodes[parent_id.0].children.push(id);
                (Some(parent_id), depth)
            }
        };
        if parent.is_none() && written_depth > 0 {
            self.anomaly(&record, 0);
        }

        self.nodes.push(CallNode {
            record,
            depth,
            parent,
            children: Vec::new(),
        });
        self.open.push((written_depth, id));
    }

    fn anomaly(&mut self, record: &CallRecord, attached_depth: usize) {
        self.issues.push(ParseIssue::StructuralAnomaly {
            line: record.line,
            name: record.name.clone(),
            depth: record.depth,
            attached_depth,
        });
    }
}

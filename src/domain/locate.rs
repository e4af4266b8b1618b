//! Function Locator
//!
//! Finds every appearance of a function in a [`CallForest`]. cflow prints
//! one root per analysed function, and static functions it cannot resolve
//! as `--main` show up only as roots, so a name regularly matches more than
//! once. The locator reports all of them and leaves the choice to the caller.

use std::fmt;

use crate::domain::forest::{CallForest, NodeId};
use crate::domain::line::SourceLocation;

/// Context that tells same-named matches apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginHint {
    pub location: Option<SourceLocation>,
    pub is_root: bool,
    pub is_static: bool,
}

impl OriginHint {
    pub fn of(forest: &CallForest, id: NodeId) -> Self {
        let node = forest.node(id);
        OriginHint {
            location: node.record.location.clone(),
            is_root: node.is_root(),
            is_static: node.record.is_static,
        }
    }

    /// Root flagged static: the form cflow uses for functions that are not
    /// visible as globals.
    pub fn is_static_root(&self) -> bool {
        self.is_root && self.is_static
    }
}

impl fmt::Display for OriginHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.is_static {
            parts.push("static".to_string());
        }
        parts.push(if self.is_root { "root" } else { "nested" }.to_string());
        if let Some(location) = &self.location {
            parts.push(location.to_string());
        }
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub node: NodeId,
    pub origin: OriginHint,
}

/// Result of a lookup. Ambiguity is a variant, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Unique(Match),
    Multiple(Vec<Match>),
    NotFound,
}

impl Located {
    pub fn matches(&self) -> &[Match] {
        match self {
            Located::Unique(m) => std::slice::from_ref(m),
            Located::Multiple(all) => all,
            Located::NotFound => &[],
        }
    }

    pub fn into_matches(self) -> Vec<Match> {
        match self {
            Located::Unique(m) => vec![m],
            Located::Multiple(all) => all,
            Located::NotFound => Vec::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Located::NotFound)
    }
}

/// `main()` and `main` name the same function.
pub fn normalize_target(target: &str) -> &str {
    let target = target.trim();
    target.strip_suffix("()").unwrap_or(target).trim_end()
}

/// Exact, case-sensitive lookup of `target` over roots and nested calls,
/// in textual order.
pub fn locate(forest: &CallForest, target: &str) -> Located {
    let target = normalize_target(target);
    let mut found: Vec<Match> = forest
        .iter()
        .filter(|(_, node)| node.name() == target)
        .map(|(id, _)| Match {
            node: id,
            origin: OriginHint::of(forest, id),
        })
        .collect();

    match found.len() {
        0 => Located::NotFound,
        1 => Located::Unique(found.remove(0)),
        _ => Located::Multiple(found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATICS: &str = "\
{   0} init() <static void init (void) at a.c:4>:
{   1}     setup_a()
{   0} init() <static void init (void) at b.c:7>:
{   1}     setup_b()
{   0} run() <int run (void) at run.c:1>:
{   1}     log_msg()
";

    #[test]
    fn test_unique_nested_match() {
        let forest = CallForest::parse(STATICS).unwrap().forest;
        match locate(&forest, "log_msg") {
            Located::Unique(m) => {
                assert!(!m.origin.is_root);
                assert!(m.origin.location.is_none());
            }
            other => panic!("expected unique match, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_statics_are_all_returned() {
        let forest = CallForest::parse(STATICS).unwrap().forest;
        let located = locate(&forest, "init()");
        let matches = located.matches();
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.origin.is_static_root()));
        let files: Vec<&str> = matches
            .iter()
            .filter_map(|m| m.origin.location.as_ref())
            .map(|l| l.file.as_str())
            .collect();
        assert_eq!(files, vec!["a.c", "b.c"]);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let forest = CallForest::parse(STATICS).unwrap().forest;
        assert!(locate(&forest, "Run").is_not_found());
        assert!(locate(&forest, "missing").is_not_found());
    }

    #[test]
    fn test_origin_display() {
        let forest = CallForest::parse(STATICS).unwrap().forest;
        let located = locate(&forest, "init");
        assert_eq!(located.matches()[1].origin.to_string(), "static, root, b.c:7");
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target(" main() "), "main");
        assert_eq!(normalize_target("main"), "main");
    }
}

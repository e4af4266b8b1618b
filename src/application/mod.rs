// Application layer: parse, locate, limit and render in one pass.

use std::time::Instant;

use anyhow::Result;
use clap::ValueEnum;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{
    limit_depth, locate, normalize_target, CallForest, ForestError, Located, Match, ParsedForest,
};
use crate::ports::{OutputFormat, Renderer, SelectedTree, Selection};

/// Parse cflow output and log whatever had to be skipped.
pub fn analyze(text: &str) -> Result<ParsedForest, ForestError> {
    let started = Instant::now();
    let parsed = CallForest::parse(text)?;
    debug!(
        "Parsed {} entries into {} roots in {:.5} sec",
        parsed.forest.len(),
        parsed.forest.roots().len(),
        started.elapsed().as_secs_f64()
    );
    for issue in &parsed.issues {
        warn!("{}", issue);
    }
    if !parsed.issues.is_empty() {
        let skipped = parsed
            .issues
            .iter()
            .filter(|issue| issue.is_classification_failure())
            .count();
        info!(
            "{} unparsable lines skipped, {} entries re-attached",
            skipped,
            parsed.issues.len() - skipped
        );
    }
    Ok(parsed)
}

/// Which matches of an ambiguous target get rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Root entries when there are any, every match otherwise.
    #[default]
    PreferRoots,
    /// Every match.
    All,
}

impl MatchPolicy {
    pub fn choose(self, matches: Vec<Match>) -> Vec<Match> {
        match self {
            MatchPolicy::All => matches,
            MatchPolicy::PreferRoots => {
                if matches.iter().any(|m| m.origin.is_root) {
                    matches.into_iter().filter(|m| m.origin.is_root).collect()
                } else {
                    matches
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Function to isolate; `None` renders the whole forest.
    pub target: Option<String>,
    /// Levels kept below each selected root; `None` is unbounded.
    pub max_depth: Option<usize>,
    pub match_policy: MatchPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    WholeForest { roots: usize },
    Found { matches: usize, rendered: usize },
    /// Not an error: the target simply does not occur in the forest.
    NotFound { target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
    pub format: OutputFormat,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: SelectionOutcome,
    /// One entry per renderer, in renderer order. Empty when nothing was found.
    pub outputs: Vec<RenderedOutput>,
}

/// Pick the trees a request asks for out of a forest.
pub fn select(forest: &CallForest, request: &RunRequest) -> (SelectionOutcome, Vec<SelectedTree>) {
    let Some(target) = request.target.as_deref() else {
        let trees = forest
            .roots()
            .iter()
            .map(|&root| SelectedTree {
                tree: limit_depth(forest, root, request.max_depth),
                origin: None,
            })
            .collect();
        return (
            SelectionOutcome::WholeForest {
                roots: forest.roots().len(),
            },
            trees,
        );
    };

    let located = locate(forest, target);
    if located.is_not_found() {
        return (
            SelectionOutcome::NotFound {
                target: normalize_target(target).to_string(),
            },
            Vec::new(),
        );
    }
    if let Located::Multiple(all) = &located {
        let origins: Vec<String> = all.iter().map(|m| m.origin.to_string()).collect();
        debug!("`{}` has {} matches: {}", target, all.len(), origins.join("; "));
    }

    let matches = located.into_matches();
    let total = matches.len();
    let chosen = request.match_policy.choose(matches);
    if chosen.len() > 1 {
        let statics = chosen
            .iter()
            .filter(|m| m.origin.is_static_root())
            .count();
        info!(
            "`{}` matches {} entries ({} static roots); rendering all of them",
            normalize_target(target),
            chosen.len(),
            statics
        );
    }

    let trees = chosen
        .into_iter()
        .map(|m| SelectedTree {
            tree: limit_depth(forest, m.node, request.max_depth),
            origin: Some(m.origin),
        })
        .collect::<Vec<_>>();
    (
        SelectionOutcome::Found {
            matches: total,
            rendered: trees.len(),
        },
        trees,
    )
}

/// Renders one request with every configured renderer.
pub struct RenderUsecase<'a> {
    pub renderers: Vec<&'a dyn Renderer>,
}

impl<'a> RenderUsecase<'a> {
    pub fn new(renderers: Vec<&'a dyn Renderer>) -> Self {
        Self { renderers }
    }

    pub fn run(&self, forest: &CallForest, request: &RunRequest) -> Result<RunReport> {
        let (outcome, trees) = select(forest, request);
        if trees.is_empty() {
            return Ok(RunReport {
                outcome,
                outputs: Vec::new(),
            });
        }

        let selection = Selection {
            source: forest.source(),
            trees,
        };
        // Renderers only read the selection, so they can run side by side.
        let outputs = self
            .renderers
            .par_iter()
            .map(|renderer| {
                Ok(RenderedOutput {
                    format: renderer.format(),
                    body: renderer.render(&selection)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RunReport { outcome, outputs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{RawRenderer, TreeOptions, TreeRenderer};

    const TEXT: &str = "\
{   0} main() <int main (void) at m.c:1>:
{   1}     init() <static void init (void) at a.c:4>
{   0} init() <static void init (void) at a.c:4>:
{   1}     setup_a()
{   0} init() <static void init (void) at b.c:7>:
{   1}     setup_b()
";

    #[test]
    fn test_prefer_roots_skips_nested_match() {
        let forest = analyze(TEXT).unwrap().forest;
        let request = RunRequest {
            target: Some("init".to_string()),
            ..RunRequest::default()
        };
        let (outcome, trees) = select(&forest, &request);
        assert_eq!(outcome, SelectionOutcome::Found { matches: 3, rendered: 2 });
        assert!(trees.iter().all(|t| t.origin.as_ref().is_some_and(|o| o.is_root)));
    }

    #[test]
    fn test_all_policy_keeps_every_match() {
        let forest = analyze(TEXT).unwrap().forest;
        let request = RunRequest {
            target: Some("init".to_string()),
            match_policy: MatchPolicy::All,
            ..RunRequest::default()
        };
        let (outcome, _) = select(&forest, &request);
        assert_eq!(outcome, SelectionOutcome::Found { matches: 3, rendered: 3 });
    }

    #[test]
    fn test_not_found_renders_nothing() {
        let forest = analyze(TEXT).unwrap().forest;
        let tree = TreeRenderer::new(TreeOptions::default());
        let renderers: Vec<&dyn Renderer> = vec![&tree, &RawRenderer];
        let usecase = RenderUsecase::new(renderers);
        let report = usecase
            .run(
                &forest,
                &RunRequest {
                    target: Some("nope()".to_string()),
                    ..RunRequest::default()
                },
            )
            .unwrap();
        assert_eq!(
            report.outcome,
            SelectionOutcome::NotFound {
                target: "nope".to_string()
            }
        );
        assert!(report.outputs.is_empty());
    }

    #[test]
    fn test_outputs_follow_renderer_order() {
        let forest = analyze(TEXT).unwrap().forest;
        let tree = TreeRenderer::new(TreeOptions::default());
        let renderers: Vec<&dyn Renderer> = vec![&RawRenderer, &tree];
        let usecase = RenderUsecase::new(renderers);
        let report = usecase.run(&forest, &RunRequest::default()).unwrap();
        assert_eq!(report.outcome, SelectionOutcome::WholeForest { roots: 3 });
        let formats: Vec<OutputFormat> = report.outputs.iter().map(|o| o.format).collect();
        assert_eq!(formats, vec![OutputFormat::Raw, OutputFormat::Tree]);
    }
}

// Domain layer for cflowgraph: classify cflow lines, rebuild the call
// forest, locate functions and bound subtrees.

pub mod error;
pub mod forest;
pub mod limit;
pub mod line;
pub mod locate;

pub use error::{FailureReason, ForestError, ParseIssue};
pub use forest::{CallForest, CallNode, NodeId, ParsedForest};
pub use limit::{limit_depth, CallTree};
pub use line::{classify, BackReference, CallRecord, Classified, SourceLocation, INDENT_UNIT};
pub use locate::{locate, normalize_target, Located, Match, OriginHint};

//! Line Classifier
//!
//! Turns one line of `cflow --print-level` output into a [`CallRecord`].
//! A data line looks like
//!
//! ```text
//! {   1}     helper() <static int helper (int n) at src/util.c:12> (R):
//! ```
//!
//! with an optional line number, an optional `{ level}` marker, four
//! spaces of indentation per level, the function name, an optional
//! `<signature at file:line>` annotation and trailing recursion markers.

use std::fmt;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::domain::error::{FailureReason, ParseIssue};

/// Spaces cflow emits per call level.
pub const INDENT_UNIT: usize = 4;

static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<lead>[ \t]*)(?:\d+ )?(?:\{(?P<level>[^}]*)\} )?(?P<indent>[ \t]*)(?P<name>[A-Za-z_$][A-Za-z0-9_$]*)\(\)(?P<rest>.*)$",
    )
    .expect("entry pattern is valid")
});

static LEVEL_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\s*\d+ )?\{(?P<level>[^}]*)\}").expect("level pattern is valid")
});

/// Declaring file and line of a function, from the `at file:line` part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Pointer from an entry back to an earlier output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackReference {
    /// `(recursive: see N)`: the call closes a recursion cycle.
    Recursive(usize),
    /// `[see N]`: already expanded at line N (`cflow --brief`).
    AlreadyShown(usize),
}

impl fmt::Display for BackReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackReference::Recursive(line) => write!(f, "(recursive: see {})", line),
            BackReference::AlreadyShown(line) => write!(f, "[see {}]", line),
        }
    }
}

/// One classified data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// 1-based line number in the input.
    pub line: usize,
    /// Byte range of the line in the input, without its terminator.
    pub span: Range<usize>,
    /// Byte range of the line including its `\n` or `\r\n`, if any.
    pub full_span: Range<usize>,
    /// Depth as written in the input.
    pub depth: usize,
    pub name: String,
    pub signature: Option<String>,
    pub location: Option<SourceLocation>,
    /// The signature declares the function `static`.
    pub is_static: bool,
    /// `(R)`: the function takes part in a recursion cycle.
    pub recursive: bool,
    pub back_reference: Option<BackReference>,
    /// Trailing `:`: cflow printed the callees below this line.
    pub expanded: bool,
}

/// Outcome of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Data(CallRecord),
    /// Blank lines, banners and diagnostics mixed into the stream.
    NonData,
    Failure(ParseIssue),
}

/// Classify `text`, the content of input line `line_no` starting at byte `offset`.
pub fn classify(line_no: usize, offset: usize, text: &str) -> Classified {
    let content = text.trim_end_matches(|c| c == '\r' || c == '\n');
    if content.trim().is_empty() {
        return Classified::NonData;
    }

    let failure = |reason: FailureReason| {
        Classified::Failure(ParseIssue::ClassificationFailure {
            line: line_no,
            content: content.to_string(),
            reason,
        })
    };

    let Some(caps) = ENTRY_RE.captures(content) else {
        // A level marker promises a data line even when the rest is garbage.
        return match LEVEL_PREFIX_RE.captures(content) {
            Some(prefix) if parse_level(&prefix["level"]).is_ok() => {
                failure(FailureReason::MissingName)
            }
            Some(_) => failure(FailureReason::BadLevelMarker),
            None => Classified::NonData,
        };
    };

    match parse_entry(&caps) {
        Ok(entry) => Classified::Data(CallRecord {
            line: line_no,
            span: offset..offset + content.len(),
            full_span: offset..offset + text.len(),
            depth: entry.depth,
            is_static: entry
                .signature
                .as_deref()
                .is_some_and(|sig| declares_static(sig, &entry.name)),
            name: entry.name,
            signature: entry.signature,
            location: entry.location,
            recursive: entry.recursive,
            back_reference: entry.back_reference,
            expanded: entry.expanded,
        }),
        Err(reason) => failure(reason),
    }
}

struct Entry {
    depth: usize,
    name: String,
    signature: Option<String>,
    location: Option<SourceLocation>,
    recursive: bool,
    back_reference: Option<BackReference>,
    expanded: bool,
}

fn parse_entry(caps: &Captures<'_>) -> Result<Entry, FailureReason> {
    let depth = entry_depth(
        caps.name("level").map(|m| m.as_str()),
        &caps["lead"],
        &caps["indent"],
    )?;
    let mut rest = caps["rest"].trim_start();

    let mut signature = None;
    let mut location = None;
    if let Some(annotated) = rest.strip_prefix('<') {
        let close = annotated
            .rfind('>')
            .ok_or(FailureReason::UnterminatedAnnotation)?;
        let (sig, loc) = split_annotation(&annotated[..close])?;
        signature = sig;
        location = loc;
        rest = &annotated[close + 1..];
    }

    let mut recursive = false;
    if let Some(after) = rest.trim_start().strip_prefix("(R)") {
        recursive = true;
        rest = after;
    }

    let mut expanded = false;
    if let Some(after) = rest.strip_prefix(':') {
        expanded = true;
        rest = after;
    }

    let back_reference = parse_back_reference(rest.trim())?;

    Ok(Entry {
        depth,
        name: caps["name"].to_string(),
        signature,
        location,
        recursive,
        back_reference,
        expanded,
    })
}

fn parse_level(raw: &str) -> Result<usize, FailureReason> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| FailureReason::BadLevelMarker)
}

/// Without a level marker, blanks on both sides of a line number are
/// indentation (`    2 helper()` is depth 1). With one, blanks before the
/// number only pad the `--number` column.
fn entry_depth(level: Option<&str>, lead: &str, indent: &str) -> Result<usize, FailureReason> {
    let lead = if level.is_some() { "" } else { lead };
    if lead.contains('\t') || indent.contains('\t') {
        return Err(FailureReason::TabIndent);
    }
    let width = lead.len() + indent.len();
    if width % INDENT_UNIT != 0 {
        return Err(FailureReason::UnevenIndent { unit: INDENT_UNIT });
    }
    let from_indent = width / INDENT_UNIT;

    match level {
        None => Ok(from_indent),
        Some(raw) => {
            let marker = parse_level(raw)?;
            if marker != from_indent {
                return Err(FailureReason::LevelMismatch {
                    marker,
                    indent: from_indent,
                });
            }
            Ok(marker)
        }
    }
}

/// Split `int f (void) at a.c:3` into signature and location.
fn split_annotation(
    annotation: &str,
) -> Result<(Option<String>, Option<SourceLocation>), FailureReason> {
    let annotation = annotation.trim();
    let Some((sig, loc)) = annotation.rsplit_once(" at ") else {
        let sig = (!annotation.is_empty()).then(|| annotation.to_string());
        return Ok((sig, None));
    };

    let (file, line) = loc
        .rsplit_once(':')
        .ok_or_else(|| FailureReason::BadLocation(loc.to_string()))?;
    let line = line
        .trim()
        .parse::<u32>()
        .map_err(|_| FailureReason::BadLocation(line.to_string()))?;

    let sig = sig.trim();
    Ok((
        (!sig.is_empty()).then(|| sig.to_string()),
        Some(SourceLocation {
            file: file.trim().to_string(),
            line,
        }),
    ))
}

fn parse_back_reference(tail: &str) -> Result<Option<BackReference>, FailureReason> {
    if tail.is_empty() {
        return Ok(None);
    }
    let unexpected = || FailureReason::UnexpectedTrailing(tail.to_string());

    if let Some(inner) = tail
        .strip_prefix("(recursive: see ")
        .and_then(|s| s.strip_suffix(')'))
    {
        let line = inner.trim().parse().map_err(|_| unexpected())?;
        return Ok(Some(BackReference::Recursive(line)));
    }
    if let Some(inner) = tail.strip_prefix("[see ").and_then(|s| s.strip_suffix(']')) {
        let line = inner.trim().parse().map_err(|_| unexpected())?;
        return Ok(Some(BackReference::AlreadyShown(line)));
    }
    Err(unexpected())
}

/// `static` among the declaration specifiers, i.e. before the function name.
fn declares_static(signature: &str, name: &str) -> bool {
    signature
        .split_whitespace()
        .take_while(|token| token.trim_start_matches('*').split('(').next() != Some(name))
        .any(|token| token == "static")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(text: &str) -> CallRecord {
        match classify(1, 0, text) {
            Classified::Data(record) => record,
            other => panic!("expected data line, got {:?}", other),
        }
    }

    fn reason(text: &str) -> FailureReason {
        match classify(7, 0, text) {
            Classified::Failure(ParseIssue::ClassificationFailure { reason, line, .. }) => {
                assert_eq!(line, 7);
                reason
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_root_with_annotation() {
        let record = data("{   0} main() <int main (int argc, char **argv) at src/main.c:85>:");
        assert_eq!(record.depth, 0);
        assert_eq!(record.name, "main");
        assert_eq!(
            record.signature.as_deref(),
            Some("int main (int argc, char **argv)")
        );
        assert_eq!(
            record.location,
            Some(SourceLocation {
                file: "src/main.c".to_string(),
                line: 85
            })
        );
        assert!(record.expanded);
        assert!(!record.is_static);
        assert!(!record.recursive);
    }

    #[test]
    fn test_nested_external_call() {
        let record = data("{   2}         printf()");
        assert_eq!(record.depth, 2);
        assert_eq!(record.name, "printf");
        assert!(record.signature.is_none());
        assert!(record.location.is_none());
        assert!(!record.expanded);
    }

    #[test]
    fn test_indentation_without_level_marker() {
        assert_eq!(data("        leaf()").depth, 2);
        assert_eq!(data("1 main() <...>:").depth, 0);
        assert_eq!(data("    2 helper() <...>:").depth, 1);
        assert_eq!(data("        3 leaf() <...>:").depth, 2);
        assert_eq!(data("    2     helper()").depth, 2);
    }

    #[test]
    fn test_number_column_before_level_marker() {
        assert_eq!(data("    1 {   0} main() <int main (void) at a.c:1>:").depth, 0);
        assert_eq!(data("   12 {   1}     helper()").depth, 1);
    }

    #[test]
    fn test_uneven_indent_before_number() {
        assert_eq!(
            reason("  2 helper()"),
            FailureReason::UnevenIndent { unit: INDENT_UNIT }
        );
    }

    #[test]
    fn test_static_detection() {
        assert!(data("{   0} helper() <static int helper (int n) at b.c:3>:").is_static);
        assert!(data("{   0} helper() <static inline void helper (void) at b.c:3>:").is_static);
        assert!(!data("{   0} helper() <int helper (int static_count) at b.c:3>:").is_static);
    }

    #[test]
    fn test_recursion_markers() {
        let def = data("{   1}     walk() <void walk (int n) at t.c:4> (R):");
        assert!(def.recursive);
        assert!(def.expanded);

        let call = data("{   2}         walk() <void walk (int n) at t.c:4> (recursive: see 3)");
        assert_eq!(call.back_reference, Some(BackReference::Recursive(3)));
        assert!(!call.expanded);

        let brief = data("{   1}     walk() <void walk (int n) at t.c:4>: [see 3]");
        assert_eq!(brief.back_reference, Some(BackReference::AlreadyShown(3)));
    }

    #[test]
    fn test_placeholder_annotation() {
        let record = data("{   0} main() <...>:");
        assert_eq!(record.signature.as_deref(), Some("..."));
        assert!(record.location.is_none());
    }

    #[test]
    fn test_spans_with_and_without_terminator() {
        match classify(3, 10, "{   0} f()\r\n") {
            Classified::Data(record) => {
                assert_eq!(record.line, 3);
                assert_eq!(record.span, 10..20);
                assert_eq!(record.full_span, 10..22);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_non_data_lines() {
        assert_eq!(classify(1, 0, ""), Classified::NonData);
        assert_eq!(classify(1, 0, "   \t "), Classified::NonData);
        assert_eq!(
            classify(1, 0, "cflow: src/a.c:10: warning: main redefined"),
            Classified::NonData
        );
        assert_eq!(classify(1, 0, "GNU cflow 1.7"), Classified::NonData);
    }

    #[test]
    fn test_classification_failures() {
        assert_eq!(
            reason("{   0} main() <int main (void) at a.c:3:"),
            FailureReason::UnterminatedAnnotation
        );
        assert_eq!(
            reason("{   1}   helper()"),
            FailureReason::UnevenIndent { unit: INDENT_UNIT }
        );
        assert_eq!(reason("\thelper()"), FailureReason::TabIndent);
        assert_eq!(
            reason("{   2}     helper()"),
            FailureReason::LevelMismatch { marker: 2, indent: 1 }
        );
        assert_eq!(reason("{   1}     "), FailureReason::MissingName);
        assert_eq!(reason("{  x}     helper()"), FailureReason::BadLevelMarker);
        assert_eq!(
            reason("{   0} main() <int main (void) at a.c:xx>:"),
            FailureReason::BadLocation("xx".to_string())
        );
        assert_eq!(
            reason("{   0} main() <int main (void) at a.c:3> trailing"),
            FailureReason::UnexpectedTrailing("trailing".to_string())
        );
    }
}

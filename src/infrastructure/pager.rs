//! Shows text through `$PAGER` (or `less -R`), falling back to stdout.

use std::io::{self, Write};
use std::process::Stdio;

use anyhow::{Context, Result};
use log::{debug, warn};

use super::CommandSpec;

/// Pager from the `PAGER` value, `less -R` when unset or blank.
pub fn pager_command(pager_env: Option<&str>) -> CommandSpec {
    let mut words = pager_env.unwrap_or_default().split_whitespace();
    match words.next() {
        Some(program) => CommandSpec {
            program: program.to_string(),
            args: words.map(str::to_string).collect(),
        },
        None => CommandSpec {
            program: "less".to_string(),
            args: vec!["-R".to_string()],
        },
    }
}

/// Print `text`, paged when `use_pager` is set.
pub fn show(text: &str, use_pager: bool) -> Result<()> {
    if use_pager {
        let spec = pager_command(std::env::var("PAGER").ok().as_deref());
        match page(&spec, text) {
            Ok(()) => return Ok(()),
            Err(err) => warn!("Pager {} unavailable ({:#}); printing instead", spec.program, err),
        }
    }
    print_stdout(text)
}

fn page(spec: &CommandSpec, text: &str) -> Result<()> {
    debug!("Paging through {}", spec);
    let mut child = spec
        .command()
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute {}", spec.program))?;
    if let Some(mut stdin) = child.stdin.take() {
        // The reader quitting early is not an error.
        match stdin.write_all(text.as_bytes()) {
            Err(err) if err.kind() != io::ErrorKind::BrokenPipe => return Err(err.into()),
            _ => {}
        }
    }
    child.wait().context("Failed to wait for pager")?;
    Ok(())
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}

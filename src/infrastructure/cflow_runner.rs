/// GNU cflow runner.
///
/// Builds the `cflow --print-level` command line, checks that cflow is
/// installed and runs it under a timeout. When the timeout fires the process
/// is killed and whatever it printed so far is kept.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use super::CommandSpec;

/// Default wall-clock limit for one cflow run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

// ═══════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════

/// No `--depth`: bounds are applied after parsing by the depth limiter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CflowOptions {
    /// `--main=NAME`: start the graph at this function.
    pub main: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CflowOutput {
    pub stdout: String,
    pub stderr: String,
    /// Killed by the timeout; `stdout` may be incomplete.
    pub timed_out: bool,
}

/// Build the cflow command line for `paths` (testable, runs nothing).
pub fn build_command_spec(program: &str, options: &CflowOptions, paths: &[PathBuf]) -> CommandSpec {
    let mut args = Vec::new();
    if let Some(main) = &options.main {
        args.push(format!("--main={}", main));
    }
    args.push("--print-level".to_string());
    args.extend(paths.iter().map(|p| p.display().to_string()));
    CommandSpec {
        program: program.to_string(),
        args,
    }
}

/// Check that `program` runs and answers `--version`.
pub fn check_cflow_available(program: &str) -> Result<()> {
    let check = std::process::Command::new(program).arg("--version").output();

    match check {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            let first = version.lines().next().unwrap_or_default();
            debug!("Using {}: {}", program, first.trim());
            Ok(())
        }
        Ok(output) => {
            bail!("{} found but returned error: {:?}", program, output.status.code());
        }
        Err(_) => {
            bail!(
                "{} not found in PATH. Install GNU cflow (e.g. `apt install cflow`) or pass --input with saved output",
                program
            );
        }
    }
}

/// Run `spec`, killing it once `timeout` has passed.
pub fn run_cflow(spec: &CommandSpec, timeout: Duration) -> Result<CflowOutput> {
    info!("Running {}", spec);
    let mut child = spec
        .command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute {}", spec.program))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let (status, timed_out) = wait_with_timeout(&mut child, timeout)?;
    let output = CflowOutput {
        stdout: join_reader(stdout)?,
        stderr: join_reader(stderr)?,
        timed_out,
    };

    if timed_out {
        warn!(
            "{} did not finish within {} sec; using partial output",
            spec.program,
            timeout.as_secs_f64()
        );
        return Ok(output);
    }
    if !status.success() {
        bail!(
            "{} failed with exit code {:?}: {}",
            spec.program,
            status.code(),
            output.stderr.trim()
        );
    }
    Ok(output)
}

// ═══════════════════════════════════════════════════════════════════════════
// Internal Implementation
// ═══════════════════════════════════════════════════════════════════════════

type Reader = Option<thread::JoinHandle<std::io::Result<String>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            pipe.read_to_end(&mut bytes)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        })
    })
}

fn join_reader(reader: Reader) -> Result<String> {
    match reader {
        Some(handle) => match handle.join() {
            Ok(text) => text.context("Failed to read cflow output"),
            Err(_) => bail!("cflow output reader panicked"),
        },
        None => Ok(String::new()),
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<(ExitStatus, bool)> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().context("Failed to poll cflow")? {
            return Ok((status, false));
        }
        if started.elapsed() >= timeout {
            // Already exited between the poll and the kill is fine.
            let _ = child.kill();
            let status = child.wait().context("Failed to reap cflow")?;
            return Ok((status, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

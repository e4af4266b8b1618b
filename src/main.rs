// Command-line entry point for cflowgraph.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use log::{debug, info};

use cflowgraph::application::{analyze, MatchPolicy, RenderUsecase, RunRequest, SelectionOutcome};
use cflowgraph::domain::normalize_target;
use cflowgraph::infrastructure::file_discovery::effective_excludes;
use cflowgraph::infrastructure::{
    build_command_spec, check_cflow_available, discover_sources, logging, pager, plan_output,
    read_file_list, run_cflow, write_file_list, write_graph, CflowOptions, Config, LogLevel,
};
use cflowgraph::ports::{
    DotOptions, DotRenderer, JsonRenderer, OutputFormat, RawRenderer, Renderer, TreeOptions,
    TreeRenderer,
};

/// C function call graph generator (using GNU cflow).
#[derive(Parser, Debug)]
#[command(name = "cflowgraph", author, version, about, long_about = None)]
struct Cli {
    /// Root path to search for .c and .h files
    #[arg(long)]
    rootpath: Option<PathBuf>,

    /// Skip files whose directory contains this text (can be repeated)
    #[arg(long)]
    excludepath: Vec<String>,

    /// Don't use any built-in exclude paths
    #[arg(long)]
    nobuiltin_excludes: bool,

    /// Read source paths from this file instead of searching
    #[arg(long, conflicts_with = "uselastfile")]
    usefile: Option<PathBuf>,

    /// Reuse the file list written by the last search
    #[arg(long)]
    uselastfile: bool,

    /// Configuration file (default: ./cflowgraph.toml when present)
    #[arg(long, env = "CFLOWGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Logging level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    loglevel: LogLevel,

    /// Shortcut for --loglevel=debug
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the call graph for a function
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Function to graph (with or without trailing "()")
    #[arg(long)]
    main: Option<String>,

    /// Levels to keep below the function
    #[arg(long)]
    depth: Option<usize>,

    /// Output format, repeatable or comma separated [default: tree]
    #[arg(long, value_enum, value_delimiter = ',')]
    format: Vec<OutputFormat>,

    /// Graph file; .dot/.gv write DOT text, .svg/.png/.pdf run Graphviz [default: dot.svg]
    #[arg(long)]
    dotfile: Option<PathBuf>,

    /// Show function signatures
    #[arg(long)]
    show_signatures: bool,

    /// Label put in front of static root functions
    #[arg(long)]
    static_label: Option<String>,

    /// Path components kept in tree locations, 0 for full paths
    #[arg(long)]
    path_parts: Option<usize>,

    /// Which matches to render when the function name is ambiguous
    #[arg(long, value_enum, default_value_t = MatchPolicy::PreferRoots)]
    matches: MatchPolicy,

    /// Use a pager for text output
    #[arg(long)]
    pager: bool,

    /// Print cflow stderr output
    #[arg(long)]
    stderr: bool,

    /// Read saved cflow output from FILE ("-" for stdin) instead of running cflow
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Disable ANSI colours
    #[arg(long)]
    no_color: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { LogLevel::Debug } else { cli.loglevel };
    logging::init(level);
    debug!("Launching cflowgraph: {:?}", cli);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let sources = resolve_sources(&cli, &config)?;
    let Some(Commands::Run(args)) = cli.command else {
        if sources.is_none() {
            Cli::command().print_help()?;
        }
        return Ok(());
    };

    let text = match &args.input {
        Some(input) => read_input(input)?,
        None => {
            let Some(paths) = sources else {
                bail!("No source files: pass --rootpath, --usefile or --uselastfile, or run --input");
            };
            if paths.is_empty() {
                info!("No files found.");
                return Ok(());
            }
            cflow_output(&config, &args, &paths)?
        }
    };

    if text.lines().count() < 2 {
        info!("No results from cflow.");
        return Ok(());
    }

    render(&config, &args, &text)
}

/// Source files from a saved list or a fresh search; `None` when neither was asked for.
fn resolve_sources(cli: &Cli, config: &Config) -> Result<Option<Vec<PathBuf>>> {
    let list = if cli.uselastfile {
        Some(config.file_list.clone())
    } else {
        cli.usefile.clone()
    };

    if let Some(list) = list {
        if !list.is_file() {
            bail!("File {} does not exist. Provide --rootpath option.", list.display());
        }
        let paths = read_file_list(&list)?;
        info!("Read {} paths from {}", paths.len(), list.display());
        return Ok(Some(paths));
    }

    let Some(root) = &cli.rootpath else {
        return Ok(None);
    };
    let mut extra = config.excludes.clone();
    extra.extend(cli.excludepath.iter().cloned());
    let excludes = effective_excludes(&extra, config.builtin_excludes && !cli.nobuiltin_excludes);
    debug!("Excluding paths containing {:?}", excludes);

    let paths = discover_sources(root, &excludes)?;
    if !paths.is_empty() {
        info!(
            "Writing paths to {} (found {} files)",
            config.file_list.display(),
            paths.len()
        );
        write_file_list(&config.file_list, &paths)?;
    }
    Ok(Some(paths))
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read cflow output from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn cflow_output(config: &Config, args: &RunArgs, paths: &[PathBuf]) -> Result<String> {
    check_cflow_available(&config.cflow)?;
    let options = CflowOptions {
        main: args.main.as_deref().map(|m| normalize_target(m).to_string()),
    };
    let spec = build_command_spec(&config.cflow, &options, paths);
    debug!("Appending {} paths to cflow command", paths.len());
    let output = run_cflow(&spec, Duration::from_secs(config.timeout_secs))?;

    if args.stderr {
        eprintln!("cflow: stderr");
        eprint!("{}", output.stderr);
    }
    Ok(output.stdout)
}

fn render(config: &Config, args: &RunArgs, text: &str) -> Result<()> {
    let parsed = analyze(text)?;

    let mut formats: Vec<OutputFormat> = Vec::new();
    let requested = if args.format.is_empty() {
        &config.formats
    } else {
        &args.format
    };
    for format in requested {
        if !formats.contains(format) {
            formats.push(*format);
        }
    }

    let dotfile = args.dotfile.clone().unwrap_or_else(|| config.dotfile.clone());
    let graph_plan = if formats.contains(&OutputFormat::Dot) {
        Some(plan_output(&dotfile)?)
    } else {
        None
    };

    let static_label = args
        .static_label
        .clone()
        .unwrap_or_else(|| config.static_label.clone());
    let tree = TreeRenderer::new(TreeOptions {
        show_signatures: args.show_signatures || config.show_signatures,
        static_label: static_label.clone(),
        path_parts: Some(args.path_parts.unwrap_or(config.path_parts)),
        color: !args.no_color && (args.pager || io::stdout().is_terminal()),
    });
    let dot = DotRenderer::new(DotOptions {
        static_label,
        ..DotOptions::default()
    });
    let mut renderers: Vec<&dyn Renderer> = Vec::with_capacity(formats.len());
    for format in &formats {
        renderers.push(match format {
            OutputFormat::Tree => &tree,
            OutputFormat::Dot => &dot,
            OutputFormat::Raw => &RawRenderer,
            OutputFormat::Json => &JsonRenderer,
        });
    }

    let request = RunRequest {
        target: args.main.clone(),
        max_depth: args.depth,
        match_policy: args.matches,
    };
    let report = RenderUsecase::new(renderers).run(&parsed.forest, &request)?;

    match &report.outcome {
        SelectionOutcome::NotFound { target } => {
            bail!("Function {}() not found in cflow output", target);
        }
        SelectionOutcome::Found { matches, rendered } if matches != rendered => {
            info!(
                "Rendering {} of {} matches (use --matches all for every one)",
                rendered, matches
            );
        }
        _ => {}
    }

    let mut text_output = String::new();
    for output in &report.outputs {
        match (&graph_plan, output.format) {
            (Some(plan), OutputFormat::Dot) => {
                info!("Generating dot graph.");
                write_graph(&output.body, plan)?;
            }
            _ => text_output.push_str(&output.body),
        }
    }
    if !text_output.is_empty() {
        pager::show(&text_output, args.pager)?;
    }
    Ok(())
}

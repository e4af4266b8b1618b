// Infrastructure: everything that touches the filesystem or spawns processes.

pub mod cflow_runner;
pub mod config;
pub mod file_discovery;
pub mod graphviz;
pub mod logging;
pub mod pager;

pub use cflow_runner::{build_command_spec, check_cflow_available, run_cflow, CflowOptions, CflowOutput};
pub use config::{Config, DEFAULT_CONFIG_FILE};
pub use file_discovery::{discover_sources, read_file_list, write_file_list, DEFAULT_FILE_LIST};
pub use graphviz::{plan_output, write_graph, GraphOutput};
pub use logging::LogLevel;

/// A program plus its arguments, built without running anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

//! Logs command - Print or stream the instance's log output
//!
//! Informational only: a missing or stopped instance produces whatever the
//! runtime reports, and never a hard failure of the surrounding workflow.

use std::path::Path;

use serde::Serialize;

use crate::config::DeployConfig;
use crate::output::{Output, OutputFormat, TableDisplay};
use crate::runtime::ContainerRuntime;

/// Captured log tail.
#[derive(Debug, Serialize)]
pub struct LogsResult {
    pub container: String,
    pub lines: u32,
    pub output: String,
}

impl TableDisplay for LogsResult {
    fn to_table(&self) -> String {
        if self.output.is_empty() {
            format!("(no log output for '{}')", self.container)
        } else {
            self.output.clone()
        }
    }
}

/// Run the logs command.
pub async fn run(path: &str, lines: u32, follow: bool, format: OutputFormat) -> anyhow::Result<()> {
    let workdir = Path::new(path)
        .canonicalize()
        .unwrap_or_else(|_| Path::new(path).to_path_buf());
    let config = DeployConfig::load(&workdir);
    let runtime = ContainerRuntime::new(&config.runtime.binary);
    let container = config.service.container.clone();

    if follow {
        // Streams until interrupted; output goes straight to the terminal.
        runtime.logs_follow(&container)?;
        return Ok(());
    }

    let output = runtime.logs_tail(&container, lines)?;
    let result = LogsResult {
        container,
        lines,
        output,
    };

    Output::new(result, format).render()
}

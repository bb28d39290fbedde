//! Down command - Stop and remove the deployed instance
//!
//! Teardown is best-effort: a missing instance is reported, not failed on.

use std::io::{self, IsTerminal};
use std::path::Path;

use colored::Colorize;
use dialoguer::Confirm;
use serde::Serialize;

use crate::config::DeployConfig;
use crate::output::{Output, OutputFormat, TableDisplay};
use crate::runtime::ContainerRuntime;

/// Result of the teardown.
#[derive(Debug, Serialize)]
pub struct DownResult {
    pub container: String,
    pub stopped: bool,
    pub removed: bool,
}

impl TableDisplay for DownResult {
    fn to_table(&self) -> String {
        if self.stopped || self.removed {
            format!(
                "{} instance '{}' stopped and removed",
                "SUCCESS:".green().bold(),
                self.container
            )
        } else {
            format!(
                "{} no instance named '{}' to remove",
                "INFO:".yellow().bold(),
                self.container
            )
        }
    }
}

/// Run the down command.
pub async fn run(path: &str, yes: bool, format: OutputFormat) -> anyhow::Result<()> {
    let workdir = Path::new(path)
        .canonicalize()
        .unwrap_or_else(|_| Path::new(path).to_path_buf());
    let config = DeployConfig::load(&workdir);
    let runtime = ContainerRuntime::new(&config.runtime.binary);
    let container = config.service.container.clone();

    if !yes && io::stdin().is_terminal() && io::stdout().is_terminal() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Stop and remove container '{}'?", container))
            .default(true)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let stopped = runtime.stop(&container);
    let removed = runtime.remove(&container);

    let result = DownResult {
        container,
        stopped,
        removed,
    };

    Output::new(result, format).render()
}

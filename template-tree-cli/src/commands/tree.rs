//! Tree command

use anyhow::Result;
use console::style;
use std::path::PathBuf;
use std::time::Duration;

/// Print the containment tree of a configuration
pub struct TreeCommand {
    config: PathBuf,
    json: bool,
    timeout: Duration,
}

impl TreeCommand {
    /// Create a new command instance
    #[must_use]
    pub const fn new(config: PathBuf, json: bool, timeout_ms: u64) -> Self {
        Self {
            config,
            json,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if initialisation fails or the tree cannot be
    /// serialized.
    pub async fn execute(&self) -> Result<()> {
        let session = crate::open(&self.config, self.timeout).await?;
        super::print_report_problems(&session.report);

        match (&session.report.tree, self.json) {
            (Some(tree), true) => println!("{}", serde_json::to_string_pretty(tree)?),
            (Some(tree), false) => print!("{tree}"),
            (None, _) => println!(
                "{} root template '{}' is not loaded",
                style("No tree:").yellow().bold(),
                session.manager.settings().root_template
            ),
        }

        session.manager.dispose();
        Ok(())
    }
}

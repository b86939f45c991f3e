//! Render command

use anyhow::{Context, Result};
use console::style;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Render a configuration and print the resulting markup
pub struct RenderCommand {
    config: PathBuf,
    output: Option<PathBuf>,
    timeout: Duration,
}

impl RenderCommand {
    /// Create a new command instance
    #[must_use]
    pub const fn new(config: PathBuf, output: Option<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            config,
            output,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if initialisation fails or the output cannot be
    /// written.
    pub async fn execute(&self) -> Result<()> {
        let session = crate::open(&self.config, self.timeout).await?;
        super::print_report_problems(&session.report);
        if !session.all_loaded {
            eprintln!(
                "{} not every template attached within {}ms",
                style("warning:").yellow().bold(),
                self.timeout.as_millis()
            );
        }

        let html = session.html();
        match &self.output {
            Some(path) => {
                fs::write(path, &html)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "{} {} ({} templates)",
                    style("Rendered").green().bold(),
                    path.display(),
                    session.report.loaded.len()
                );
            }
            None => println!("{html}"),
        }

        session.manager.dispose();
        Ok(())
    }
}

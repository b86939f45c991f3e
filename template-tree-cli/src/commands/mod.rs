//! CLI command implementations

pub mod render;
pub mod tree;

pub use render::RenderCommand;
pub use tree::TreeCommand;

use console::style;
use template_tree::manager::InitReport;

/// Print skipped and failed templates to stderr
pub(crate) fn print_report_problems(report: &InitReport) {
    for name in &report.skipped {
        eprintln!("{} {}", style("skipped").dim(), style(name).dim());
    }
    for (name, err) in &report.failed {
        eprintln!("{} {}: {}", style("failed").red().bold(), style(name).bold(), err);
    }
}

//! Output formatting for CLI results.
//!
//! Renders dry-run previews and run summaries as colored tables or JSON.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::apply::ApplyAction;
use crate::orchestrator::{RunOutcome, RunReport, SyncPreview};

use super::commands::OutputFormat;

/// Output formatter for CLI results.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Diff row for table display.
#[derive(Tabled)]
struct DiffRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Resource")]
    resource: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result of a run, including any dry-run previews.
    #[must_use]
    pub fn format_report(&self, report: &RunReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    /// Formats a run report as text.
    fn format_report_text(report: &RunReport) -> String {
        let mut output = String::new();

        for preview in &report.previews {
            output.push_str(&Self::format_preview_text(preview));
        }

        let status = match report.outcome {
            RunOutcome::Completed => format!("{} Sync {}", "✓".green(), report.outcome),
            RunOutcome::CompletedWithFailures => {
                format!("{} Sync {}", "⚠".yellow(), report.outcome)
            }
        };

        let _ = write!(
            output,
            "\n{status}: {} synchronizer(s), {} item(s) applied\n",
            report.synchronizers, report.applied
        );

        if !report.failures.is_empty() {
            let _ = write!(output, "\n{} Failures:\n", "⚠".yellow());
            for failure in &report.failures {
                let _ = writeln!(output, "   - [{}] {}", failure.synchronizer, failure.failure);
            }
        }

        output
    }

    /// Formats one synchronizer's preview as text.
    fn format_preview_text(preview: &SyncPreview) -> String {
        let mut output = String::new();

        let _ = write!(output, "\n{}\n", preview.synchronizer.bold());

        if preview.diff.is_empty() {
            let _ = writeln!(output, "   {} already in sync", "✓".green());
            return output;
        }

        let field = preview.display_field.as_str();
        let rows: Vec<DiffRow> = preview
            .diff
            .insertions
            .iter()
            .map(|r| DiffRow {
                action: Self::format_action(ApplyAction::Create),
                resource: r.label(field),
            })
            .chain(preview.diff.updations.iter().map(|r| DiffRow {
                action: Self::format_action(ApplyAction::Update),
                resource: r.label(field),
            }))
            .chain(preview.diff.deletions.iter().map(|r| DiffRow {
                action: Self::format_action(ApplyAction::Delete),
                resource: r.label(field),
            }))
            .collect();

        let table = Table::new(rows).to_string();
        output.push_str(&table);
        output.push('\n');

        let _ = writeln!(
            output,
            "   {} change(s): {}",
            preview.diff.total_changes(),
            preview.diff
        );

        output
    }

    /// Formats an apply action with color.
    fn format_action(action: ApplyAction) -> String {
        match action {
            ApplyAction::Create => "+create".green().to_string(),
            ApplyAction::Update => "~update".yellow().to_string(),
            ApplyAction::Delete => "-delete".red().to_string(),
            ApplyAction::Analyze => "analyze".to_string(),
        }
    }
}

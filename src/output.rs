//! Output formatting and styling module.
//!
//! All user-facing terminal output goes through here: coloured status lines,
//! the per-file progress bar and the closing summary table. Diagnostics go
//! through `tracing` instead.

use crate::file_organizer::{FileOutcome, FileStatus, OrganizeReport, ProgressReporter};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Stateless helpers for consistently styled CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use ephem::output::OutputFormatter;
    /// OutputFormatter::success("All files sorted");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for `total` files.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints file counts per destination folder.
    pub fn summary_table(folder_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = folder_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max("Folder".len());

        println!(
            "{:<width$} | {}",
            "Folder".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (folder, count) in folder_counts {
            println!(
                "{:<width$} | {} {}",
                folder,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }

    /// Prints the outcome of a run: summary table, then any failures.
    pub fn report(report: &OrganizeReport) {
        if report.total() == 0 {
            Self::info("No files found to organize.");
            return;
        }

        let counts = report.folder_counts();
        let sorted: usize = counts.values().sum();
        Self::summary_table(&counts, sorted);

        if report.has_failures() {
            Self::header("FAILED");
            for outcome in report.failed() {
                if let FileStatus::Failed(reason) = &outcome.status {
                    Self::error(&format!("{}: {}", outcome.record.path.display(), reason));
                }
            }
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Line printed for one file, e.g. `beach.jpg → 2023/May/`.
pub fn describe_outcome(outcome: &FileOutcome) -> String {
    let folder = if outcome.folder.is_empty() {
        String::from(".")
    } else {
        format!("{}/", outcome.folder)
    };
    match &outcome.status {
        FileStatus::Moved => format!("{} {} {}", "✓".green(), outcome.record.display_name(), folder),
        FileStatus::Planned => format!("  {} → {}", outcome.record.display_name(), folder),
        FileStatus::Failed(_) => format!("{} {}", "✗".red(), outcome.record.display_name()),
    }
}

/// Progress reporter backed by an indicatif bar.
///
/// With `verbose`, each file is also listed above the bar.
pub struct ProgressDisplay {
    bar: Option<ProgressBar>,
    verbose: bool,
}

impl ProgressDisplay {
    pub fn new(verbose: bool) -> Self {
        Self { bar: None, verbose }
    }
}

impl ProgressReporter for ProgressDisplay {
    fn start(&mut self, total: usize) {
        self.bar = Some(OutputFormatter::create_progress_bar(total as u64));
    }

    fn file_done(&mut self, outcome: &FileOutcome) {
        let Some(bar) = &self.bar else {
            return;
        };
        if self.verbose || matches!(outcome.status, FileStatus::Failed(_)) {
            bar.println(describe_outcome(outcome));
        }
        bar.set_message(outcome.record.display_name().into_owned());
        bar.inc(1);
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Prints one line per file, for dry runs and non-interactive output.
pub struct LineProgress;

impl ProgressReporter for LineProgress {
    fn start(&mut self, total: usize) {
        OutputFormatter::plain(&format!("{} {} found", total, plural(total)));
    }

    fn file_done(&mut self, outcome: &FileOutcome) {
        OutputFormatter::plain(&describe_outcome(outcome));
    }

    fn finish(&mut self) {}
}

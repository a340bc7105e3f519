//! Command-line interface for ephem.
//!
//! Parses arguments, asks for any missing folder on stdin, loads the filter
//! configuration and drives a [`FileOrganizer`] run with terminal output.

use crate::config::FilterConfig;
use crate::file_organizer::{FileOrganizer, OrganizeReport, ProgressReporter};
use crate::output::{LineProgress, OutputFormatter, ProgressDisplay};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const EMPTY_INPUT_HINT: &str = "Oops, I don't think you put anything in, try again maybe :)";

/// Sort photos by capture date, and everything else by type.
#[derive(Debug, Clone, Parser)]
#[command(name = "ephem", version, about)]
pub struct Cli {
    /// Folder to take files from (asked for if omitted)
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Folder to sort files into, created if missing (asked for if omitted)
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub target: Option<PathBuf>,

    /// Show where files would go without moving anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Filter configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// List every file and enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print one line per file instead of a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Asks for a folder until a non-empty answer is given.
///
/// Fails if the input ends before an answer is read.
pub fn prompt_for_path(
    input: &mut impl BufRead,
    output: &mut impl Write,
    question: &str,
) -> Result<PathBuf> {
    loop {
        write!(output, "{} ", question)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("no folder given");
        }

        let answer = line.trim();
        if answer.is_empty() {
            writeln!(output, "{}", EMPTY_INPUT_HINT)?;
            continue;
        }
        return Ok(PathBuf::from(answer));
    }
}

/// Returns the source and target folders, prompting for whichever is missing.
pub fn resolve_folders(
    cli: &Cli,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<(PathBuf, PathBuf)> {
    let source = match &cli.source {
        Some(source) => source.clone(),
        None => prompt_for_path(input, output, "Please enter the source folder path:")?,
    };
    let target = match &cli.target {
        Some(target) => target.clone(),
        None => prompt_for_path(
            input,
            output,
            "Alongside the path to your destination folder:",
        )?,
    };
    Ok((source, target))
}

/// Runs ephem with parsed arguments, reading any missing folder from stdin.
pub fn run_cli(cli: Cli) -> Result<OrganizeReport> {
    let stdin = io::stdin();
    let (source, target) = resolve_folders(&cli, &mut stdin.lock(), &mut io::stdout())?;
    run_with_folders(&cli, &source, &target)
}

/// Organizes (or plans) `source` into `target` using the CLI options.
pub fn run_with_folders(cli: &Cli, source: &Path, target: &Path) -> Result<OrganizeReport> {
    if !source.is_dir() {
        bail!("source folder {} does not exist", source.display());
    }

    let filters = FilterConfig::load(cli.config.as_deref())
        .context("Error loading configuration")?
        .compile()
        .context("Error compiling filters")?;

    let organizer = FileOrganizer::new(target).with_filters(filters);

    let mut progress: Box<dyn ProgressReporter> = if cli.dry_run || cli.no_progress {
        Box::new(LineProgress)
    } else {
        Box::new(ProgressDisplay::new(cli.verbose))
    };

    let result = if cli.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing {} → {}",
            source.display(),
            target.display()
        ));
        organizer.plan(source, progress.as_mut())
    } else {
        OutputFormatter::info(&format!(
            "Organizing {} → {}",
            source.display(),
            target.display()
        ));
        organizer.organize(source, progress.as_mut())
    };
    let report = result.with_context(|| format!("Could not organize {}", source.display()))?;

    OutputFormatter::report(&report);

    if report.dry_run {
        OutputFormatter::dry_run_notice("No files were moved. Run again without --dry-run to apply.");
    } else if report.has_failures() {
        OutputFormatter::warning("Some files could not be moved. Please review the errors above.");
    } else {
        OutputFormatter::success("The organisational process was successful!");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ephem").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_parse_full_arguments() {
        let cli = cli(&["in", "out", "--dry-run", "--config", "rules.toml", "-v"]);
        assert_eq!(cli.source, Some(PathBuf::from("in")));
        assert_eq!(cli.target, Some(PathBuf::from("out")));
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("rules.toml")));
    }

    #[test]
    fn test_parse_without_folders() {
        let cli = cli(&[]);
        assert!(cli.source.is_none());
        assert!(cli.target.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_prompt_retries_on_empty_input() {
        let mut input = Cursor::new("\n   \n/photos/inbox\n");
        let mut output = Vec::new();

        let path = prompt_for_path(&mut input, &mut output, "Source?").unwrap();
        assert_eq!(path, PathBuf::from("/photos/inbox"));

        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches(EMPTY_INPUT_HINT).count(), 2);
    }

    #[test]
    fn test_prompt_fails_at_end_of_input() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        assert!(prompt_for_path(&mut input, &mut output, "Source?").is_err());
    }

    #[test]
    fn test_resolve_folders_prompts_only_for_missing() {
        let cli = cli(&["/photos/inbox"]);
        let mut input = Cursor::new("/photos/sorted\n");
        let mut output = Vec::new();

        let (source, target) = resolve_folders(&cli, &mut input, &mut output).unwrap();
        assert_eq!(source, PathBuf::from("/photos/inbox"));
        assert_eq!(target, PathBuf::from("/photos/sorted"));
        assert!(String::from_utf8(output).unwrap().contains("destination folder"));
    }

    #[test]
    fn test_run_with_missing_source_fails() {
        let cli = cli(&[]);
        let result = run_with_folders(&cli, Path::new("/non/existent/path"), Path::new("/tmp/out"));
        assert!(result.is_err());
    }
}

// crates.io
use clap::{
	Args, Parser, Subcommand,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};

// std
use std::{path::PathBuf, process::ExitCode};

// self
use crate::{
	lint::{self, DEFAULT_EXTENSION, LintOptions, ReportFormat, RunSummary},
	prelude::*,
};

/// Command-line interface for the jump-statement spacing linter.
#[derive(Debug, Parser)]
#[command(
	version = concat!(
		env!("CARGO_PKG_VERSION"),
		"-",
		env!("VERGEN_GIT_SHA"),
		"-",
		env!("VERGEN_CARGO_TARGET_TRIPLE"),
	),
	rename_all = "kebab",
	styles = styles(),
)]
pub(crate) struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Run lint rules and report findings.
	Check {
		/// Optional source files. Defaults to git-tracked files with a selected extension.
		files: Vec<PathBuf>,
		#[command(flatten)]
		selection: Selection,
		/// Output format for findings.
		#[arg(long, value_enum, default_value_t = ReportFormat::Text)]
		format: ReportFormat,
	},
	/// Apply all automatic fixes, then re-check.
	Fix {
		/// Optional source files. Defaults to git-tracked files with a selected extension.
		files: Vec<PathBuf>,
		#[command(flatten)]
		selection: Selection,
		/// Leave a file untouched when any of its fixes conflict.
		#[arg(long)]
		strict: bool,
	},
	/// Print implemented rule IDs.
	Rules,
}

#[derive(Debug, Args)]
struct Selection {
	/// Only run these rules. Repeat to select several.
	#[arg(long = "rule", value_name = "ID")]
	rules: Vec<String>,
	/// File extensions to lint. Repeat to select several.
	#[arg(long = "extension", value_name = "EXT", default_value = DEFAULT_EXTENSION)]
	extensions: Vec<String>,
}
impl Selection {
	fn options(&self) -> LintOptions {
		LintOptions {
			extensions: self.extensions.clone(),
			rules: self.rules.clone(),
			..LintOptions::default()
		}
	}
}

impl Cli {
	pub(crate) fn run(&self) -> Result<ExitCode> {
		match &self.command {
			Command::Check { files, selection, format } => {
				let options = LintOptions { format: *format, ..selection.options() };
				let summary = lint::run_check(files, &options)?;

				print_summary(&summary, false, *format);

				if has_failures(&summary) {
					eprintln!(
						"\nFound {} finding(s) and {} unreadable file(s).",
						summary.violation_count, summary.error_count
					);

					return Ok(ExitCode::FAILURE);
				}
			},
			Command::Fix { files, selection, strict } => {
				let options = LintOptions { strict_fixes: *strict, ..selection.options() };
				let summary = lint::run_fix(files, &options)?;

				print_summary(&summary, true, options.format);

				if has_failures(&summary) {
					eprintln!(
						"\nFound {} remaining finding(s) and {} unreadable file(s) after fix.",
						summary.violation_count, summary.error_count
					);

					return Ok(ExitCode::FAILURE);
				}
			},
			Command::Rules => lint::print_rules(),
		}

		Ok(ExitCode::SUCCESS)
	}
}

fn has_failures(summary: &RunSummary) -> bool {
	summary.violation_count + summary.error_count > 0
}

fn print_summary(summary: &RunSummary, fix_mode: bool, format: ReportFormat) {
	for line in &summary.output_lines {
		println!("{line}");
	}

	// JSON output stays one record per line on stdout.
	if format == ReportFormat::Json {
		return;
	}

	if fix_mode {
		println!(
			"\nChecked {} file(s). Applied {} fix(es).",
			summary.file_count, summary.applied_fix_count
		);

		if summary.skipped_fix_count > 0 {
			println!("Skipped {} conflicting fix(es).", summary.skipped_fix_count);
		}
	} else {
		println!("\nChecked {} file(s).", summary.file_count);
	}

	if summary.unfixable_count > 0 {
		println!("{} finding(s) require manual fixes.", summary.unfixable_count);
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_check_subcommand() {
		let cli = Cli::parse_from(["app", "check"]);

		let Command::Check { files, selection, format } = cli.command else {
			panic!("expected check");
		};

		assert!(files.is_empty());
		assert!(selection.rules.is_empty());
		assert_eq!(selection.extensions, vec![DEFAULT_EXTENSION.to_owned()]);
		assert_eq!(format, ReportFormat::Text);
	}

	#[test]
	fn parses_fix_with_selection() {
		let cli = Cli::parse_from([
			"app",
			"fix",
			"a.inc",
			"--rule",
			"BlankLineBeforeJump",
			"--extension",
			"inc",
			"--extension",
			"php",
			"--strict",
		]);

		let Command::Fix { files, selection, strict } = cli.command else {
			panic!("expected fix");
		};
		let options = selection.options();

		assert_eq!(files, vec![PathBuf::from("a.inc")]);
		assert_eq!(options.rules, vec!["BlankLineBeforeJump".to_owned()]);
		assert_eq!(options.extensions, vec!["inc".to_owned(), "php".to_owned()]);
		assert!(strict);
	}

	#[test]
	fn parses_json_format() {
		let cli = Cli::parse_from(["app", "check", "--format", "json"]);

		assert!(matches!(cli.command, Command::Check { format: ReportFormat::Json, .. }));
	}
}

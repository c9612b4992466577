mod cursor;
mod dispatch;
mod fixes;
mod jump_spacing;
mod report;
mod rule;
mod shared;
mod token;

pub(crate) use report::ReportFormat;
pub(crate) use shared::{DEFAULT_EXTENSION, LintOptions, RunSummary};

use std::{
	fs,
	path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::prelude::*;
use fixes::{FixError, FixReport, Fixer};
use rule::{Finding, Rule};
use shared::FileReport;
use token::{LexError, TokenStream};

const FILE_BATCH_SIZE: usize = 64;
const MAX_FIX_PASSES: usize = 8;

#[derive(Debug)]
struct FileFixOutcome {
	path: PathBuf,
	rewritten_text: Option<String>,
	applied_count: usize,
	skipped_count: usize,
}

/// What one dispatch pass over a file produced.
#[derive(Debug)]
struct Analysis {
	stream: TokenStream,
	findings: Vec<Finding>,
	fixer: Fixer,
}

pub(crate) fn run_check(requested_files: &[PathBuf], options: &LintOptions) -> Result<RunSummary> {
	let rules = rule::select_rules(&options.rules)?;
	let files = shared::resolve_files(requested_files, &options.extensions)?;
	let mut reports = Vec::new();

	for batch in files.chunks(FILE_BATCH_SIZE) {
		let batch_reports = batch
			.par_iter()
			.filter_map(|file| {
				let text = shared::read_source(file)?;

				Some(check_file(file, &text, &rules))
			})
			.collect::<Vec<_>>();

		reports.extend(batch_reports);
	}

	summarize(files.len(), reports, options.format)
}

pub(crate) fn run_fix(requested_files: &[PathBuf], options: &LintOptions) -> Result<RunSummary> {
	let rules = rule::select_rules(&options.rules)?;
	let files = shared::resolve_files(requested_files, &options.extensions)?;
	let mut total_applied = 0_usize;
	let mut total_skipped = 0_usize;

	for batch in files.chunks(FILE_BATCH_SIZE) {
		let outcomes = batch
			.par_iter()
			.map(|file| -> Result<FileFixOutcome> {
				let Some(original_text) = shared::read_source(file) else {
					return Ok(FileFixOutcome {
						path: file.clone(),
						rewritten_text: None,
						applied_count: 0,
						skipped_count: 0,
					});
				};
				let (text, applied_count, skipped_count) =
					apply_fix_passes(file, &original_text, &rules, options.strict_fixes)?;

				Ok(FileFixOutcome {
					path: file.clone(),
					rewritten_text: (applied_count > 0).then_some(text),
					applied_count,
					skipped_count,
				})
			})
			.collect::<Vec<_>>();

		for outcome in outcomes {
			let outcome = outcome?;

			total_applied += outcome.applied_count;
			total_skipped += outcome.skipped_count;

			if let Some(text) = outcome.rewritten_text {
				fs::write(&outcome.path, text)?;

				tracing::debug!(
					path = %outcome.path.display(),
					applied = outcome.applied_count,
					"rewrote file"
				);
			}
		}
	}

	let checked = run_check(requested_files, options)?;

	Ok(RunSummary { applied_fix_count: total_applied, skipped_fix_count: total_skipped, ..checked })
}

pub(crate) fn print_rules() {
	for rule in rule::RULE_IDS {
		println!("{rule}\timplemented");
	}
}

fn analyze(text: &str, rules: &[Box<dyn Rule>]) -> Result<Analysis, LexError> {
	let stream = token::tokenize(text)?;
	let mut fixer = Fixer::new();
	let findings = dispatch::run(&stream, rules, &mut fixer);

	Ok(Analysis { stream, findings, fixer })
}

fn check_file(path: &Path, text: &str, rules: &[Box<dyn Rule>]) -> FileReport {
	let outcome = analyze(text, rules).map(|analysis| analysis.findings);

	match &outcome {
		Ok(findings) => {
			tracing::debug!(path = %path.display(), findings = findings.len(), "checked file")
		},
		Err(err) => tracing::warn!(
			path = %path.display(),
			offset = err.offset,
			"cannot tokenize file: {err}"
		),
	}

	FileReport { path: path.to_path_buf(), outcome }
}

/// Returns the fixed text with the applied and still-skipped fix counts.
///
/// Fixes skipped for a conflict get another chance on the next pass. Under `strict`, a
/// conflict leaves the whole file untouched instead. A file whose fixed text no longer
/// tokenizes keeps its original text.
fn apply_fix_passes(
	path: &Path,
	initial_text: &str,
	rules: &[Box<dyn Rule>],
	strict: bool,
) -> Result<(String, usize, usize)> {
	let mut text = initial_text.to_owned();
	let mut applied_count = 0_usize;
	let mut skipped_count = 0_usize;

	for pass in 1..=MAX_FIX_PASSES {
		let analysis = match analyze(&text, rules) {
			Ok(analysis) => analysis,
			Err(err) => {
				if pass > 1 {
					tracing::warn!(path = %path.display(), pass, "discarding fixes: {err}");
				}

				return Ok((initial_text.to_owned(), 0, 0));
			},
		};

		if analysis.fixer.is_empty() {
			skipped_count = 0;

			break;
		}

		tracing::trace!(
			path = %path.display(),
			pass,
			fixes = ?analysis.fixer.fixes(),
			"queued fixes"
		);

		let queued = analysis.fixer.into_fixes();
		let FixReport { text: fixed, applied, skipped } = if strict {
			let applied = queued.clone();

			match fixes::apply_fixes(&text, &analysis.stream, queued) {
				Ok(fixed) => FixReport { text: fixed, applied, skipped: Vec::new() },
				Err(FixError::Conflict(conflict)) => {
					tracing::warn!(
						path = %path.display(),
						pass,
						"leaving file untouched: {conflict}"
					);

					return Ok((initial_text.to_owned(), 0, conflict.skipped.len()));
				},
				Err(err) => return Err(err.into()),
			}
		} else {
			fixes::apply_fixes_lenient(&text, &analysis.stream, queued)?
		};

		skipped_count = skipped.len();

		if applied.is_empty() {
			break;
		}

		tracing::debug!(
			path = %path.display(),
			pass,
			applied = applied.len(),
			skipped = skipped_count,
			"applied fix pass"
		);

		applied_count += applied.len();
		text = fixed;
	}

	Ok((text, applied_count, skipped_count))
}

fn summarize(
	file_count: usize,
	mut reports: Vec<FileReport>,
	format: ReportFormat,
) -> Result<RunSummary> {
	reports.sort_by(|a, b| a.path.cmp(&b.path));

	let mut output_lines = Vec::new();
	let mut violation_count = 0_usize;
	let mut unfixable_count = 0_usize;
	let mut error_count = 0_usize;

	for file_report in &reports {
		match &file_report.outcome {
			Ok(findings) =>
				for finding in findings {
					violation_count += 1;

					if !finding.fixable {
						unfixable_count += 1;
					}

					output_lines.push(report::render_finding(&file_report.path, finding, format)?);
				},
			Err(err) => {
				error_count += 1;

				output_lines.push(report::render_lex_error(&file_report.path, err, format)?);
			},
		}
	}

	Ok(RunSummary {
		file_count,
		violation_count,
		unfixable_count,
		error_count,
		applied_fix_count: 0,
		skipped_fix_count: 0,
		output_lines,
	})
}

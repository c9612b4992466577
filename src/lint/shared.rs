use std::{
	fs,
	path::{Path, PathBuf},
	process::Command,
};

use super::{report::ReportFormat, rule::Finding, token::LexError};
use crate::prelude::*;

pub(crate) const DEFAULT_EXTENSION: &str = "php";

#[derive(Debug, Clone)]
pub(crate) struct LintOptions {
	pub(crate) extensions: Vec<String>,
	pub(crate) rules: Vec<String>,
	pub(crate) format: ReportFormat,
	/// Leave a file untouched when any of its fixes conflict.
	pub(crate) strict_fixes: bool,
}
impl Default for LintOptions {
	fn default() -> Self {
		Self {
			extensions: vec![DEFAULT_EXTENSION.to_owned()],
			rules: Vec::new(),
			format: ReportFormat::default(),
			strict_fixes: false,
		}
	}
}

#[derive(Debug, Clone)]
pub(crate) struct RunSummary {
	pub(crate) file_count: usize,
	pub(crate) violation_count: usize,
	pub(crate) unfixable_count: usize,
	pub(crate) error_count: usize,
	pub(crate) applied_fix_count: usize,
	pub(crate) skipped_fix_count: usize,
	pub(crate) output_lines: Vec<String>,
}

/// Outcome of checking one file: either its findings or the lex error that stopped it.
#[derive(Debug, Clone)]
pub(crate) struct FileReport {
	pub(crate) path: PathBuf,
	pub(crate) outcome: Result<Vec<Finding>, LexError>,
}

pub(crate) fn resolve_files(
	requested_files: &[PathBuf],
	extensions: &[String],
) -> Result<Vec<PathBuf>> {
	if !requested_files.is_empty() {
		let mut files = Vec::new();

		for file in requested_files {
			if has_extension(file, extensions) {
				files.push(file.clone());
			}
		}

		return Ok(files);
	}

	git_ls_files(extensions)
}

/// Reads a source file, skipping unreadable, non-UTF-8, and empty files.
pub(crate) fn read_source(path: &Path) -> Option<String> {
	let text = match fs::read_to_string(path) {
		Ok(text) => text,
		Err(err) => {
			tracing::debug!(path = %path.display(), "skipping unreadable file: {err}");

			return None;
		},
	};

	if text.is_empty() { None } else { Some(text) }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| extensions.iter().any(|wanted| wanted.trim_start_matches('.') == ext))
}

fn git_ls_files(extensions: &[String]) -> Result<Vec<PathBuf>> {
	let patterns = extensions
		.iter()
		.map(|ext| format!("*.{}", ext.trim_start_matches('.')))
		.collect::<Vec<_>>();
	let output = Command::new("git")
		.arg("ls-files")
		.arg("--")
		.args(&patterns)
		.output()
		.map_err(|err| eyre::eyre!("Failed to run git ls-files: {err}."))?;

	if !output.status.success() {
		return Err(eyre::eyre!("git ls-files failed with status {}.", output.status));
	}

	let stdout = String::from_utf8(output.stdout)?;
	let mut files = Vec::new();

	for line in stdout.lines() {
		if !line.is_empty() {
			files.push(PathBuf::from(line));
		}
	}

	Ok(files)
}

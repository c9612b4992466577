//! Renders findings as text lines or JSON lines.

use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use super::{rule::Finding, token::LexError};
use crate::prelude::*;

pub(crate) const LEX_ERROR_ID: &str = "LexError";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReportFormat {
	#[default]
	Text,
	Json,
}

#[derive(Debug, Serialize)]
struct Record<'a> {
	file: String,
	line: usize,
	column: usize,
	rule: &'a str,
	message: &'a str,
	fixable: bool,
}
impl Record<'_> {
	fn render(&self, format: ReportFormat) -> Result<String> {
		match format {
			ReportFormat::Text => Ok(format!(
				"{}:{}:{}: [{}] {}{}",
				self.file,
				self.line,
				self.column,
				self.rule,
				self.message,
				if self.fixable { " (fixable)" } else { "" }
			)),
			ReportFormat::Json => Ok(serde_json::to_string(self)?),
		}
	}
}

pub(crate) fn render_finding(
	path: &Path,
	finding: &Finding,
	format: ReportFormat,
) -> Result<String> {
	Record {
		file: path.display().to_string(),
		line: finding.line,
		column: finding.column,
		rule: finding.rule,
		message: &finding.message,
		fixable: finding.fixable,
	}
	.render(format)
}

pub(crate) fn render_lex_error(
	path: &Path,
	err: &LexError,
	format: ReportFormat,
) -> Result<String> {
	let message = err.kind.to_string();

	Record {
		file: path.display().to_string(),
		line: err.line,
		column: err.column,
		rule: LEX_ERROR_ID,
		message: &message,
		fixable: false,
	}
	.render(format)
}

use std::ops::Range;

use super::token::{OutOfRange, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FixOperation {
	InsertBefore,
	InsertAfter,
	Replace,
	Delete,
}
impl FixOperation {
	fn priority(self) -> u8 {
		match self {
			Self::InsertBefore => 0,
			Self::Replace | Self::Delete => 1,
			Self::InsertAfter => 2,
		}
	}
}

/// A textual edit anchored on one token of the stream it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fix {
	pub(crate) rule: &'static str,
	pub(crate) anchor: usize,
	pub(crate) operation: FixOperation,
	pub(crate) text: String,
}
impl Fix {
	pub(crate) fn insert_before(
		rule: &'static str,
		anchor: usize,
		text: impl Into<String>,
	) -> Self {
		Self { rule, anchor, operation: FixOperation::InsertBefore, text: text.into() }
	}

	pub(crate) fn insert_after(
		rule: &'static str,
		anchor: usize,
		text: impl Into<String>,
	) -> Self {
		Self { rule, anchor, operation: FixOperation::InsertAfter, text: text.into() }
	}

	pub(crate) fn replace(rule: &'static str, anchor: usize, text: impl Into<String>) -> Self {
		Self { rule, anchor, operation: FixOperation::Replace, text: text.into() }
	}

	pub(crate) fn delete(rule: &'static str, anchor: usize) -> Self {
		Self { rule, anchor, operation: FixOperation::Delete, text: String::new() }
	}

	fn byte_range(&self, stream: &TokenStream) -> Result<Range<usize>, OutOfRange> {
		let token = stream.at(self.anchor)?;

		Ok(match self.operation {
			FixOperation::InsertBefore => token.offset..token.offset,
			FixOperation::InsertAfter => token.end()..token.end(),
			FixOperation::Replace | FixOperation::Delete => token.offset..token.end(),
		})
	}

	fn replacement(&self) -> &str {
		match self.operation {
			FixOperation::Delete => "",
			_ => &self.text,
		}
	}
}

/// Append-only queue of fixes proposed while rules run.
#[derive(Debug, Default)]
pub(crate) struct Fixer {
	fixes: Vec<Fix>,
}
impl Fixer {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn push(&mut self, fix: Fix) {
		self.fixes.push(fix);
	}

	pub(crate) fn len(&self) -> usize {
		self.fixes.len()
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.fixes.is_empty()
	}

	pub(crate) fn fixes(&self) -> &[Fix] {
		&self.fixes
	}

	pub(crate) fn into_fixes(self) -> Vec<Fix> {
		self.fixes
	}

	/// Drops every fix queued after the first `len`.
	pub(crate) fn discard_from(&mut self, len: usize) {
		self.fixes.truncate(len);
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} fix(es) conflict with earlier edits", skipped.len())]
pub(crate) struct FixConflict {
	pub(crate) skipped: Vec<Fix>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum FixError {
	#[error(transparent)]
	Conflict(#[from] FixConflict),
	#[error("fix anchor is invalid: {0}")]
	Anchor(#[from] OutOfRange),
	#[error("fix range {start}..{end} does not fit source text of length {len}")]
	StaleStream { start: usize, end: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FixReport {
	pub(crate) text: String,
	pub(crate) applied: Vec<Fix>,
	pub(crate) skipped: Vec<Fix>,
}

/// Applies every fix or none: any conflict fails with [`FixConflict`].
pub(crate) fn apply_fixes(
	source: &str,
	stream: &TokenStream,
	fixes: Vec<Fix>,
) -> Result<String, FixError> {
	let report = apply_fixes_lenient(source, stream, fixes)?;

	if !report.skipped.is_empty() {
		return Err(FixConflict { skipped: report.skipped }.into());
	}

	Ok(report.text)
}

/// Applies the first fix of each conflicting cluster and reports the rest as skipped.
pub(crate) fn apply_fixes_lenient(
	source: &str,
	stream: &TokenStream,
	mut fixes: Vec<Fix>,
) -> Result<FixReport, FixError> {
	// Stable, so fixes on the same anchor and priority keep their queue order.
	fixes.sort_by_key(|fix| (fix.anchor, fix.operation.priority()));

	let mut accepted: Vec<(Range<usize>, Fix)> = Vec::new();
	let mut skipped = Vec::new();
	let mut last_end = 0_usize;
	let mut last_insert = None;

	for fix in fixes {
		let range = fix.byte_range(stream)?;

		if range.end > source.len()
			|| !source.is_char_boundary(range.start)
			|| !source.is_char_boundary(range.end)
		{
			return Err(FixError::StaleStream {
				start: range.start,
				end: range.end,
				len: source.len(),
			});
		}

		let is_insert = range.is_empty();

		if range.start < last_end || (is_insert && last_insert == Some(range.start)) {
			tracing::debug!(rule = fix.rule, anchor = fix.anchor, "skipping conflicting fix");

			skipped.push(fix);

			continue;
		}
		if is_insert {
			last_insert = Some(range.start);
		}

		last_end = last_end.max(range.end);

		accepted.push((range, fix));
	}

	let mut text = source.to_owned();

	for (range, fix) in accepted.iter().rev() {
		text.replace_range(range.clone(), fix.replacement());
	}

	Ok(FixReport { text, applied: accepted.into_iter().map(|(_, fix)| fix).collect(), skipped })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lint::token::{TokenKind, tokenize};

	const RULE: &str = "Test";

	#[test]
	fn applies_edits_and_keeps_other_text_intact() {
		let source = "a = 1;\nb = 2;";
		let stream = tokenize(source).expect("tokenize");
		let number = stream.positions_of(TokenKind::Number)[1];
		let fixes = vec![
			Fix::replace(RULE, number, "20"),
			Fix::insert_before(RULE, 0, "// lead\n"),
			Fix::insert_after(RULE, stream.len() - 1, "\n"),
		];

		assert_eq!(
			apply_fixes(source, &stream, fixes).expect("apply"),
			"// lead\na = 1;\nb = 20;\n"
		);
	}

	#[test]
	fn same_anchor_edits_follow_operation_priority() {
		let source = "x;";
		let stream = tokenize(source).expect("tokenize");
		let fixes = vec![
			Fix::insert_after(RULE, 0, "]"),
			Fix::replace(RULE, 0, "y"),
			Fix::insert_before(RULE, 0, "["),
		];
		let report = apply_fixes_lenient(source, &stream, fixes).expect("apply");

		assert_eq!(report.text, "[y];");
		assert!(report.skipped.is_empty());
		assert_eq!(
			report.applied.iter().map(|fix| fix.operation).collect::<Vec<_>>(),
			vec![FixOperation::InsertBefore, FixOperation::Replace, FixOperation::InsertAfter]
		);
	}

	#[test]
	fn second_insertion_at_same_position_is_skipped() {
		let source = "a;b;";
		let stream = tokenize(source).expect("tokenize");
		let fixes = vec![
			Fix::insert_before(RULE, 2, "\n"),
			Fix::insert_after(RULE, 1, " "),
			Fix::insert_before(RULE, 2, "\n\n"),
		];
		let report = apply_fixes_lenient(source, &stream, fixes).expect("apply");

		assert_eq!(report.text, "a; b;");
		assert_eq!(report.applied, vec![Fix::insert_after(RULE, 1, " ")]);
		assert_eq!(
			report.skipped,
			vec![Fix::insert_before(RULE, 2, "\n"), Fix::insert_before(RULE, 2, "\n\n")]
		);
	}

	#[test]
	fn overlapping_replacements_keep_the_first() {
		let source = "a;";
		let stream = tokenize(source).expect("tokenize");
		let fixes = vec![Fix::replace(RULE, 0, "b"), Fix::delete(RULE, 0)];
		let report = apply_fixes_lenient(source, &stream, fixes).expect("apply");

		assert_eq!(report.text, "b;");
		assert_eq!(report.skipped, vec![Fix::delete(RULE, 0)]);
	}

	#[test]
	fn strict_policy_reports_conflict() {
		let source = "a;";
		let stream = tokenize(source).expect("tokenize");
		let fixes = vec![Fix::delete(RULE, 1), Fix::replace(RULE, 1, ",")];
		let err = apply_fixes(source, &stream, fixes).expect_err("conflict");

		assert_eq!(
			err,
			FixError::Conflict(FixConflict { skipped: vec![Fix::replace(RULE, 1, ",")] })
		);
		assert_eq!(err.to_string(), "1 fix(es) conflict with earlier edits");
	}

	#[test]
	fn delete_ignores_text_and_adjacent_edits_coexist() {
		let source = "a  ;";
		let stream = tokenize(source).expect("tokenize");
		let fixes = vec![Fix::delete(RULE, 1), Fix::insert_before(RULE, 2, " ")];

		assert_eq!(apply_fixes(source, &stream, fixes).expect("apply"), "a ;");
	}

	#[test]
	fn rejects_invalid_anchor_and_stale_stream() {
		let stream = tokenize("abc;").expect("tokenize");

		assert_eq!(
			apply_fixes("abc;", &stream, vec![Fix::delete(RULE, 9)]),
			Err(FixError::Anchor(OutOfRange { index: 9, len: 2 }))
		);
		assert!(matches!(
			apply_fixes("a", &stream, vec![Fix::delete(RULE, 1)]),
			Err(FixError::StaleStream { .. })
		));
	}

	#[test]
	fn no_fixes_returns_source_unchanged() {
		let source = "x = 'é';\n";
		let stream = tokenize(source).expect("tokenize");
		let mut fixer = Fixer::new();

		assert!(fixer.is_empty());

		fixer.push(Fix::delete(RULE, 0));
		fixer.discard_from(0);

		assert!(fixer.fixes().is_empty());
		assert_eq!(apply_fixes(source, &stream, fixer.into_fixes()).expect("apply"), source);
	}
}

//! Backward lookups over a token stream.

use super::token::{OutOfRange, TokenKind, TokenStream};

/// Scans strictly backward from `from - 1`.
///
/// With `skip_whitespace`, whitespace tokens never match. With a `kind`, only tokens of that
/// kind match; without one, the first remaining token does.
pub(crate) fn find_previous(
	stream: &TokenStream,
	from: usize,
	kind: Option<TokenKind>,
	skip_whitespace: bool,
) -> Result<Option<usize>, OutOfRange> {
	check_from(stream, from)?;

	for token in stream.tokens()[..from].iter().rev() {
		if skip_whitespace && token.kind == TokenKind::Whitespace {
			continue;
		}
		if kind.is_some_and(|kind| token.kind != kind) {
			continue;
		}

		return Ok(Some(token.index));
	}

	Ok(None)
}

/// Nearest token of exactly `kind` strictly before `from`.
pub(crate) fn find_previous_of_kind(
	stream: &TokenStream,
	from: usize,
	kind: TokenKind,
) -> Result<Option<usize>, OutOfRange> {
	check_from(stream, from)?;

	let positions = stream.positions_of(kind);
	let before = positions.partition_point(|&index| index < from);

	Ok(before.checked_sub(1).map(|slot| positions[slot]))
}

/// Index of the first token on the line holding `index`.
///
/// A multi-line token (block comment, string) ending on that line counts as the line
/// break, so the result is the token right after it.
pub(crate) fn line_start(stream: &TokenStream, index: usize) -> Result<usize, OutOfRange> {
	stream.at(index)?;

	let tokens = stream.tokens();
	let mut start = index;

	while start > 0 && !tokens[start - 1].text.contains('\n') {
		start -= 1;
	}

	Ok(start)
}

/// Leading whitespace of the line holding `index`, without the line break.
pub(crate) fn line_indent(stream: &TokenStream, index: usize) -> Result<&str, OutOfRange> {
	let start = line_start(stream, index)?;
	let tokens = stream.tokens();
	let begins_line = start == 0 || tokens[start - 1].text.ends_with('\n');
	let first = &tokens[start];

	if begins_line && first.kind == TokenKind::Whitespace {
		Ok(first.text.trim_end_matches(['\r', '\n']))
	} else {
		Ok("")
	}
}

/// Line break used near `index`: the nearest one before it, else the first one after it.
pub(crate) fn line_ending(stream: &TokenStream, index: usize) -> Result<&'static str, OutOfRange> {
	stream.at(index)?;

	let tokens = stream.tokens();
	let nearest = tokens[..index]
		.iter()
		.rev()
		.chain(&tokens[index..])
		.find_map(|token| token.text.find('\n').map(|at| &token.text[..at]));

	Ok(if nearest.is_some_and(|before| before.ends_with('\r')) { "\r\n" } else { "\n" })
}

fn check_from(stream: &TokenStream, from: usize) -> Result<(), OutOfRange> {
	if from > stream.len() {
		return Err(OutOfRange { index: from, len: stream.len() });
	}

	Ok(())
}

//! Requires a blank line before `return` and `continue` that follow a statement in the same
//! block.

use super::{
	cursor,
	fixes::{Fix, Fixer},
	rule::{Finding, Rule},
	token::{OutOfRange, TokenKind, TokenStream},
};
use crate::prelude::*;

pub(crate) const RULE_ID: &str = "BlankLineBeforeJump";

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BlankLineBeforeJump;
impl Rule for BlankLineBeforeJump {
	fn id(&self) -> &'static str {
		RULE_ID
	}

	fn interested_kinds(&self) -> &'static [TokenKind] {
		&[TokenKind::Return, TokenKind::Continue]
	}

	fn evaluate(
		&self,
		stream: &TokenStream,
		index: usize,
		fixer: &mut Fixer,
	) -> Result<Option<Finding>> {
		let jump = stream.at(index)?;
		let Some(brace_index) = jump.innermost_scope() else {
			return Ok(None);
		};
		let brace = stream.at(brace_index)?;

		if jump.line == brace.line + 1 || follows_closed_block(stream, index)? {
			return Ok(None);
		}

		let Some(terminator_index) = statement_terminator_before(stream, index)? else {
			return Ok(None);
		};

		if terminator_index < brace_index {
			return Ok(None);
		}

		let terminator = stream.at(terminator_index)?;
		let gap = jump.line - terminator.line;

		if gap >= 2 {
			return Ok(None);
		}

		fixer.push(blank_line_fix(stream, index, gap)?);

		Ok(Some(Finding::new(
			RULE_ID,
			jump,
			format!("There must be a blank line before {} statement", jump.text),
			true,
		)))
	}
}

// A jump right after `}` (comments aside) follows a block, not a statement.
fn follows_closed_block(stream: &TokenStream, index: usize) -> Result<bool, OutOfRange> {
	let mut from = index;

	while let Some(prev) = cursor::find_previous(stream, from, None, true)? {
		let token = stream.at(prev)?;

		if token.kind != TokenKind::Comment {
			return Ok(token.kind == TokenKind::CloseBrace);
		}

		from = prev;
	}

	Ok(false)
}

// Semicolons nested deeper than the jump, in parentheses (`for (;;)` headers) or in an inner
// block, do not end the statement before it.
fn statement_terminator_before(
	stream: &TokenStream,
	index: usize,
) -> Result<Option<usize>, OutOfRange> {
	let jump = stream.at(index)?;
	let mut from = index;

	while let Some(found) = cursor::find_previous_of_kind(stream, from, TokenKind::Semicolon)? {
		let terminator = stream.at(found)?;

		if terminator.paren_depth <= jump.paren_depth
			&& terminator.scope_depth <= jump.scope_depth
		{
			return Ok(Some(found));
		}

		from = found;
	}

	Ok(None)
}

fn blank_line_fix(stream: &TokenStream, index: usize, gap: usize) -> Result<Fix, OutOfRange> {
	let eol = cursor::line_ending(stream, index)?;

	if gap == 1 {
		return Ok(Fix::insert_before(RULE_ID, cursor::line_start(stream, index)?, eol));
	}

	// The terminator shares the jump's line: move the jump down two lines, keeping indentation.
	let text = format!("{eol}{eol}{}", cursor::line_indent(stream, index)?);

	match cursor::find_previous(stream, index, None, false)? {
		Some(prev) if stream.at(prev)?.kind == TokenKind::Whitespace =>
			Ok(Fix::replace(RULE_ID, prev, text)),
		_ => Ok(Fix::insert_before(RULE_ID, index, text)),
	}
}

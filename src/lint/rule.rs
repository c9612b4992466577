use std::collections::HashSet;

use super::{
	fixes::Fixer,
	jump_spacing::{self, BlankLineBeforeJump},
	token::{Token, TokenKind, TokenStream},
};
use crate::prelude::*;

pub(crate) const RULE_IDS: [&str; 1] = [jump_spacing::RULE_ID];

/// One reported violation. Built by a rule for the token it was evaluated at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Finding {
	pub(crate) rule: &'static str,
	pub(crate) token_index: usize,
	pub(crate) line: usize,
	pub(crate) column: usize,
	pub(crate) message: String,
	pub(crate) fixable: bool,
}
impl Finding {
	pub(crate) fn new(
		rule: &'static str,
		token: &Token,
		message: impl Into<String>,
		fixable: bool,
	) -> Self {
		Self {
			rule,
			token_index: token.index,
			line: token.line,
			column: token.column,
			message: message.into(),
			fixable,
		}
	}
}

/// A check that runs at every token whose kind it declared interest in.
///
/// Rules hold no per-file state, so one registry serves every file of a run, across
/// threads. A rule proposes its correction by queueing a fix on the [`Fixer`].
pub(crate) trait Rule: Send + Sync {
	fn id(&self) -> &'static str;

	fn interested_kinds(&self) -> &'static [TokenKind];

	fn evaluate(
		&self,
		stream: &TokenStream,
		index: usize,
		fixer: &mut Fixer,
	) -> Result<Option<Finding>>;
}

pub(crate) fn all_rules() -> Vec<Box<dyn Rule>> {
	vec![Box::new(BlankLineBeforeJump)]
}

/// Keeps the requested rules in registration order. An empty request selects every rule.
pub(crate) fn select_rules(requested: &[String]) -> Result<Vec<Box<dyn Rule>>> {
	if requested.is_empty() {
		return Ok(all_rules());
	}

	let known = RULE_IDS.iter().copied().collect::<HashSet<_>>();
	let mut unknown = requested
		.iter()
		.filter(|id| !known.contains(id.as_str()))
		.map(String::as_str)
		.collect::<Vec<_>>();

	if !unknown.is_empty() {
		unknown.sort_unstable();
		unknown.dedup();

		return Err(eyre::eyre!("Unknown rule id(s): {}.", unknown.join(", ")));
	}

	Ok(all_rules().into_iter().filter(|rule| requested.iter().any(|id| id == rule.id())).collect())
}

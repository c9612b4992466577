use std::{
	any::Any,
	collections::HashMap,
	panic::{self, AssertUnwindSafe},
};

use super::{
	fixes::Fixer,
	rule::{Finding, Rule},
	token::{TokenKind, TokenStream},
};

pub(crate) const RULE_ERROR_ID: &str = "RuleError";

/// Routes each token to the rules interested in its kind.
pub(crate) struct Dispatcher<'r> {
	rules: &'r [Box<dyn Rule>],
	by_kind: HashMap<TokenKind, Vec<usize>>,
}
impl<'r> Dispatcher<'r> {
	pub(crate) fn new(rules: &'r [Box<dyn Rule>]) -> Self {
		let mut by_kind: HashMap<TokenKind, Vec<usize>> = HashMap::new();

		for (slot, rule) in rules.iter().enumerate() {
			for kind in rule.interested_kinds() {
				let slots = by_kind.entry(*kind).or_default();

				if !slots.contains(&slot) {
					slots.push(slot);
				}
			}
		}

		Self { rules, by_kind }
	}

	/// Findings come back ordered by token index, then by rule registration order.
	///
	/// A rule that fails or panics at a token yields a `RuleError` finding there; fixes it
	/// queued during that call are dropped and dispatch moves on.
	pub(crate) fn run(&self, stream: &TokenStream, fixer: &mut Fixer) -> Vec<Finding> {
		let mut findings = Vec::new();

		if stream.is_empty() || self.by_kind.is_empty() {
			return findings;
		}

		for token in stream.tokens() {
			let Some(slots) = self.by_kind.get(&token.kind) else {
				continue;
			};

			for &slot in slots {
				let rule = &self.rules[slot];
				let queued = fixer.len();

				tracing::trace!(
					rule = rule.id(),
					index = token.index,
					depth = token.scope_depth,
					"evaluating rule"
				);

				let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
					rule.evaluate(stream, token.index, fixer)
				}));
				let failure = match outcome {
					Ok(Ok(Some(finding))) => {
						debug_assert_eq!(finding.token_index, token.index);

						findings.push(finding);

						continue;
					},
					Ok(Ok(None)) => continue,
					Ok(Err(err)) => format!("Rule {} failed: {err}", rule.id()),
					Err(payload) => {
						format!("Rule {} panicked: {}", rule.id(), panic_message(&*payload))
					},
				};

				tracing::warn!(rule = rule.id(), index = token.index, "{failure}");

				fixer.discard_from(queued);
				findings.push(Finding::new(RULE_ERROR_ID, token, failure, false));
			}
		}

		findings
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	payload
		.downcast_ref::<&str>()
		.copied()
		.or_else(|| payload.downcast_ref::<String>().map(String::as_str))
		.unwrap_or("unknown panic")
}

pub(crate) fn run(
	stream: &TokenStream,
	rules: &[Box<dyn Rule>],
	fixer: &mut Fixer,
) -> Vec<Finding> {
	Dispatcher::new(rules).run(stream, fixer)
}

//! Lexical tokens and the indexed token stream the rules run over.
//!
//! The scanner understands the lexical surface shared by brace-delimited languages:
//! whitespace, comments, string literals, identifiers, numbers, and punctuation. Braces
//! carry block membership so rules can ask which scope a token lives in.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

const OPERATOR_CHARS: &str = "+-*/%=<>!&|^~?:.@\\#";
const BYTE_ORDER_MARK: char = '\u{feff}';

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(
		r"^(?:0[xX][0-9a-fA-F_]+|0[bB][01_]+|[0-9][0-9_]*(?:\.[0-9][0-9_]*)?(?:[eE][+-]?[0-9]+)?)",
	)
	.expect("Number literal pattern is valid.")
});
// Heredoc (`<<<ID`, `<<<"ID"`) and nowdoc (`<<<'ID'`) headers end at their line break.
static HEREDOC_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r#"^<<<[ \t]*(?:'([A-Za-z_][A-Za-z0-9_]*)'|"?([A-Za-z_][A-Za-z0-9_]*)"?)\r?\n"#)
		.expect("Heredoc header pattern is valid.")
});
static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> =
	Lazy::new(|| HashMap::from([("return", TokenKind::Return), ("continue", TokenKind::Continue)]));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TokenKind {
	Whitespace,
	Comment,
	Identifier,
	Number,
	String,
	Return,
	Continue,
	OpenBrace,
	CloseBrace,
	OpenParen,
	CloseParen,
	OpenBracket,
	CloseBracket,
	Semicolon,
	Comma,
	Operator,
}

/// One lexical unit. Tokens never change once the stream is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
	pub(crate) index: usize,
	pub(crate) kind: TokenKind,
	pub(crate) text: String,
	/// 1-based line of the first character.
	pub(crate) line: usize,
	/// 1-based column of the first character, counted in chars.
	pub(crate) column: usize,
	/// Byte offset into the source text.
	pub(crate) offset: usize,
	pub(crate) scope_depth: usize,
	/// Indices of the enclosing `{` tokens, outermost first.
	pub(crate) scopes: Vec<usize>,
	pub(crate) paren_depth: usize,
}
impl Token {
	pub(crate) fn end(&self) -> usize {
		self.offset + self.text.len()
	}

	pub(crate) fn innermost_scope(&self) -> Option<usize> {
		self.scopes.last().copied()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {line}:{column}")]
pub(crate) struct LexError {
	pub(crate) kind: LexErrorKind,
	pub(crate) line: usize,
	pub(crate) column: usize,
	pub(crate) offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum LexErrorKind {
	#[error("unterminated string literal")]
	UnterminatedString,
	#[error("unterminated block comment")]
	UnterminatedComment,
	#[error("invalid character {0:?}")]
	InvalidCharacter(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("token index {index} is out of range for a stream of {len} token(s)")]
pub(crate) struct OutOfRange {
	pub(crate) index: usize,
	pub(crate) len: usize,
}

#[derive(Debug, Default)]
pub(crate) struct TokenStream {
	tokens: Vec<Token>,
	by_kind: HashMap<TokenKind, Vec<usize>>,
}
impl TokenStream {
	pub(crate) fn len(&self) -> usize {
		self.tokens.len()
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	pub(crate) fn at(&self, index: usize) -> Result<&Token, OutOfRange> {
		self.tokens.get(index).ok_or(OutOfRange { index, len: self.tokens.len() })
	}

	pub(crate) fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	/// Ascending indices of every token of `kind`.
	pub(crate) fn positions_of(&self, kind: TokenKind) -> &[usize] {
		self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or_default()
	}

	fn from_tokens(tokens: Vec<Token>) -> Self {
		let mut by_kind: HashMap<TokenKind, Vec<usize>> = HashMap::new();

		for token in &tokens {
			by_kind.entry(token.kind).or_default().push(token.index);
		}

		Self { tokens, by_kind }
	}
}

#[derive(Clone, Copy, Debug)]
struct Mark {
	offset: usize,
	line: usize,
	column: usize,
}

struct Lexer<'a> {
	source: &'a str,
	offset: usize,
	line: usize,
	column: usize,
	tokens: Vec<Token>,
	scopes: Vec<usize>,
	paren_depth: usize,
}
impl<'a> Lexer<'a> {
	fn new(source: &'a str) -> Self {
		Self {
			source,
			offset: 0,
			line: 1,
			column: 1,
			tokens: Vec::new(),
			scopes: Vec::new(),
			paren_depth: 0,
		}
	}

	fn mark(&self) -> Mark {
		Mark { offset: self.offset, line: self.line, column: self.column }
	}

	fn rest(&self) -> &'a str {
		&self.source[self.offset..]
	}

	fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn peek_second(&self) -> Option<char> {
		self.rest().chars().nth(1)
	}

	fn bump(&mut self) -> Option<char> {
		let ch = self.peek()?;

		self.offset += ch.len_utf8();

		if ch == '\n' {
			self.line += 1;
			self.column = 1;
		} else {
			self.column += 1;
		}

		Some(ch)
	}

	fn bump_while(&mut self, mut keep: impl FnMut(char) -> bool) {
		while self.peek().is_some_and(&mut keep) {
			self.bump();
		}
	}

	fn error(&self, kind: LexErrorKind, at: Mark) -> LexError {
		LexError { kind, line: at.line, column: at.column, offset: at.offset }
	}

	fn scan(&mut self, ch: char, start: Mark) -> Result<TokenKind, LexError> {
		if ch.is_whitespace() || ch == BYTE_ORDER_MARK {
			self.scan_whitespace();

			return Ok(TokenKind::Whitespace);
		}
		if (ch == '/' && self.peek_second() == Some('/'))
			|| (ch == '#' && self.peek_second() != Some('['))
		{
			self.bump_while(|c| c != '\n');

			return Ok(TokenKind::Comment);
		}
		if ch == '/' && self.peek_second() == Some('*') {
			return self.scan_block_comment(start);
		}
		if matches!(ch, '"' | '\'' | '`') {
			return self.scan_string(ch, start);
		}
		if ch == '<'
			&& let Some(header) = HEREDOC_RE.captures(self.rest())
			&& let Some(label) = header.get(1).or_else(|| header.get(2))
		{
			let header_len = header.get(0).map_or(0, |found| found.end());

			return self.scan_heredoc(label.as_str(), header_len, start);
		}
		if ch.is_ascii_digit() {
			let len = NUMBER_RE.find(self.rest()).map_or(1, |found| found.end());
			let end = self.offset + len;

			while self.offset < end {
				self.bump();
			}

			return Ok(TokenKind::Number);
		}
		if is_identifier_char(ch) {
			let begin = self.offset;

			self.bump_while(is_identifier_char);

			if self.follows_member_access() {
				return Ok(TokenKind::Identifier);
			}

			let word = self.source[begin..self.offset].to_ascii_lowercase();

			return Ok(KEYWORDS.get(word.as_str()).copied().unwrap_or(TokenKind::Identifier));
		}

		let kind = match ch {
			'{' => TokenKind::OpenBrace,
			'}' => TokenKind::CloseBrace,
			'(' => TokenKind::OpenParen,
			')' => TokenKind::CloseParen,
			'[' => TokenKind::OpenBracket,
			']' => TokenKind::CloseBracket,
			';' => TokenKind::Semicolon,
			',' => TokenKind::Comma,
			_ if OPERATOR_CHARS.contains(ch) => TokenKind::Operator,
			_ => return Err(self.error(LexErrorKind::InvalidCharacter(ch), start)),
		};

		self.bump();

		Ok(kind)
	}

	// A whitespace token ends right after a line break, so indentation stands alone.
	fn scan_whitespace(&mut self) {
		while let Some(ch) = self.peek() {
			if !(ch.is_whitespace() || ch == BYTE_ORDER_MARK) {
				break;
			}

			self.bump();

			if ch == '\n' {
				break;
			}
		}
	}

	fn scan_block_comment(&mut self, start: Mark) -> Result<TokenKind, LexError> {
		let Some(close) = self.rest()[2..].find("*/") else {
			return Err(self.error(LexErrorKind::UnterminatedComment, start));
		};
		let end = self.offset + 2 + close + 2;

		while self.offset < end {
			self.bump();
		}

		Ok(TokenKind::Comment)
	}

	fn scan_string(&mut self, quote: char, start: Mark) -> Result<TokenKind, LexError> {
		self.bump();

		loop {
			match self.bump() {
				None => return Err(self.error(LexErrorKind::UnterminatedString, start)),
				Some('\\') => {
					self.bump();
				},
				Some(ch) if ch == quote => return Ok(TokenKind::String),
				Some(_) => {},
			}
		}
	}

	// The body runs up to the first line that starts, after indentation, with the label.
	fn scan_heredoc(
		&mut self,
		label: &str,
		header_len: usize,
		start: Mark,
	) -> Result<TokenKind, LexError> {
		let mut line_offset = self.offset + header_len;
		let mut end = None;

		for line in self.source[line_offset..].split_inclusive('\n') {
			let trimmed = line.trim_start_matches([' ', '\t']);

			if let Some(after) = trimmed.strip_prefix(label)
				&& !after.starts_with(is_identifier_char)
			{
				end = Some(line_offset + line.len() - trimmed.len() + label.len());

				break;
			}

			line_offset += line.len();
		}

		let Some(end) = end else {
			return Err(self.error(LexErrorKind::UnterminatedString, start));
		};

		while self.offset < end {
			self.bump();
		}

		Ok(TokenKind::String)
	}

	/// Whether the last significant tokens are `->` or `::`, making the next word a member name.
	fn follows_member_access(&self) -> bool {
		let Some(last) = self
			.tokens
			.iter()
			.rposition(|token| !matches!(token.kind, TokenKind::Whitespace | TokenKind::Comment))
		else {
			return false;
		};
		let Some(before) = last.checked_sub(1) else {
			return false;
		};

		matches!(
			(self.tokens[before].text.as_str(), self.tokens[last].text.as_str()),
			("-", ">") | (":", ":")
		)
	}

	fn push(&mut self, start: Mark, kind: TokenKind) {
		let index = self.tokens.len();

		match kind {
			TokenKind::CloseBrace => {
				self.scopes.pop();
			},
			TokenKind::CloseParen => self.paren_depth = self.paren_depth.saturating_sub(1),
			_ => {},
		}

		let scopes = self.scopes.clone();

		self.tokens.push(Token {
			index,
			kind,
			text: self.source[start.offset..self.offset].to_owned(),
			line: start.line,
			column: start.column,
			offset: start.offset,
			scope_depth: scopes.len(),
			scopes,
			paren_depth: self.paren_depth,
		});

		match kind {
			TokenKind::OpenBrace => self.scopes.push(index),
			TokenKind::OpenParen => self.paren_depth += 1,
			_ => {},
		}
	}
}

pub(crate) fn tokenize(source: &str) -> Result<TokenStream, LexError> {
	let mut lexer = Lexer::new(source);

	while let Some(ch) = lexer.peek() {
		let start = lexer.mark();
		let kind = lexer.scan(ch, start)?;

		lexer.push(start, kind);
	}

	tracing::trace!(tokens = lexer.tokens.len(), "tokenized source");

	Ok(TokenStream::from_tokens(lexer.tokens))
}

fn is_identifier_char(ch: char) -> bool {
	ch.is_alphanumeric() || ch == '_' || ch == '$'
}

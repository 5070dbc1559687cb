//! A character cursor shared between the delimiter scanner and the expression grammar.

use crate::error::{Error, MissingClosingDelimiter, SyntaxError};

/// A cursor over a string, advancing one character at a time.
///
/// The delimiter scanner hands the same cursor to the grammar when an expression starts,
/// and continues scanning from wherever the grammar stopped.
/// Positions are byte offsets into the full input, so errors point into the original text.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
	source: &'a str,
	position: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at the start of `source`.
	pub fn new(source: &'a str) -> Self {
		Self { source, position: 0 }
	}

	/// Get the full source text.
	#[inline]
	pub fn source(&self) -> &'a str {
		self.source
	}

	/// Get the byte offset of the next character.
	#[inline]
	pub fn position(&self) -> usize {
		self.position
	}

	/// Move the cursor back to a position obtained earlier from [`Self::position()`].
	#[inline]
	pub fn reset(&mut self, position: usize) {
		debug_assert!(self.source.is_char_boundary(position));
		self.position = position;
	}

	/// Get the text that has not been consumed yet.
	#[inline]
	pub fn rest(&self) -> &'a str {
		&self.source[self.position..]
	}

	/// Check if the whole source has been consumed.
	#[inline]
	pub fn at_end(&self) -> bool {
		self.position >= self.source.len()
	}

	/// Look at the next character without consuming it.
	#[inline]
	pub fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	/// Look at the character after the next one without consuming anything.
	#[inline]
	pub fn peek_second(&self) -> Option<char> {
		self.rest().chars().nth(1)
	}

	/// Consume the next character.
	#[inline]
	pub fn next_char(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.position += c.len_utf8();
		Some(c)
	}

	/// Consume the next character if it is `expected`.
	pub fn eat(&mut self, expected: char) -> bool {
		if self.peek() == Some(expected) {
			self.position += expected.len_utf8();
			true
		} else {
			false
		}
	}

	/// Consume `expected` if the remaining text starts with it.
	pub fn eat_str(&mut self, expected: &str) -> bool {
		if self.rest().starts_with(expected) {
			self.position += expected.len();
			true
		} else {
			false
		}
	}

	/// Consume characters while `predicate` holds, and return them.
	pub fn take_while<F>(&mut self, predicate: F) -> &'a str
	where
		F: Fn(char) -> bool,
	{
		let start = self.position;
		while let Some(c) = self.peek() {
			if !predicate(c) {
				break;
			}
			self.position += c.len_utf8();
		}
		&self.source[start..self.position]
	}

	/// Skip over whitespace.
	pub fn skip_whitespace(&mut self) {
		self.take_while(char::is_whitespace);
	}

	/// Advance over `len` bytes.
	pub(crate) fn advance(&mut self, len: usize) {
		self.reset((self.position + len).min(self.source.len()));
	}

	/// Require the closing delimiter, one character at a time.
	///
	/// On a mismatch, the error points at the first character that does not match.
	pub fn expect_delimiter(&mut self, delimiter: &'static str) -> Result<(), Error> {
		for expected in delimiter.chars() {
			if !self.eat(expected) {
				log::debug!("expected closing delimiter {delimiter:?} at byte {}", self.position);
				return Err(MissingClosingDelimiter {
					position: self.position,
					delimiter,
				}
				.into());
			}
		}
		Ok(())
	}

	/// Create a syntax error at the current position.
	pub fn syntax_error(&self, message: impl Into<String>) -> Error {
		SyntaxError {
			position: self.position,
			message: message.into(),
		}
		.into()
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	#[test]
	fn test_peek_and_next() {
		let mut cursor = Cursor::new("a❤b");
		check!(cursor.peek() == Some('a'));
		check!(cursor.peek_second() == Some('❤'));
		check!(cursor.next_char() == Some('a'));
		check!(cursor.next_char() == Some('❤'));
		check!(cursor.position() == 4);
		check!(cursor.rest() == "b");
		check!(cursor.next_char() == Some('b'));
		check!(cursor.next_char() == None);
		check!(cursor.at_end());
	}

	#[test]
	fn test_take_while() {
		let mut cursor = Cursor::new("abc123 rest");
		check!(cursor.take_while(|c| c.is_ascii_alphabetic()) == "abc");
		check!(cursor.take_while(|c| c.is_ascii_digit()) == "123");
		cursor.skip_whitespace();
		check!(cursor.rest() == "rest");
	}

	#[test]
	fn test_expect_delimiter() {
		let mut cursor = Cursor::new("}}x");
		check!(let Ok(()) = cursor.expect_delimiter("}}"));
		check!(cursor.rest() == "x");

		let mut cursor = Cursor::new("}x");
		let_assert!(Err(Error::MissingClosingDelimiter(e)) = cursor.expect_delimiter("}}"));
		assert!(e.position == 1);
		assert!(e.delimiter == "}}");
	}
}

use std::borrow::Cow;

use rust_decimal::Decimal;

use crate::cursor::Cursor;
use crate::error::{Error, SyntaxError};

/// A token of the standard grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
	Int(i64),
	Float(f64),
	Decimal(Decimal),
	Str(String),
	Ident(String),

	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Bang,
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	And,
	Or,
	Pipe,
	Question,
	Colon,
	Comma,
	LParen,
	RParen,

	/// End of input, or a character that does not start a token.
	///
	/// The character is not consumed: it is up to the caller to decide what it means.
	/// For a delimited region, it usually is the closing delimiter.
	Stop,
}

/// Read the next token from the cursor, skipping leading whitespace.
///
/// Returns the token and the position where it starts.
pub fn next_token(cursor: &mut Cursor<'_>) -> Result<(Token, usize), Error> {
	cursor.skip_whitespace();
	let start = cursor.position();
	let Some(c) = cursor.peek() else {
		return Ok((Token::Stop, start));
	};

	let token = match c {
		'0'..='9' => read_number(cursor, false)?,
		'\'' | '"' => read_string(cursor)?,
		c if c.is_alphabetic() || c == '_' => {
			let ident = cursor.take_while(|c| c.is_alphanumeric() || c == '_' || c == '.');
			Token::Ident(ident.to_owned())
		},
		_ => {
			let token = match (c, cursor.peek_second()) {
				('=', Some('=')) => Some((Token::Eq, 2)),
				('!', Some('=')) => Some((Token::Ne, 2)),
				('<', Some('=')) => Some((Token::Le, 2)),
				('>', Some('=')) => Some((Token::Ge, 2)),
				('&', Some('&')) => Some((Token::And, 2)),
				('|', Some('|')) => Some((Token::Or, 2)),
				('+', _) => Some((Token::Plus, 1)),
				('-', _) => Some((Token::Minus, 1)),
				('*', _) => Some((Token::Star, 1)),
				('/', _) => Some((Token::Slash, 1)),
				('%', _) => Some((Token::Percent, 1)),
				('!', _) => Some((Token::Bang, 1)),
				('<', _) => Some((Token::Lt, 1)),
				('>', _) => Some((Token::Gt, 1)),
				('|', _) => Some((Token::Pipe, 1)),
				('?', _) => Some((Token::Question, 1)),
				(':', _) => Some((Token::Colon, 1)),
				(',', _) => Some((Token::Comma, 1)),
				('(', _) => Some((Token::LParen, 1)),
				(')', _) => Some((Token::RParen, 1)),
				_ => None,
			};
			match token {
				Some((token, len)) => {
					cursor.advance(len);
					token
				},
				None => Token::Stop,
			}
		},
	};
	Ok((token, start))
}

/// Read an integer, float or decimal literal.
///
/// With `negative` set the literal is read as if it had a leading minus sign,
/// so the most negative integer can be written as a literal.
/// Float literals that do not fit in an `f64` are rejected instead of becoming infinite.
pub fn read_number(cursor: &mut Cursor<'_>, negative: bool) -> Result<Token, Error> {
	let start = cursor.position();
	let mut is_float = false;
	cursor.take_while(|c| c.is_ascii_digit());
	if cursor.peek() == Some('.') && cursor.peek_second().is_some_and(|c| c.is_ascii_digit()) {
		is_float = true;
		cursor.next_char();
		cursor.take_while(|c| c.is_ascii_digit());
	}
	if matches!(cursor.peek(), Some('e' | 'E')) {
		let mark = cursor.position();
		cursor.next_char();
		if !cursor.eat('+') {
			cursor.eat('-');
		}
		if cursor.take_while(|c| c.is_ascii_digit()).is_empty() {
			cursor.reset(mark);
		} else {
			is_float = true;
		}
	}
	let digits = &cursor.source()[start..cursor.position()];
	let text: Cow<str> = if negative {
		format!("-{digits}").into()
	} else {
		digits.into()
	};

	if cursor.eat('m') || cursor.eat('M') {
		return text
			.parse::<Decimal>()
			.map(Token::Decimal)
			.map_err(|_| invalid_number(start, &text));
	}
	if is_float {
		match text.parse::<f64>() {
			Ok(value) if value.is_finite() => Ok(Token::Float(value)),
			_ => Err(invalid_number(start, &text)),
		}
	} else {
		text.parse().map(Token::Int).map_err(|_| invalid_number(start, &text))
	}
}

fn invalid_number(position: usize, text: &str) -> Error {
	SyntaxError {
		position,
		message: format!("invalid number literal: {text}"),
	}
	.into()
}

/// Read a single or double quoted string literal with backslash escapes.
fn read_string(cursor: &mut Cursor<'_>) -> Result<Token, Error> {
	let start = cursor.position();
	let Some(quote) = cursor.next_char() else {
		return Err(cursor.syntax_error("expected a string literal"));
	};
	let mut value = String::new();
	loop {
		match cursor.next_char() {
			None => {
				return Err(SyntaxError {
					position: start,
					message: "unterminated string literal".into(),
				}
				.into())
			},
			Some(c) if c == quote => break,
			Some('\\') => match cursor.next_char() {
				Some('n') => value.push('\n'),
				Some('r') => value.push('\r'),
				Some('t') => value.push('\t'),
				Some('0') => value.push('\0'),
				Some(c) => value.push(c),
				None => {
					return Err(SyntaxError {
						position: start,
						message: "unterminated string literal".into(),
					}
					.into())
				},
			},
			Some(c) => value.push(c),
		}
	}
	Ok(Token::Str(value))
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	fn tokens(source: &str) -> Vec<Token> {
		let mut cursor = Cursor::new(source);
		let mut tokens = Vec::new();
		loop {
			let_assert!(Ok((token, _)) = next_token(&mut cursor));
			if token == Token::Stop {
				return tokens;
			}
			tokens.push(token);
		}
	}

	#[test]
	fn test_numbers() {
		check!(tokens("42") == [Token::Int(42)]);
		check!(tokens("4.5") == [Token::Float(4.5)]);
		check!(tokens("1e3") == [Token::Float(1000.0)]);
		check!(tokens("1.25m") == [Token::Decimal(Decimal::new(125, 2))]);
		check!(tokens("1.x") == [Token::Int(1)]);
	}

	#[test]
	fn test_strings() {
		check!(tokens(r"'a\'b'") == [Token::Str("a'b".into())]);
		check!(tokens(r#""x\ny" '}'"#) == [Token::Str("x\ny".into()), Token::Str("}".into())]);

		let mut cursor = Cursor::new("  'open");
		let_assert!(Err(Error::Syntax(e)) = next_token(&mut cursor));
		assert!(e.position == 2);
		assert!(e.message == "unterminated string literal");
	}

	#[test]
	fn test_operators() {
		check!(tokens("a|b||c") == [
			Token::Ident("a".into()),
			Token::Pipe,
			Token::Ident("b".into()),
			Token::Or,
			Token::Ident("c".into()),
		]);
		check!(tokens("<= < == !") == [Token::Le, Token::Lt, Token::Eq, Token::Bang]);
	}

	#[test]
	fn test_stop_does_not_consume() {
		let mut cursor = Cursor::new("x }");
		let_assert!(Ok((Token::Ident(_), 0)) = next_token(&mut cursor));
		let_assert!(Ok((Token::Stop, 2)) = next_token(&mut cursor));
		check!(cursor.rest() == "}");
	}

	#[test]
	fn test_integer_overflow() {
		let mut cursor = Cursor::new("99999999999999999999");
		let_assert!(Err(Error::Syntax(e)) = next_token(&mut cursor));
		assert!(e.message == "invalid number literal: 99999999999999999999");
	}

	#[test]
	fn test_negative_literals() {
		let mut cursor = Cursor::new("9223372036854775808");
		let_assert!(Ok(Token::Int(i64::MIN)) = read_number(&mut cursor, true));
		let mut cursor = Cursor::new("2.5m");
		check!(let Ok(Token::Decimal(_)) = read_number(&mut cursor, true));
		let mut cursor = Cursor::new("9223372036854775808");
		check!(let Err(Error::Syntax(_)) = read_number(&mut cursor, false));
	}

	#[test]
	fn test_float_out_of_range() {
		let mut cursor = Cursor::new("1e400");
		let_assert!(Err(Error::Syntax(e)) = next_token(&mut cursor));
		assert!(e.position == 0);
		assert!(e.message == "invalid number literal: 1e400");

		let mut cursor = Cursor::new("1e308");
		check!(let Ok((Token::Float(_), 0)) = next_token(&mut cursor));
	}
}

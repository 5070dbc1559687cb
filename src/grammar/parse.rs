use super::lex::{next_token, read_number, Token};
use super::{ensure_sufficient_stack, BinaryOp, Node, UnaryOp};
use crate::cursor::Cursor;
use crate::error::Error;
use crate::Value;

/// Recursive descent parser reading tokens straight from the shared cursor.
///
/// Precedence, lowest first:
/// alternatives, conditional, or, and, equality, relational, additive, multiplicative, unary, primary.
///
/// The height of the parsed tree is limited to [`MAX_DEPTH`],
/// which also bounds the recursion of evaluating and dropping the tree.
pub struct Parser<'c, 'a> {
	cursor: &'c mut Cursor<'a>,
	depth: usize,
}

/// Maximum nesting depth of a parsed expression.
///
/// Parentheses, unary operators, conditionals and every operator in a chain like `1 + 2 + 3` add one level.
pub const MAX_DEPTH: usize = 1000;

impl<'c, 'a> Parser<'c, 'a> {
	pub fn new(cursor: &'c mut Cursor<'a>) -> Self {
		Self { cursor, depth: 0 }
	}

	/// Go one level deeper, or fail if the expression is nested too deeply.
	///
	/// The parser is dropped after an error, so the depth is not restored on failure.
	fn enter(&mut self) -> Result<(), Error> {
		if self.depth >= MAX_DEPTH {
			self.cursor.skip_whitespace();
			return Err(self.cursor.syntax_error("expression nested too deeply"));
		}
		self.depth += 1;
		Ok(())
	}

	/// Run a recursive parse function one level deeper.
	fn nested<F>(&mut self, parse: F) -> Result<Node, Error>
	where
		F: FnOnce(&mut Self) -> Result<Node, Error>,
	{
		self.enter()?;
		let node = ensure_sufficient_stack(|| parse(self))?;
		self.depth -= 1;
		Ok(node)
	}

	/// Look at the next token without consuming it.
	fn peek(&mut self) -> Result<Token, Error> {
		let mark = self.cursor.position();
		let (token, _) = next_token(self.cursor)?;
		self.cursor.reset(mark);
		Ok(token)
	}

	/// Consume the next token.
	fn bump(&mut self) -> Result<Token, Error> {
		next_token(self.cursor).map(|(token, _)| token)
	}

	/// Consume the next token if it equals `expected`.
	fn eat(&mut self, expected: &Token) -> Result<bool, Error> {
		if self.peek()? == *expected {
			self.bump()?;
			Ok(true)
		} else {
			Ok(false)
		}
	}

	fn expect(&mut self, expected: Token, what: &str) -> Result<(), Error> {
		if self.eat(&expected)? {
			Ok(())
		} else {
			self.cursor.skip_whitespace();
			Err(self.cursor.syntax_error(format!("expected {what}")))
		}
	}

	/// Parse a single expression, or nothing at all.
	pub fn parse_single(&mut self) -> Result<Node, Error> {
		if self.peek()? == Token::Stop {
			return Ok(Node::Empty);
		}
		self.conditional()
	}

	/// Parse `|` separated alternatives, or nothing at all.
	pub fn parse_alternatives(&mut self) -> Result<Node, Error> {
		if self.peek()? == Token::Stop {
			return Ok(Node::Empty);
		}
		let mut alternatives = vec![self.conditional()?];
		while self.eat(&Token::Pipe)? {
			alternatives.push(self.conditional()?);
		}
		if alternatives.len() == 1 {
			Ok(alternatives.remove(0))
		} else {
			Ok(Node::Alternatives(alternatives))
		}
	}

	fn conditional(&mut self) -> Result<Node, Error> {
		self.nested(Self::conditional_inner)
	}

	fn conditional_inner(&mut self) -> Result<Node, Error> {
		let condition = self.or()?;
		if !self.eat(&Token::Question)? {
			return Ok(condition);
		}
		let then = self.conditional()?;
		self.expect(Token::Colon, "':' in conditional expression")?;
		let otherwise = self.conditional()?;
		Ok(Node::Conditional(Box::new(condition), Box::new(then), Box::new(otherwise)))
	}

	fn or(&mut self) -> Result<Node, Error> {
		self.binary_level(Self::and, |token| match token {
			Token::Or => Some(BinaryOp::Or),
			_ => None,
		})
	}

	fn and(&mut self) -> Result<Node, Error> {
		self.binary_level(Self::equality, |token| match token {
			Token::And => Some(BinaryOp::And),
			_ => None,
		})
	}

	fn equality(&mut self) -> Result<Node, Error> {
		self.binary_level(Self::relational, |token| match token {
			Token::Eq => Some(BinaryOp::Eq),
			Token::Ne => Some(BinaryOp::Ne),
			_ => None,
		})
	}

	fn relational(&mut self) -> Result<Node, Error> {
		self.binary_level(Self::additive, |token| match token {
			Token::Lt => Some(BinaryOp::Lt),
			Token::Le => Some(BinaryOp::Le),
			Token::Gt => Some(BinaryOp::Gt),
			Token::Ge => Some(BinaryOp::Ge),
			_ => None,
		})
	}

	fn additive(&mut self) -> Result<Node, Error> {
		self.binary_level(Self::multiplicative, |token| match token {
			Token::Plus => Some(BinaryOp::Add),
			Token::Minus => Some(BinaryOp::Sub),
			_ => None,
		})
	}

	fn multiplicative(&mut self) -> Result<Node, Error> {
		self.binary_level(Self::unary, |token| match token {
			Token::Star => Some(BinaryOp::Mul),
			Token::Slash => Some(BinaryOp::Div),
			Token::Percent => Some(BinaryOp::Rem),
			_ => None,
		})
	}

	/// Parse a left-associative sequence of operands joined by the operators recognized by `operator`.
	///
	/// Every operator in the chain deepens the left spine of the tree, so it counts as a level.
	fn binary_level<F, O>(&mut self, operand: F, operator: O) -> Result<Node, Error>
	where
		F: Fn(&mut Self) -> Result<Node, Error>,
		O: Fn(&Token) -> Option<BinaryOp>,
	{
		let base = self.depth;
		let mut left = operand(self)?;
		while let Some(op) = operator(&self.peek()?) {
			self.bump()?;
			self.enter()?;
			let right = operand(self)?;
			left = Node::Binary(op, Box::new(left), Box::new(right));
		}
		self.depth = base;
		Ok(left)
	}

	fn unary(&mut self) -> Result<Node, Error> {
		if self.eat(&Token::Minus)? {
			if let Some(literal) = self.negative_literal()? {
				return Ok(literal);
			}
			return Ok(Node::Unary(UnaryOp::Negate, Box::new(self.nested(Self::unary)?)));
		}
		if self.eat(&Token::Bang)? {
			return Ok(Node::Unary(UnaryOp::Not, Box::new(self.nested(Self::unary)?)));
		}
		self.primary()
	}

	/// Read a number literal right after a minus sign as a single negative literal.
	fn negative_literal(&mut self) -> Result<Option<Node>, Error> {
		let mark = self.cursor.position();
		self.cursor.skip_whitespace();
		if !self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.cursor.reset(mark);
			return Ok(None);
		}
		let value = match read_number(self.cursor, true)? {
			Token::Int(x) => Value::Int(x),
			Token::Float(x) => Value::Float(x),
			Token::Decimal(x) => Value::Decimal(x),
			_ => return Err(self.cursor.syntax_error("expected a number")),
		};
		Ok(Some(Node::Literal(value)))
	}

	fn primary(&mut self) -> Result<Node, Error> {
		let mark = self.cursor.position();
		match self.bump()? {
			Token::Int(x) => Ok(Node::Literal(Value::Int(x))),
			Token::Float(x) => Ok(Node::Literal(Value::Float(x))),
			Token::Decimal(x) => Ok(Node::Literal(Value::Decimal(x))),
			Token::Str(x) => Ok(Node::Literal(Value::String(x))),
			Token::LParen => {
				let inner = self.conditional()?;
				self.expect(Token::RParen, "')'")?;
				Ok(inner)
			},
			Token::Ident(name) => {
				if !self.eat(&Token::LParen)? {
					return Ok(Node::Name(name));
				}
				let mut args = Vec::new();
				if !self.eat(&Token::RParen)? {
					loop {
						args.push(self.conditional()?);
						if self.eat(&Token::Comma)? {
							continue;
						}
						self.expect(Token::RParen, "',' or ')' in argument list")?;
						break;
					}
				}
				Ok(Node::Call(name, args))
			},
			_ => {
				self.cursor.reset(mark);
				self.cursor.skip_whitespace();
				Err(self.cursor.syntax_error("expected an expression"))
			},
		}
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, check, let_assert};

	fn parse(source: &str) -> (Node, String) {
		let mut cursor = Cursor::new(source);
		let_assert!(Ok(node) = Parser::new(&mut cursor).parse_alternatives());
		(node, cursor.rest().to_owned())
	}

	fn lit(value: i64) -> Box<Node> {
		Box::new(Node::Literal(Value::Int(value)))
	}

	#[test]
	fn test_precedence() {
		let (node, rest) = parse("1 + 2 * 3");
		check!(node == Node::Binary(BinaryOp::Add, lit(1), Box::new(Node::Binary(BinaryOp::Mul, lit(2), lit(3)))));
		check!(rest == "");

		let (node, _) = parse("1 - 2 - 3");
		check!(node == Node::Binary(BinaryOp::Sub, Box::new(Node::Binary(BinaryOp::Sub, lit(1), lit(2))), lit(3)));
	}

	#[test]
	fn test_stops_at_closing_delimiter() {
		let (node, rest) = parse("name }tail");
		check!(node == Node::Name("name".into()));
		check!(rest == " }tail");

		let (_, rest) = parse("a[0]");
		check!(rest == "[0]");
	}

	#[test]
	fn test_alternatives() {
		let (node, _) = parse("a | b || c | 'd'");
		check!(node == Node::Alternatives(vec![
			Node::Name("a".into()),
			Node::Binary(BinaryOp::Or, Box::new(Node::Name("b".into())), Box::new(Node::Name("c".into()))),
			Node::Literal(Value::from("d")),
		]));
	}

	#[test]
	fn test_calls_and_conditional() {
		let (node, _) = parse("x ? f() : g(1, 2)");
		check!(node == Node::Conditional(
			Box::new(Node::Name("x".into())),
			Box::new(Node::Call("f".into(), vec![])),
			Box::new(Node::Call("g".into(), vec![Node::Literal(Value::Int(1)), Node::Literal(Value::Int(2))])),
		));
	}

	#[test]
	fn test_empty() {
		let (node, rest) = parse("   }");
		check!(node == Node::Empty);
		check!(rest == "   }");
	}

	#[test]
	fn test_missing_operand() {
		let mut cursor = Cursor::new("1 + }");
		let_assert!(Err(Error::Syntax(e)) = Parser::new(&mut cursor).parse_alternatives());
		assert!(e.position == 4);
		assert!(e.message == "expected an expression");
	}

	#[test]
	fn test_unclosed_paren() {
		let mut cursor = Cursor::new("(1 + 2");
		let_assert!(Err(Error::Syntax(e)) = Parser::new(&mut cursor).parse_single());
		assert!(e.position == 6);
		assert!(e.message == "expected ')'");
	}

	fn parse_error(source: &str) -> String {
		let mut cursor = Cursor::new(source);
		let_assert!(Err(Error::Syntax(e)) = Parser::new(&mut cursor).parse_alternatives());
		e.message
	}

	#[test]
	fn test_nesting_limit() {
		let deep = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
		check!(parse_error(&deep) == "expression nested too deeply");
		check!(parse_error(&format!("{}1", "-".repeat(200_000))) == "expression nested too deeply");
		check!(parse_error(&format!("{}1", "!".repeat(5_000))) == "expression nested too deeply");
		check!(parse_error(&vec!["1"; 5_000].join(" + ")) == "expression nested too deeply");
		check!(parse_error(&format!("{}1{}", "x ? ".repeat(5_000), " : 2".repeat(5_000))) == "expression nested too deeply");

		let (_, rest) = parse(&format!("{}1{}", "(".repeat(MAX_DEPTH / 2), ")".repeat(MAX_DEPTH / 2)));
		check!(rest == "");
		let (_, rest) = parse(&vec!["1"; MAX_DEPTH / 2].join(" * "));
		check!(rest == "");
	}

	#[test]
	fn test_negative_literal() {
		let (node, _) = parse("-9223372036854775808");
		check!(node == Node::Literal(Value::Int(i64::MIN)));
		let (node, _) = parse("- 2 * 3");
		check!(node == Node::Binary(BinaryOp::Mul, lit(-2), lit(3)));
		let (node, _) = parse("-x");
		check!(node == Node::Unary(UnaryOp::Negate, Box::new(Node::Name("x".into()))));
		check!(parse_error("-1e400") == "invalid number literal: -1e400");
	}
}

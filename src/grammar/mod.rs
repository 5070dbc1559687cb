//! The expression grammar used for the bodies of delimited regions.
//!
//! The expander only needs two things from a grammar:
//! parsing an expression from a [`Cursor`], and evaluating the parsed expression against a [`Context`].
//! Those are captured by the [`Grammar`] and [`Evaluate`] traits,
//! so applications can plug in their own expression language.
//!
//! [`Standard`] is the grammar used by default.
//! It supports literals, variables, arithmetic, comparisons, logic, the conditional operator,
//! calls and `|` separated alternatives:
//!
//! ```
//! # fn main() -> Result<(), exsubst::Error> {
//! let mut expander = exsubst::Expander::new();
//! expander.set("count", 3);
//! assert_eq!(expander.eval("count * 2 + 1")?, exsubst::Value::Int(7));
//! assert_eq!(expander.eval_multi("missing | 'fallback'")?, exsubst::Value::from("fallback"));
//! # Ok(())
//! # }
//! ```

use crate::context::Context;
use crate::cursor::Cursor;
use crate::error::{Error, EvaluationError};
use crate::Value;

mod eval;
mod lex;
mod parse;

/// A parsed expression that can be evaluated.
pub trait Evaluate {
	/// Evaluate the expression, pushing exactly one result onto `stack`.
	fn evaluate(&self, context: &dyn Context, stack: &mut Vec<Value>) -> Result<(), Error>;
}

/// An expression language.
pub trait Grammar {
	/// The parsed form of an expression.
	type Node: Evaluate;

	/// Parse one expression from the cursor.
	///
	/// The parser stops at the first character that can not continue the expression,
	/// leaving the cursor there.
	fn parse(&self, cursor: &mut Cursor<'_>) -> Result<Self::Node, Error>;

	/// Parse a group of `|` separated alternatives from the cursor.
	///
	/// Like [`Self::parse()`], the parser leaves the cursor at the first character it can not use.
	fn parse_multi(&self, cursor: &mut Cursor<'_>) -> Result<Self::Node, Error>;
}

/// Keep at least this much stack available before recursing into a nested expression.
const RED_ZONE: usize = 100 * 1024;

/// Size of every extra stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if the remaining space is below [`RED_ZONE`].
///
/// Parsing and evaluation recurse once per nesting level.
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
	stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// Evaluate an expression and take the single result from the stack.
pub fn evaluate<N: Evaluate + ?Sized>(node: &N, context: &dyn Context) -> Result<Value, Error> {
	let mut stack = Vec::with_capacity(4);
	node.evaluate(context, &mut stack)?;
	match (stack.pop(), stack.is_empty()) {
		(Some(value), true) => Ok(value),
		_ => Err(EvaluationError::new("expression did not produce exactly one value").into()),
	}
}

/// The default expression grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl Grammar for Standard {
	type Node = Node;

	fn parse(&self, cursor: &mut Cursor<'_>) -> Result<Node, Error> {
		parse::Parser::new(cursor).parse_single()
	}

	fn parse_multi(&self, cursor: &mut Cursor<'_>) -> Result<Node, Error> {
		parse::Parser::new(cursor).parse_alternatives()
	}
}

/// A parsed expression of the [`Standard`] grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	/// An empty expression, which evaluates to null.
	Empty,

	/// A literal value.
	Literal(Value),

	/// A name to resolve as a literal or a variable.
	Name(String),

	/// A unary operator.
	Unary(UnaryOp, Box<Node>),

	/// A binary operator.
	Binary(BinaryOp, Box<Node>, Box<Node>),

	/// `condition ? then : otherwise`
	Conditional(Box<Node>, Box<Node>, Box<Node>),

	/// A call of a receiver method, a type conversion or a subroutine.
	Call(String, Vec<Node>),

	/// Alternatives, tried in order until one produces a value.
	Alternatives(Vec<Node>),
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	/// `-`
	Negate,
	/// `!`
	Not,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	/// `+`
	Add,
	/// `-`
	Sub,
	/// `*`
	Mul,
	/// `/`
	Div,
	/// `%`
	Rem,
	/// `==`
	Eq,
	/// `!=`
	Ne,
	/// `<`
	Lt,
	/// `<=`
	Le,
	/// `>`
	Gt,
	/// `>=`
	Ge,
	/// `&&`
	And,
	/// `||`
	Or,
}

impl BinaryOp {
	/// The operator as written in source.
	pub fn symbol(self) -> &'static str {
		match self {
			Self::Add => "+",
			Self::Sub => "-",
			Self::Mul => "*",
			Self::Div => "/",
			Self::Rem => "%",
			Self::Eq => "==",
			Self::Ne => "!=",
			Self::Lt => "<",
			Self::Le => "<=",
			Self::Gt => ">",
			Self::Ge => ">=",
			Self::And => "&&",
			Self::Or => "||",
		}
	}
}

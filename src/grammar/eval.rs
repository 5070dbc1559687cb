use std::cmp::Ordering;

use rust_decimal::Decimal;

use super::{ensure_sufficient_stack, BinaryOp, Evaluate, Node, UnaryOp};
use crate::context::Context;
use crate::error::{Error, EvaluationError, NoSuchVariable};
use crate::Value;

impl Evaluate for Node {
	fn evaluate(&self, context: &dyn Context, stack: &mut Vec<Value>) -> Result<(), Error> {
		ensure_sufficient_stack(|| self.evaluate_node(context, stack))
	}
}

impl Node {
	fn evaluate_node(&self, context: &dyn Context, stack: &mut Vec<Value>) -> Result<(), Error> {
		match self {
			Node::Empty => stack.push(Value::Null),
			Node::Literal(value) => stack.push(value.clone()),
			Node::Name(name) => {
				let value = match context.resolve_literal(name) {
					Some(value) => value,
					None => context
						.lookup(name)?
						.ok_or_else(|| NoSuchVariable { name: name.clone() })?,
				};
				stack.push(value);
			},
			Node::Unary(op, operand) => {
				operand.evaluate(context, stack)?;
				let value = pop(stack)?;
				stack.push(unary(*op, value)?);
			},
			Node::Binary(BinaryOp::And, left, right) => {
				left.evaluate(context, stack)?;
				if pop(stack)?.is_truthy() {
					right.evaluate(context, stack)?;
					let value = pop(stack)?.is_truthy();
					stack.push(Value::Bool(value));
				} else {
					stack.push(Value::Bool(false));
				}
			},
			Node::Binary(BinaryOp::Or, left, right) => {
				left.evaluate(context, stack)?;
				if pop(stack)?.is_truthy() {
					stack.push(Value::Bool(true));
				} else {
					right.evaluate(context, stack)?;
					let value = pop(stack)?.is_truthy();
					stack.push(Value::Bool(value));
				}
			},
			Node::Binary(op, left, right) => {
				left.evaluate(context, stack)?;
				right.evaluate(context, stack)?;
				let right = pop(stack)?;
				let left = pop(stack)?;
				stack.push(binary(*op, left, right)?);
			},
			Node::Conditional(condition, then, otherwise) => {
				condition.evaluate(context, stack)?;
				if pop(stack)?.is_truthy() {
					then.evaluate(context, stack)?;
				} else {
					otherwise.evaluate(context, stack)?;
				}
			},
			Node::Call(name, args) => {
				for arg in args {
					arg.evaluate(context, stack)?;
				}
				if stack.len() < args.len() {
					return Err(underflow());
				}
				let args = stack.split_off(stack.len() - args.len());
				stack.push(call(context, name, &args)?);
			},
			Node::Alternatives(alternatives) => {
				let (last, init) = alternatives
					.split_last()
					.ok_or_else(|| EvaluationError::new("empty list of alternatives"))?;
				for alternative in init {
					let depth = stack.len();
					match alternative.evaluate(context, stack) {
						Ok(()) => {
							let value = pop(stack)?;
							if !value.is_null() {
								stack.push(value);
								return Ok(());
							}
						},
						Err(Error::NoSuchVariable(_)) => stack.truncate(depth),
						Err(e) => return Err(e),
					}
				}
				last.evaluate(context, stack)?;
			},
		}
		Ok(())
	}
}

fn underflow() -> Error {
	EvaluationError::new("value stack underflow").into()
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, Error> {
	stack.pop().ok_or_else(underflow)
}

/// Dispatch a call to the receivers, a type conversion or a subroutine, in that order.
fn call(context: &dyn Context, name: &str, args: &[Value]) -> Result<Value, Error> {
	for receiver in context.receivers() {
		if let Some(result) = receiver.call(name, args) {
			return result;
		}
	}
	if let [arg] = args {
		if let Some(kind) = context.resolve_type(name) {
			return arg
				.convert(kind)
				.ok_or_else(|| EvaluationError::new(format!("can not convert {:?} to {name}", arg.kind())).into());
		}
	}
	context.call_subroutine(name, args)
}

/// A value promoted for arithmetic.
#[derive(Debug, Clone, Copy)]
enum Number {
	Int(i64),
	Float(f64),
	Decimal(Decimal),
}

fn number(value: &Value) -> Option<Number> {
	match value {
		Value::Int(x) => Some(Number::Int(*x)),
		Value::Float(x) => Some(Number::Float(*x)),
		Value::Decimal(x) => Some(Number::Decimal(*x)),
		Value::String(x) => {
			let x = x.trim();
			x.parse()
				.map(Number::Int)
				.or_else(|_| x.parse().map(Number::Float))
				.ok()
		},
		_ => None,
	}
}

/// Promote two numbers to a common representation: float wins over decimal, decimal wins over integer.
fn promote(a: Number, b: Number) -> (Number, Number) {
	match (a, b) {
		(Number::Float(_), _) | (_, Number::Float(_)) => (Number::Float(as_f64(a)), Number::Float(as_f64(b))),
		(Number::Decimal(_), _) | (_, Number::Decimal(_)) => (Number::Decimal(as_decimal(a)), Number::Decimal(as_decimal(b))),
		_ => (a, b),
	}
}

fn as_f64(x: Number) -> f64 {
	match x {
		Number::Int(x) => x as f64,
		Number::Float(x) => x,
		Number::Decimal(x) => Value::Decimal(x).to_f64().unwrap_or(f64::NAN),
	}
}

fn as_decimal(x: Number) -> Decimal {
	match x {
		Number::Int(x) => Decimal::from(x),
		Number::Decimal(x) => x,
		// Floats are promoted before decimals, so this is not reached from `promote()`.
		Number::Float(x) => Decimal::from_f64_retain(x).unwrap_or_default(),
	}
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, Error> {
	match op {
		UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
		UnaryOp::Negate => match number(&value) {
			Some(Number::Int(x)) => x.checked_neg().map(Value::Int).ok_or_else(overflow),
			Some(Number::Float(x)) => Ok(Value::Float(-x)),
			Some(Number::Decimal(x)) => Ok(Value::Decimal(-x)),
			None => Err(EvaluationError::new(format!("can not negate a value of type {:?}", value.kind())).into()),
		},
	}
}

fn overflow() -> Error {
	EvaluationError::new("arithmetic overflow").into()
}

fn division_by_zero() -> Error {
	EvaluationError::new("division by zero").into()
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, Error> {
	match op {
		BinaryOp::Add if is_text(&left) || is_text(&right) => Ok(Value::String(format!("{left}{right}"))),
		BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => arithmetic(op, &left, &right),
		BinaryOp::Eq => Ok(Value::Bool(equals(&left, &right))),
		BinaryOp::Ne => Ok(Value::Bool(!equals(&left, &right))),
		BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
			let ordering = compare(&left, &right).ok_or_else(|| type_mismatch(op, &left, &right))?;
			let result = match op {
				BinaryOp::Lt => ordering == Ordering::Less,
				BinaryOp::Le => ordering != Ordering::Greater,
				BinaryOp::Gt => ordering == Ordering::Greater,
				_ => ordering != Ordering::Less,
			};
			Ok(Value::Bool(result))
		},
		BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
		BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
	}
}

/// Strings and null concatenate with `+`.
fn is_text(value: &Value) -> bool {
	matches!(value, Value::String(_) | Value::Null)
}

fn type_mismatch(op: BinaryOp, left: &Value, right: &Value) -> Error {
	EvaluationError::new(format!(
		"operator '{}' can not be applied to {:?} and {:?}",
		op.symbol(),
		left.kind(),
		right.kind()
	))
	.into()
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, Error> {
	let (Some(a), Some(b)) = (number(left), number(right)) else {
		return Err(type_mismatch(op, left, right));
	};
	match promote(a, b) {
		(Number::Int(a), Number::Int(b)) => {
			let result = match op {
				BinaryOp::Add => a.checked_add(b),
				BinaryOp::Sub => a.checked_sub(b),
				BinaryOp::Mul => a.checked_mul(b),
				BinaryOp::Div if b == 0 => return Err(division_by_zero()),
				BinaryOp::Div => a.checked_div(b),
				BinaryOp::Rem if b == 0 => return Err(division_by_zero()),
				_ => a.checked_rem(b),
			};
			result.map(Value::Int).ok_or_else(overflow)
		},
		(Number::Decimal(a), Number::Decimal(b)) => {
			let result = match op {
				BinaryOp::Add => a.checked_add(b),
				BinaryOp::Sub => a.checked_sub(b),
				BinaryOp::Mul => a.checked_mul(b),
				BinaryOp::Div if b.is_zero() => return Err(division_by_zero()),
				BinaryOp::Div => a.checked_div(b),
				BinaryOp::Rem if b.is_zero() => return Err(division_by_zero()),
				_ => a.checked_rem(b),
			};
			result.map(Value::Decimal).ok_or_else(overflow)
		},
		(a, b) => {
			let (a, b) = (as_f64(a), as_f64(b));
			let result = match op {
				BinaryOp::Add => a + b,
				BinaryOp::Sub => a - b,
				BinaryOp::Mul => a * b,
				BinaryOp::Div if b == 0.0 => return Err(division_by_zero()),
				BinaryOp::Div => a / b,
				BinaryOp::Rem if b == 0.0 => return Err(division_by_zero()),
				_ => a % b,
			};
			Ok(Value::Float(result))
		},
	}
}

/// Compare numbers numerically and strings ordinally.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
	match (left, right) {
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		(Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
		(Value::String(_), _) | (_, Value::String(_)) => None,
		_ => {
			let a = number(left)?;
			let b = number(right)?;
			match promote(a, b) {
				(Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
				(Number::Decimal(a), Number::Decimal(b)) => Some(a.cmp(&b)),
				(a, b) => as_f64(a).partial_cmp(&as_f64(b)),
			}
		},
	}
}

fn equals(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(Value::String(_), _) | (_, Value::String(_)) => left == right,
		_ => match compare(left, right) {
			Some(ordering) => ordering == Ordering::Equal,
			None => left == right,
		},
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use crate::context::{builtin_literal, BuiltinTypes, Receiver, TypeResolver};
	use crate::cursor::Cursor;
	use crate::grammar::{evaluate, Grammar, Standard};
	use crate::{ValueKind, VariableStore};
	use assert2::{assert, check, let_assert};

	struct TestContext {
		variables: VariableStore,
		receivers: Vec<Box<dyn Receiver>>,
	}

	impl Context for TestContext {
		fn lookup(&self, name: &str) -> Result<Option<Value>, Error> {
			Ok(self.variables.try_get(name).cloned())
		}

		fn resolve_type(&self, name: &str) -> Option<ValueKind> {
			BuiltinTypes.resolve_type(name)
		}

		fn resolve_literal(&self, token: &str) -> Option<Value> {
			builtin_literal(token)
		}

		fn receivers(&self) -> &[Box<dyn Receiver>] {
			&self.receivers
		}
	}

	fn context() -> TestContext {
		let mut variables = VariableStore::new();
		variables.set("x", 10);
		variables.set("name", "world");
		variables.set("nothing", Value::Null);
		TestContext { variables, receivers: Vec::new() }
	}

	fn eval_in(context: &TestContext, source: &str) -> Result<Value, Error> {
		let mut cursor = Cursor::new(source);
		let node = Standard.parse_multi(&mut cursor)?;
		evaluate(&node, context)
	}

	fn eval(source: &str) -> Result<Value, Error> {
		eval_in(&context(), source)
	}

	#[test]
	fn test_arithmetic() {
		check!(eval("2 + 3") == Ok(Value::Int(5)));
		check!(eval("x * 2 - 1") == Ok(Value::Int(19)));
		check!(eval("7 / 2") == Ok(Value::Int(3)));
		check!(eval("7 % 4") == Ok(Value::Int(3)));
		check!(eval("7 / 2.0") == Ok(Value::Float(3.5)));
		check!(eval("1.5m + 1") == Ok(Value::Decimal(Decimal::new(25, 1))));
		check!(eval("-x") == Ok(Value::Int(-10)));
		check!(eval("'5' * 2") == Ok(Value::Int(10)));
	}

	#[test]
	fn test_arithmetic_errors() {
		let_assert!(Err(Error::Evaluation(e)) = eval("1 / 0"));
		assert!(e.message == "division by zero");
		let_assert!(Err(Error::Evaluation(e)) = eval("9223372036854775807 + 1"));
		assert!(e.message == "arithmetic overflow");
		let_assert!(Err(Error::Evaluation(e)) = eval("true - 1"));
		assert!(e.message == "operator '-' can not be applied to Bool and Int");
	}

	#[test]
	fn test_strings() {
		check!(eval("'Hello, ' + name") == Ok(Value::from("Hello, world")));
		check!(eval("'n=' + x") == Ok(Value::from("n=10")));
		check!(eval("name == 'world'") == Ok(Value::Bool(true)));
		check!(eval("'abc' < 'abd'") == Ok(Value::Bool(true)));
	}

	#[test]
	fn test_logic_and_conditional() {
		check!(eval("x > 5 && x < 20") == Ok(Value::Bool(true)));
		check!(eval("x > 50 || false") == Ok(Value::Bool(false)));
		check!(eval("!nothing") == Ok(Value::Bool(true)));
		check!(eval("x >= 10 ? 'big' : 'small'") == Ok(Value::from("big")));
		check!(eval("x == 10.0") == Ok(Value::Bool(true)));
		// Short-circuiting skips the missing variable.
		check!(eval("false && missing") == Ok(Value::Bool(false)));
	}

	#[test]
	fn test_names() {
		check!(eval("NULL") == Ok(Value::Null));
		check!(eval("True") == Ok(Value::Bool(true)));
		let_assert!(Err(Error::NoSuchVariable(e)) = eval("missing"));
		assert!(e.name == "missing");
	}

	#[test]
	fn test_alternatives() {
		check!(eval("missing | name") == Ok(Value::from("world")));
		check!(eval("nothing | missing | 'c'") == Ok(Value::from("c")));
		check!(eval("x | 'unused'") == Ok(Value::Int(10)));
		let_assert!(Err(Error::NoSuchVariable(_)) = eval("missing | also_missing"));
		let_assert!(Err(Error::Evaluation(_)) = eval("1 / 0 | 'not reached'"));
	}

	#[test]
	fn test_empty() {
		check!(eval("") == Ok(Value::Null));
	}

	#[test]
	fn test_calls() {
		check!(eval("int('42')") == Ok(Value::Int(42)));
		check!(eval("string(x) + 1") == Ok(Value::from("101")));
		let_assert!(Err(Error::Evaluation(e)) = eval("int('abc')"));
		assert!(e.message == "can not convert String to int");
		let_assert!(Err(Error::NoSuchSubroutine(e)) = eval("launch(1, 2)"));
		assert!(e.name == "launch");

		let mut context = context();
		context.receivers.push(Box::new(|name: &str, args: &[Value]| match name {
			"len" => Some(Ok::<_, Error>(Value::Int(args.first().map_or(0, |x| x.to_string().len()) as i64))),
			_ => None,
		}));
		check!(eval_in(&context, "len(name)") == Ok(Value::Int(5)));
	}
}

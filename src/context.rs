//! The capabilities an expression needs from its surroundings while it is evaluated.

use crate::error::{Error, NoSuchSubroutine};
use crate::{Value, ValueKind};

/// Services an expression grammar can use during evaluation.
///
/// The [`Expander`][crate::Expander] implements this trait on top of its variable store.
pub trait Context {
	/// Look up a variable by name.
	///
	/// Returns `Ok(None)` if the variable is not set.
	/// Implementations may treat some names as expressions in their own right,
	/// in which case evaluating them can fail.
	fn lookup(&self, name: &str) -> Result<Option<Value>, Error>;

	/// Resolve a type by name.
	fn resolve_type(&self, name: &str) -> Option<ValueKind>;

	/// Call a named subroutine provided by the surroundings.
	fn call_subroutine(&self, name: &str, args: &[Value]) -> Result<Value, Error> {
		let _ = args;
		Err(NoSuchSubroutine { name: name.to_owned() }.into())
	}

	/// Resolve bare literal-like tokens before they are looked up as variables.
	///
	/// By default, `null`, `true` and `false` are recognized, ignoring case.
	fn resolve_literal(&self, token: &str) -> Option<Value> {
		builtin_literal(token)
	}

	/// Objects against which unqualified method calls are attempted, in order.
	fn receivers(&self) -> &[Box<dyn Receiver>] {
		&[]
	}
}

/// Recognize `null`, `true` and `false`, ignoring case.
pub fn builtin_literal(token: &str) -> Option<Value> {
	if token.eq_ignore_ascii_case("null") {
		Some(Value::Null)
	} else if token.eq_ignore_ascii_case("true") {
		Some(Value::Bool(true))
	} else if token.eq_ignore_ascii_case("false") {
		Some(Value::Bool(false))
	} else {
		None
	}
}

/// An object that can answer unqualified method calls from expressions.
pub trait Receiver {
	/// Try to call the method `name`.
	///
	/// Returns [`None`] if this receiver has no such method,
	/// so the next receiver can be tried.
	fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, Error>>;
}

impl<F> Receiver for F
where
	F: Fn(&str, &[Value]) -> Option<Result<Value, Error>>,
{
	fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, Error>> {
		self(name, args)
	}
}

/// A subroutine that can be called by name from expressions.
pub type Subroutine = Box<dyn Fn(&[Value]) -> Result<Value, Error>>;

/// Service that maps type names to value kinds.
pub trait TypeResolver {
	/// Resolve a type by name.
	fn resolve_type(&self, name: &str) -> Option<ValueKind>;
}

impl<F> TypeResolver for F
where
	F: Fn(&str) -> Option<ValueKind>,
{
	fn resolve_type(&self, name: &str) -> Option<ValueKind> {
		self(name)
	}
}

/// The default [`TypeResolver`], which knows the usual names of the built-in types.
///
/// Names are matched case-insensitively, with or without a `System.` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTypes;

impl TypeResolver for BuiltinTypes {
	fn resolve_type(&self, name: &str) -> Option<ValueKind> {
		let name = name.to_ascii_lowercase();
		let name = name.strip_prefix("system.").unwrap_or(&name);
		let kind = match name {
			"bool" | "boolean" => ValueKind::Bool,
			"int" | "long" | "short" | "byte" | "int16" | "int32" | "int64" | "integer" => ValueKind::Int,
			"float" | "double" | "single" => ValueKind::Float,
			"decimal" => ValueKind::Decimal,
			"guid" => ValueKind::Guid,
			"string" | "str" => ValueKind::String,
			"list" | "array" => ValueKind::List,
			"object" => ValueKind::Object,
			_ => return None,
		};
		Some(kind)
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::check;

	#[test]
	fn test_builtin_types() {
		check!(BuiltinTypes.resolve_type("int") == Some(ValueKind::Int));
		check!(BuiltinTypes.resolve_type("System.Int32") == Some(ValueKind::Int));
		check!(BuiltinTypes.resolve_type("DOUBLE") == Some(ValueKind::Float));
		check!(BuiltinTypes.resolve_type("Guid") == Some(ValueKind::Guid));
		check!(BuiltinTypes.resolve_type("Widget") == None);
	}

	#[test]
	fn test_builtin_literal() {
		check!(builtin_literal("NULL") == Some(Value::Null));
		check!(builtin_literal("True") == Some(Value::Bool(true)));
		check!(builtin_literal("false") == Some(Value::Bool(false)));
		check!(builtin_literal("nil") == None);
	}
}

//! Dynamic values stored in variables and produced by expressions.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// An opaque object carried through the engine by the embedding application.
///
/// Any `'static` type that implements [`Debug`][fmt::Debug] and [`Display`][fmt::Display] can be used.
/// The display form is used when the object is stringified during expansion.
pub trait ObjectValue: fmt::Debug + fmt::Display + 'static {
	/// Get the object as [`Any`], so callers can downcast it.
	fn as_any(&self) -> &dyn Any;

	/// Short name of the object type, used by the variable dump.
	fn type_name(&self) -> &'static str {
		std::any::type_name::<Self>()
	}
}

impl<T: fmt::Debug + fmt::Display + 'static> ObjectValue for T {
	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
	/// The absence of a value.
	#[default]
	Null,

	/// A boolean.
	Bool(bool),

	/// A signed 64 bit integer.
	Int(i64),

	/// A double precision float.
	Float(f64),

	/// A decimal number.
	Decimal(Decimal),

	/// A GUID.
	Guid(Uuid),

	/// A string.
	String(String),

	/// A list of values.
	List(Vec<Value>),

	/// An opaque object handle.
	Object(Rc<dyn ObjectValue>),
}

/// The runtime type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
	/// [`Value::Null`]
	Null,
	/// [`Value::Bool`]
	Bool,
	/// [`Value::Int`]
	Int,
	/// [`Value::Float`]
	Float,
	/// [`Value::Decimal`]
	Decimal,
	/// [`Value::Guid`]
	Guid,
	/// [`Value::String`]
	String,
	/// [`Value::List`]
	List,
	/// [`Value::Object`]
	Object,
}

impl Value {
	/// Create a value holding an opaque object.
	pub fn object<T: ObjectValue>(object: T) -> Self {
		Self::Object(Rc::new(object))
	}

	/// Get the runtime type of the value.
	pub fn kind(&self) -> ValueKind {
		match self {
			Self::Null => ValueKind::Null,
			Self::Bool(_) => ValueKind::Bool,
			Self::Int(_) => ValueKind::Int,
			Self::Float(_) => ValueKind::Float,
			Self::Decimal(_) => ValueKind::Decimal,
			Self::Guid(_) => ValueKind::Guid,
			Self::String(_) => ValueKind::String,
			Self::List(_) => ValueKind::List,
			Self::Object(_) => ValueKind::Object,
		}
	}

	/// Check if the value is null.
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Check if the value is a primitive: a number, boolean, decimal or GUID.
	///
	/// Primitives are never expanded or trimmed by a transform.
	pub fn is_primitive(&self) -> bool {
		matches!(self, Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Decimal(_) | Self::Guid(_))
	}

	/// Get the string slice if the value is a string.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(x) => Some(x),
			_ => None,
		}
	}

	/// Interpret the value as a condition.
	///
	/// Null, `false`, zero, empty strings and empty lists are false.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Null => false,
			Self::Bool(x) => *x,
			Self::Int(x) => *x != 0,
			Self::Float(x) => *x != 0.0,
			Self::Decimal(x) => !x.is_zero(),
			Self::Guid(x) => !x.is_nil(),
			Self::String(x) => !x.is_empty(),
			Self::List(x) => !x.is_empty(),
			Self::Object(_) => true,
		}
	}

	/// Convert the value to an integer, if it has a sensible integer interpretation.
	pub fn to_i64(&self) -> Option<i64> {
		match self {
			Self::Bool(x) => Some(i64::from(*x)),
			Self::Int(x) => Some(*x),
			Self::Float(x) if x.is_finite() && x.fract() == 0.0 => Some(*x as i64),
			Self::Decimal(x) => x.trunc().to_i64(),
			Self::String(x) => x.trim().parse().ok(),
			_ => None,
		}
	}

	/// Convert the value to a float, if it has a sensible numeric interpretation.
	pub fn to_f64(&self) -> Option<f64> {
		match self {
			Self::Bool(x) => Some(f64::from(u8::from(*x))),
			Self::Int(x) => Some(*x as f64),
			Self::Float(x) => Some(*x),
			Self::Decimal(x) => x.to_f64(),
			Self::String(x) => x.trim().parse().ok(),
			_ => None,
		}
	}

	/// Convert the value to a decimal, if it has a sensible numeric interpretation.
	pub fn to_decimal(&self) -> Option<Decimal> {
		match self {
			Self::Bool(x) => Some(Decimal::from(u8::from(*x))),
			Self::Int(x) => Some(Decimal::from(*x)),
			Self::Float(x) => Decimal::from_f64_retain(*x),
			Self::Decimal(x) => Some(*x),
			Self::String(x) => x.trim().parse().ok(),
			_ => None,
		}
	}

	/// Convert the value to the given kind, following the permissive coercion rules.
	///
	/// Returns [`None`] if the value has no interpretation as the requested kind.
	pub fn convert(&self, kind: ValueKind) -> Option<Value> {
		match kind {
			ValueKind::Null => Some(Value::Null),
			ValueKind::Bool => match self {
				Self::String(x) => match x.trim().to_ascii_lowercase().as_str() {
					"true" => Some(Value::Bool(true)),
					"false" => Some(Value::Bool(false)),
					_ => None,
				},
				other => Some(Value::Bool(other.is_truthy())),
			},
			ValueKind::Int => self.to_i64().map(Value::Int),
			ValueKind::Float => self.to_f64().map(Value::Float),
			ValueKind::Decimal => self.to_decimal().map(Value::Decimal),
			ValueKind::Guid => match self {
				Self::Guid(x) => Some(Value::Guid(*x)),
				Self::String(x) => Uuid::parse_str(x.trim()).ok().map(Value::Guid),
				_ => None,
			},
			ValueKind::String => Some(Value::String(self.to_string())),
			ValueKind::List => match self {
				Self::List(_) => Some(self.clone()),
				Self::Null => Some(Value::List(Vec::new())),
				other => Some(Value::List(vec![other.clone()])),
			},
			ValueKind::Object => match self {
				Self::Object(_) => Some(self.clone()),
				_ => None,
			},
		}
	}

	/// Stringify the value, consuming it.
	///
	/// This avoids a copy if the value is already a string.
	pub fn into_string(self) -> String {
		match self {
			Self::String(x) => x,
			other => other.to_string(),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => Ok(()),
			Self::Bool(true) => f.write_str("True"),
			Self::Bool(false) => f.write_str("False"),
			Self::Int(x) => write!(f, "{x}"),
			Self::Float(x) => write!(f, "{x}"),
			Self::Decimal(x) => write!(f, "{x}"),
			Self::Guid(x) => write!(f, "{x}"),
			Self::String(x) => f.write_str(x),
			Self::List(items) => {
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					write!(f, "{item}")?;
				}
				Ok(())
			},
			Self::Object(x) => write!(f, "{x}"),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Decimal(a), Self::Decimal(b)) => a == b,
			(Self::Guid(a), Self::Guid(b)) => a == b,
			(Self::String(a), Self::String(b)) => a == b,
			(Self::List(a), Self::List(b)) => a == b,
			(Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl From<bool> for Value {
	#[inline]
	fn from(other: bool) -> Self {
		Self::Bool(other)
	}
}

impl From<i32> for Value {
	#[inline]
	fn from(other: i32) -> Self {
		Self::Int(other.into())
	}
}

impl From<i64> for Value {
	#[inline]
	fn from(other: i64) -> Self {
		Self::Int(other)
	}
}

impl From<f64> for Value {
	#[inline]
	fn from(other: f64) -> Self {
		Self::Float(other)
	}
}

impl From<Decimal> for Value {
	#[inline]
	fn from(other: Decimal) -> Self {
		Self::Decimal(other)
	}
}

impl From<Uuid> for Value {
	#[inline]
	fn from(other: Uuid) -> Self {
		Self::Guid(other)
	}
}

impl From<&str> for Value {
	#[inline]
	fn from(other: &str) -> Self {
		Self::String(other.to_owned())
	}
}

impl From<String> for Value {
	#[inline]
	fn from(other: String) -> Self {
		Self::String(other)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(other: Vec<T>) -> Self {
		Self::List(other.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(other: Option<T>) -> Self {
		other.map_or(Self::Null, Into::into)
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::check;

	#[derive(Debug)]
	struct Handle(u32);

	impl fmt::Display for Handle {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "handle#{}", self.0)
		}
	}

	#[test]
	fn test_display() {
		check!(Value::Null.to_string() == "");
		check!(Value::Bool(true).to_string() == "True");
		check!(Value::Int(-3).to_string() == "-3");
		check!(Value::Float(2.0).to_string() == "2");
		check!(Value::Float(2.5).to_string() == "2.5");
		check!(Value::from(vec![1, 2, 3]).to_string() == "1,2,3");
		check!(Value::object(Handle(7)).to_string() == "handle#7");
	}

	#[test]
	fn test_primitives() {
		check!(Value::Int(1).is_primitive());
		check!(Value::Bool(false).is_primitive());
		check!(Value::Decimal(Decimal::new(15, 1)).is_primitive());
		check!(Value::Guid(Uuid::nil()).is_primitive());
		check!(!Value::from("1").is_primitive());
		check!(!Value::Null.is_primitive());
	}

	#[test]
	fn test_convert() {
		check!(Value::from(" 42 ").convert(ValueKind::Int) == Some(Value::Int(42)));
		check!(Value::from("abc").convert(ValueKind::Int) == None);
		check!(Value::from("TRUE").convert(ValueKind::Bool) == Some(Value::Bool(true)));
		check!(Value::Int(0).convert(ValueKind::Bool) == Some(Value::Bool(false)));
		check!(Value::Int(3).convert(ValueKind::String) == Some(Value::from("3")));
		check!(Value::from("1.25").convert(ValueKind::Decimal) == Some(Value::Decimal(Decimal::new(125, 2))));
	}

	#[test]
	fn test_objects_compare_by_identity() {
		let a = Value::object(Handle(1));
		let b = Value::object(Handle(1));
		check!(a == a.clone());
		check!(a != b);
		let_downcast(&a);
	}

	fn let_downcast(value: &Value) {
		let Value::Object(object) = value else { panic!("not an object") };
		check!(object.as_any().downcast_ref::<Handle>().map(|x| x.0) == Some(1));
	}
}

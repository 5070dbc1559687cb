//! Support for transforming string values in TOML data.

use serde::de::DeserializeOwned;

use crate::grammar::Grammar;
use crate::{Expander, TransformRules, Value};

/// Parse a struct from TOML data, after transforming all string values.
///
/// This function first parses the data into a [`toml::Value`],
/// then transforms all string values with [`transform_string_values()`],
/// and then parses it further into the desired type.
pub fn from_slice<T, G>(data: &[u8], expander: &Expander<G>, rules: TransformRules) -> Result<T, Error>
where
	T: DeserializeOwned,
	G: Grammar,
{
	from_str(std::str::from_utf8(data)?, expander, rules)
}

/// Parse a struct from TOML data, after transforming all string values.
///
/// This function first parses the data into a [`toml::Value`],
/// then transforms all string values with [`transform_string_values()`],
/// and then parses it further into the desired type.
pub fn from_str<T, G>(data: &str, expander: &Expander<G>, rules: TransformRules) -> Result<T, Error>
where
	T: DeserializeOwned,
	G: Grammar,
{
	let mut value: toml::Value = toml::from_str(data)?;
	transform_string_values(&mut value, expander, rules)?;
	Ok(T::deserialize(value)?)
}

/// Transform all string values of a TOML value.
///
/// A string that is a single expression is replaced by the native TOML form of the result.
/// TOML has no null, so null results become empty strings.
pub fn transform_string_values<G: Grammar>(
	value: &mut toml::Value,
	expander: &Expander<G>,
	rules: TransformRules,
) -> Result<(), crate::Error> {
	visit_string_values(value, |node| {
		if let toml::Value::String(text) = node {
			let result = expander.transform(Value::String(std::mem::take(text)), rules)?;
			*node = to_toml(result);
		}
		Ok(())
	})
}

fn to_toml(value: Value) -> toml::Value {
	match value {
		Value::Bool(x) => toml::Value::Boolean(x),
		Value::Int(x) => toml::Value::Integer(x),
		Value::Float(x) => toml::Value::Float(x),
		Value::List(items) => toml::Value::Array(items.into_iter().map(to_toml).collect()),
		other => toml::Value::String(other.into_string()),
	}
}

/// Error for parsing TOML with transformed string values.
#[derive(Debug)]
pub enum Error {
	/// The input contains invalid UTF-8.
	InvalidUtf8(std::str::Utf8Error),

	/// An error occurred while parsing TOML.
	Toml(toml::de::Error),

	/// An error occurred while transforming a string value.
	Transform(crate::Error),
}

impl From<std::str::Utf8Error> for Error {
	#[inline]
	fn from(other: std::str::Utf8Error) -> Self {
		Self::InvalidUtf8(other)
	}
}

impl From<toml::de::Error> for Error {
	#[inline]
	fn from(other: toml::de::Error) -> Self {
		Self::Toml(other)
	}
}

impl From<crate::Error> for Error {
	#[inline]
	fn from(other: crate::Error) -> Self {
		Self::Transform(other)
	}
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
	#[inline]
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidUtf8(e) => std::fmt::Display::fmt(e, f),
			Self::Toml(e) => std::fmt::Display::fmt(e, f),
			Self::Transform(e) => std::fmt::Display::fmt(e, f),
		}
	}
}

/// Recursively apply a function to all string nodes in a TOML value.
fn visit_string_values<F, E>(value: &mut toml::Value, fun: F) -> Result<(), E>
where
	F: Copy + Fn(&mut toml::Value) -> Result<(), E>,
{
	match value {
		toml::Value::Boolean(_) => Ok(()),
		toml::Value::Integer(_) => Ok(()),
		toml::Value::Float(_) => Ok(()),
		toml::Value::Datetime(_) => Ok(()),
		toml::Value::String(_) => fun(value),
		toml::Value::Array(seq) => {
			for value in seq {
				visit_string_values(value, fun)?;
			}
			Ok(())
		},
		toml::Value::Table(map) => {
			for (_key, value) in map.iter_mut() {
				visit_string_values(value, fun)?;
			}
			Ok(())
		},
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use super::*;
	use assert2::{assert, let_assert};

	#[derive(Debug, serde::Deserialize)]
	struct Database {
		url: String,
		pool: i64,
		verbose: bool,
	}

	fn expander() -> Expander {
		let mut expander = Expander::new();
		expander.set("db", "inventory");
		expander.set("workers", 4);
		expander
	}

	#[test]
	fn test_from_str() {
		let_assert!(Ok(parsed) = from_str(
			concat!(
				"url = \"postgres://localhost/${db}\"\n",
				"pool = \"${workers * 2}\"\n",
				"verbose = \"${workers > 8}\"\n",
			),
			&expander(),
			TransformRules::EXPAND,
		));

		let parsed: Database = parsed;
		assert!(parsed.url == "postgres://localhost/inventory");
		assert!(parsed.pool == 8);
		assert!(!parsed.verbose);
	}

	#[test]
	fn test_toml_in_var_is_not_parsed() {
		let mut expander = expander();
		expander.set("db", "x\"\npool = 1");
		let_assert!(Ok(parsed) = from_slice(
			b"url = '${db}'\npool = 2\nverbose = true\n",
			&expander,
			TransformRules::EXPAND,
		));

		let parsed: Database = parsed;
		assert!(parsed.url == "x\"\npool = 1");
		assert!(parsed.pool == 2);
	}

	#[test]
	fn test_null_becomes_empty_string() {
		let mut value = toml::Value::String("${null}".into());
		let_assert!(Ok(()) = transform_string_values(&mut value, &expander(), TransformRules::EXPAND));
		assert!(value == toml::Value::String(String::new()));
	}

	#[test]
	fn test_invalid_utf8() {
		let_assert!(Err(Error::InvalidUtf8(_)) = from_slice::<Database, _>(b"url = \"\xff\"", &expander(), TransformRules::EXPAND));
	}
}

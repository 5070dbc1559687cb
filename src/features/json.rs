//! Support for transforming string values in JSON data.

use serde::de::DeserializeOwned;

use crate::grammar::Grammar;
use crate::{Expander, TransformRules, Value};

/// Parse a struct from JSON data, after transforming all string values.
///
/// This function first parses the data into a [`serde_json::Value`],
/// then transforms all string values with [`transform_string_values()`],
/// and then parses it further into the desired type.
pub fn from_slice<T, G>(data: &[u8], expander: &Expander<G>, rules: TransformRules) -> Result<T, Error>
where
	T: DeserializeOwned,
	G: Grammar,
{
	let mut value: serde_json::Value = serde_json::from_slice(data)?;
	transform_string_values(&mut value, expander, rules)?;
	Ok(T::deserialize(value)?)
}

/// Parse a struct from JSON data, after transforming all string values.
///
/// This function first parses the data into a [`serde_json::Value`],
/// then transforms all string values with [`transform_string_values()`],
/// and then parses it further into the desired type.
pub fn from_str<T, G>(data: &str, expander: &Expander<G>, rules: TransformRules) -> Result<T, Error>
where
	T: DeserializeOwned,
	G: Grammar,
{
	let mut value: serde_json::Value = serde_json::from_str(data)?;
	transform_string_values(&mut value, expander, rules)?;
	Ok(T::deserialize(value)?)
}

/// Transform all string values of a JSON value.
///
/// A string that is a single expression is replaced by the native JSON form of the result,
/// so `"${port}"` can become the number `8080`.
/// Object keys are left alone.
pub fn transform_string_values<G: Grammar>(
	value: &mut serde_json::Value,
	expander: &Expander<G>,
	rules: TransformRules,
) -> Result<(), crate::Error> {
	visit_string_values(value, |node| {
		if let serde_json::Value::String(text) = node {
			let result = expander.transform(Value::String(std::mem::take(text)), rules)?;
			*node = to_json(result);
		}
		Ok(())
	})
}

/// Convert a transformed value to JSON.
///
/// Decimals, GUIDs and objects have no lossless JSON form and become strings.
fn to_json(value: Value) -> serde_json::Value {
	match value {
		Value::Null => serde_json::Value::Null,
		Value::Bool(x) => serde_json::Value::Bool(x),
		Value::Int(x) => serde_json::Value::Number(x.into()),
		Value::Float(x) => serde_json::Number::from_f64(x).map_or(serde_json::Value::Null, serde_json::Value::Number),
		Value::String(x) => serde_json::Value::String(x),
		Value::List(items) => serde_json::Value::Array(items.into_iter().map(to_json).collect()),
		other => serde_json::Value::String(other.to_string()),
	}
}

/// Error for parsing JSON with transformed string values.
#[derive(Debug)]
pub enum Error {
	/// An error occurred while parsing JSON.
	Json(serde_json::Error),

	/// An error occurred while transforming a string value.
	Transform(crate::Error),
}

impl From<serde_json::Error> for Error {
	#[inline]
	fn from(other: serde_json::Error) -> Self {
		Self::Json(other)
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
			Self::Json(e) => std::fmt::Display::fmt(e, f),
			Self::Transform(e) => std::fmt::Display::fmt(e, f),
		}
	}
}

/// Recursively apply a function to all string nodes in a JSON value.
fn visit_string_values<F, E>(value: &mut serde_json::Value, fun: F) -> Result<(), E>
where
	F: Copy + Fn(&mut serde_json::Value) -> Result<(), E>,
{
	match value {
		serde_json::Value::Null => Ok(()),
		serde_json::Value::Bool(_) => Ok(()),
		serde_json::Value::Number(_) => Ok(()),
		serde_json::Value::String(_) => fun(value),
		serde_json::Value::Array(seq) => {
			for value in seq {
				visit_string_values(value, fun)?;
			}
			Ok(())
		},
		serde_json::Value::Object(map) => {
			for value in map.values_mut() {
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
	struct Server {
		host: String,
		port: u16,
		tls: bool,
	}

	fn expander() -> Expander {
		let mut expander = Expander::new();
		expander.set("host", "example.com");
		expander.set("port", 8080);
		expander
	}

	#[test]
	fn test_from_str() {
		let_assert!(Ok(parsed) = from_str(r#"
			{
				"host": "api.${host}",
				"port": "${port}",
				"tls": "${port == 443}"
			}"#,
			&expander(),
			TransformRules::EXPAND,
		));

		let parsed: Server = parsed;
		assert!(parsed.host == "api.example.com");
		assert!(parsed.port == 8080);
		assert!(parsed.tls == false);
	}

	#[test]
	fn test_from_slice_with_rules() {
		let_assert!(Ok(parsed) = from_slice(br#"{ "host": "  [host]  ", "port": 1, "tls": true }"#,
			&expander(),
			TransformRules::EXPAND_SQUARE | TransformRules::TRIM,
		));

		let parsed: Server = parsed;
		assert!(parsed.host == "example.com");
		assert!(parsed.port == 1);
		assert!(parsed.tls);
	}

	#[test]
	fn test_json_in_var_is_not_parsed() {
		let mut expander = expander();
		expander.set("host", "a\", \"port\": 1");
		let mut value = serde_json::json!({ "host": "${host}", "list": ["${port}", 2] });
		let_assert!(Ok(()) = transform_string_values(&mut value, &expander, TransformRules::EXPAND));
		assert!(value == serde_json::json!({ "host": "a\", \"port\": 1", "list": [8080, 2] }));
	}

	#[test]
	fn test_error() {
		let_assert!(Err(Error::Transform(crate::Error::NoSuchVariable(e))) = from_str::<Server, _>(
			r#"{ "host": "${nope}", "port": 1, "tls": true }"#,
			&expander(),
			TransformRules::EXPAND,
		));
		assert!(e.name == "nope");
	}
}

//! Support for transforming string values in YAML data.

use serde::de::DeserializeOwned;

use crate::grammar::Grammar;
use crate::{Expander, TransformRules, Value};

/// Parse a struct from YAML data, after transforming all string values.
///
/// This function first parses the data into a [`serde_yaml::Value`],
/// then transforms all string values with [`transform_string_values()`],
/// and then parses it further into the desired type.
pub fn from_slice<T, G>(data: &[u8], expander: &Expander<G>, rules: TransformRules) -> Result<T, Error>
where
	T: DeserializeOwned,
	G: Grammar,
{
	let mut value: serde_yaml::Value = serde_yaml::from_slice(data)?;
	transform_string_values(&mut value, expander, rules)?;
	Ok(serde_yaml::from_value(value)?)
}

/// Parse a struct from YAML data, after transforming all string values.
///
/// This function first parses the data into a [`serde_yaml::Value`],
/// then transforms all string values with [`transform_string_values()`],
/// and then parses it further into the desired type.
pub fn from_str<T, G>(data: &str, expander: &Expander<G>, rules: TransformRules) -> Result<T, Error>
where
	T: DeserializeOwned,
	G: Grammar,
{
	let mut value: serde_yaml::Value = serde_yaml::from_str(data)?;
	transform_string_values(&mut value, expander, rules)?;
	Ok(serde_yaml::from_value(value)?)
}

/// Transform all string values of a YAML value.
///
/// A string that is a single expression is replaced by the native YAML form of the result.
/// Mapping keys are left alone. Tagged values are transformed, but keep their tag.
pub fn transform_string_values<G: Grammar>(
	value: &mut serde_yaml::Value,
	expander: &Expander<G>,
	rules: TransformRules,
) -> Result<(), crate::Error> {
	visit_string_values(value, |node| {
		if let serde_yaml::Value::String(text) = node {
			let result = expander.transform(Value::String(std::mem::take(text)), rules)?;
			*node = to_yaml(result);
		}
		Ok(())
	})
}

fn to_yaml(value: Value) -> serde_yaml::Value {
	match value {
		Value::Null => serde_yaml::Value::Null,
		Value::Bool(x) => serde_yaml::Value::Bool(x),
		Value::Int(x) => serde_yaml::Value::Number(x.into()),
		Value::Float(x) => serde_yaml::Value::Number(x.into()),
		Value::String(x) => serde_yaml::Value::String(x),
		Value::List(items) => serde_yaml::Value::Sequence(items.into_iter().map(to_yaml).collect()),
		other => serde_yaml::Value::String(other.to_string()),
	}
}

/// Error for parsing YAML with transformed string values.
#[derive(Debug)]
pub enum Error {
	/// An error occurred while parsing YAML.
	Yaml(serde_yaml::Error),

	/// An error occurred while transforming a string value.
	Transform(crate::Error),
}

impl From<serde_yaml::Error> for Error {
	#[inline]
	fn from(other: serde_yaml::Error) -> Self {
		Self::Yaml(other)
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
			Error::Yaml(e) => std::fmt::Display::fmt(e, f),
			Error::Transform(e) => std::fmt::Display::fmt(e, f),
		}
	}
}

/// Recursively apply a function to all string nodes in a YAML value.
fn visit_string_values<F, E>(value: &mut serde_yaml::Value, fun: F) -> Result<(), E>
where
	F: Copy + Fn(&mut serde_yaml::Value) -> Result<(), E>,
{
	match value {
		serde_yaml::Value::Null => Ok(()),
		serde_yaml::Value::Bool(_) => Ok(()),
		serde_yaml::Value::Number(_) => Ok(()),
		serde_yaml::Value::String(_) => fun(value),
		serde_yaml::Value::Tagged(tagged) => visit_string_values(&mut tagged.value, fun),
		serde_yaml::Value::Sequence(seq) => {
			for value in seq {
				visit_string_values(value, fun)?;
			}
			Ok(())
		},
		serde_yaml::Value::Mapping(map) => {
			for (_key, value) in map.iter_mut() {
				visit_string_values(value, fun)?;
			}
			Ok(())
		},
	}
}

//! Variables and the case-insensitive variable store.

use indexmap::IndexMap;

use crate::dump::{pretty, DumpOptions};
use crate::error::{Error, NoSuchVariable};
use crate::Value;

/// A named value.
///
/// The identity of a variable is its name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variable {
	name: String,
	value: Value,
}

impl Variable {
	/// Create a new variable.
	pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
		}
	}

	/// Get the name of the variable, as it was spelled when the variable was created.
	#[inline]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Get the value of the variable.
	#[inline]
	pub fn value(&self) -> &Value {
		&self.value
	}

	/// Consume the variable to get the value.
	#[inline]
	pub fn into_value(self) -> Value {
		self.value
	}

	/// Append the stringified `value` to this variable.
	///
	/// The current value is converted to text first, unless it already is a string.
	/// Repeated appends keep extending the same string buffer.
	pub fn append(&mut self, value: &Value) {
		if !matches!(self.value, Value::String(_)) {
			self.value = Value::String(std::mem::take(&mut self.value).into_string());
		}
		if let Value::String(text) = &mut self.value {
			use std::fmt::Write;
			// Writing to a String can not fail.
			let _ = write!(text, "{value}");
		}
	}
}

/// An ordered map of variables with case-insensitive names.
///
/// Enumeration follows insertion order.
/// Cloning a store makes a deep copy, which is how nested execution scopes get their own variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
	variables: IndexMap<String, Variable>,
}

/// Normalize a variable name for lookup.
fn key(name: &str) -> String {
	name.to_lowercase()
}

impl VariableStore {
	/// Create an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Get the number of variables in the store.
	#[inline]
	pub fn len(&self) -> usize {
		self.variables.len()
	}

	/// Check if the store contains no variables.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.variables.is_empty()
	}

	/// Get the value of a variable, or an error if it is not set.
	pub fn get(&self, name: &str) -> Result<&Value, Error> {
		self.try_get(name).ok_or_else(|| {
			NoSuchVariable {
				name: name.to_owned(),
			}
			.into()
		})
	}

	/// Get the value of a variable, if it is set.
	pub fn try_get(&self, name: &str) -> Option<&Value> {
		self.variable(name).map(Variable::value)
	}

	/// Get the value of a variable, or `default` if it is not set.
	pub fn get_or(&self, name: &str, default: impl Into<Value>) -> Value {
		match self.try_get(name) {
			Some(value) => value.clone(),
			None => default.into(),
		}
	}

	/// Get the variable with the given name, if it is set.
	pub fn variable(&self, name: &str) -> Option<&Variable> {
		self.variables.get(&key(name))
	}

	/// Check if a variable is set.
	pub fn is_set(&self, name: &str) -> bool {
		self.variables.contains_key(&key(name))
	}

	/// Set a variable, replacing any previous variable with the same name.
	///
	/// A replaced variable keeps its position in the enumeration order, but takes the new spelling of the name.
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		let variable = Variable::new(name, value);
		self.variables.insert(key(variable.name()), variable);
	}

	/// Append the stringified value to a variable.
	///
	/// If the variable is not set yet, this behaves like [`Self::set()`].
	pub fn append(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		let name = name.into();
		let value = value.into();
		match self.variables.get_mut(&key(&name)) {
			Some(variable) => variable.append(&value),
			None => self.set(name, value),
		}
	}

	/// Remove a variable.
	///
	/// Returns `true` if the variable was set.
	pub fn remove(&mut self, name: &str) -> bool {
		self.variables.shift_remove(&key(name)).is_some()
	}

	/// Copy all variables from `other` into this store, replacing variables with the same name.
	pub fn merge<I, K, V>(&mut self, other: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Value>,
	{
		for (name, value) in other {
			self.set(name, value);
		}
	}

	/// Iterate over the variables in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
		self.variables.values().map(|x| (x.name(), x.value()))
	}

	/// Render all variables for debugging.
	///
	/// See [`Self::dump_filtered()`].
	pub fn dump(&self) -> String {
		self.dump_filtered(&DumpOptions::default(), |_| true)
	}

	/// Render the variables accepted by `filter` for debugging.
	///
	/// Variables are sorted by name, one per line, with the values aligned in a single column.
	pub fn dump_filtered<F>(&self, options: &DumpOptions, filter: F) -> String
	where
		F: Fn(&str) -> bool,
	{
		use unicode_width::UnicodeWidthStr;

		let mut variables: Vec<&Variable> = self.variables.values().filter(|x| filter(x.name())).collect();
		variables.sort_by(|a, b| key(a.name()).cmp(&key(b.name())));
		let width = variables.iter().map(|x| x.name().width()).max().unwrap_or(0);

		let mut output = String::new();
		for variable in variables {
			output.push_str(variable.name());
			output.push_str(&" ".repeat(width - variable.name().width()));
			output.push_str(" = ");
			output.push_str(&pretty(variable.value(), options));
			output.push('\n');
		}
		output
	}
}

impl<K, V> FromIterator<(K, V)> for VariableStore
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut store = Self::new();
		store.merge(iter);
		store
	}
}

impl<'a> IntoIterator for &'a VariableStore {
	type Item = (&'a str, &'a Value);
	type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

	fn into_iter(self) -> Self::IntoIter {
		Box::new(self.iter())
	}
}

use crate::error::{Error, MissingClosingDelimiter};
use crate::grammar::Grammar;
use crate::rules::TransformRules;
use crate::{text, Value};

use super::Expander;

impl<G: Grammar> Expander<G> {
	/// Transform a value according to a set of rules.
	///
	/// Null values and empty rules give back the value untouched.
	/// Primitives (numbers, booleans, decimals and GUIDs) are never expanded or trimmed,
	/// but the replacement rules still apply to their text.
	///
	/// The passes run in a fixed order:
	/// trimming when [`EXPAND_AFTER_TRIM`][TransformRules::EXPAND_AFTER_TRIM] is set,
	/// expansion of the regions selected by the highest priority expand selector,
	/// and finally the remaining trim and replacement rules on the whole text.
	///
	/// If expansion leaves a single non-string value and no rules remain, that value is returned as-is.
	pub fn transform(&self, value: Value, rules: TransformRules) -> Result<Value, Error> {
		if value.is_null() || rules.is_empty() {
			return Ok(value);
		}

		let mut rules = rules;
		let mut value = value;
		if value.is_primitive() {
			rules.remove(TransformRules::EXPAND_MASK | TransformRules::TRIM_MASK);
		}

		if rules.contains(TransformRules::EXPAND_AFTER_TRIM) {
			value = Value::String(text::apply(value.into_string(), rules & TransformRules::TRIM_MASK));
			rules.remove(TransformRules::EXPAND_AFTER_TRIM | TransformRules::TRIM_MASK);
			rules.insert(TransformRules::EXPAND);
		}

		if rules.expands() {
			value = match value {
				Value::String(source) => self.expand_with(&source, rules)?,
				other => self.expand_with(&other.into_string(), rules)?,
			};
		}

		// Rules applied per region are not applied to the whole text again.
		if rules.contains(TransformRules::EXPAND_REPLACE_ONLY) {
			rules.remove(TransformRules::REPLACE_MASK);
		}
		if rules.contains(TransformRules::EXPAND_TRIM_ONLY) {
			rules.remove(TransformRules::TRIM_MASK);
		}

		let remaining = rules & (TransformRules::TRIM_MASK | TransformRules::REPLACE_MASK);
		if !remaining.is_empty() {
			value = Value::String(text::apply(value.into_string(), remaining));
		}
		Ok(value)
	}

	/// Transform a value and convert the result to a string.
	///
	/// Null results become the empty string.
	pub fn transform_to_string(&self, value: impl Into<Value>, rules: TransformRules) -> Result<String, Error> {
		Ok(self.transform(value.into(), rules)?.into_string())
	}

	/// Expand `${...}` regions.
	///
	/// Shorthand for [`Self::transform()`] with [`TransformRules::EXPAND`].
	pub fn expand(&self, value: impl Into<Value>) -> Result<Value, Error> {
		self.transform(value.into(), TransformRules::EXPAND)
	}

	/// Expand `${...}` regions and convert the result to a string.
	pub fn expand_to_string(&self, value: impl Into<Value>) -> Result<String, Error> {
		self.transform_to_string(value, TransformRules::EXPAND)
	}
}

/// Check that every begin delimiter of the selected kinds is followed by a matching end delimiter.
///
/// All set expand selectors are checked, not just the one with the highest priority.
/// This is a purely textual check: the text between the delimiters is not parsed,
/// so it can be used to validate input before any variables are known.
///
/// The returned error points at the begin delimiter without a matching end.
pub fn assert_good_transform(text: &str, rules: TransformRules) -> Result<(), Error> {
	for delimiters in rules.all_delimiters() {
		let begin = delimiters.begin.as_bytes();
		let end = delimiters.end.as_bytes();
		let mut position = 0;
		while let Some(found) = memchr::memmem::find(&text.as_bytes()[position..], begin) {
			let start = position + found;
			let body = start + begin.len();
			match memchr::memmem::find(&text.as_bytes()[body..], end) {
				Some(offset) => position = body + offset + end.len(),
				None => {
					log::debug!("unbalanced {:?} at byte {start}", delimiters.begin);
					return Err(MissingClosingDelimiter {
						position: start,
						delimiter: delimiters.end,
					}
					.into());
				},
			}
		}
	}
	Ok(())
}

/// Check if the text contains the begin delimiter that [`Expander::transform()`] would expand.
///
/// Only the selector with the highest priority counts.
/// [`TransformRules::EXPAND_AFTER_TRIM`] implies [`TransformRules::EXPAND`].
pub fn contains_expressions(text: &str, rules: TransformRules) -> bool {
	let rules = if rules.contains(TransformRules::EXPAND_AFTER_TRIM) {
		rules | TransformRules::EXPAND
	} else {
		rules
	};
	match rules.delimiters() {
		Some(delimiters) => memchr::memmem::find(text.as_bytes(), delimiters.begin.as_bytes()).is_some(),
		None => false,
	}
}

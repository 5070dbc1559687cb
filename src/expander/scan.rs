use std::fmt::Write;

use crate::cursor::Cursor;
use crate::error::Error;
use crate::grammar::{self, Grammar};
use crate::rules::TransformRules;
use crate::{text, Value};

use super::Expander;

impl<G: Grammar> Expander<G> {
	/// Expand the delimited regions of `source` selected by `rules`.
	///
	/// Each region is parsed as a group of alternatives and replaced by the stringified result.
	/// If the whole source is exactly one region, the result keeps its type.
	///
	/// A begin delimiter directly followed by `{` or `[` is not a region:
	/// the delimiter is copied to the output and scanning continues with the next character.
	pub fn expand_with(&self, source: &str, rules: TransformRules) -> Result<Value, Error> {
		let Some(delimiters) = rules.delimiters() else {
			return Ok(Value::String(source.to_owned()));
		};
		if memchr::memmem::find(source.as_bytes(), delimiters.begin.as_bytes()).is_none() {
			return Ok(Value::String(source.to_owned()));
		}

		let scoped = rules.intersects(TransformRules::EXPAND_TRIM_ONLY | TransformRules::EXPAND_REPLACE_ONLY);
		let mut region_rules = TransformRules::empty();
		if rules.contains(TransformRules::EXPAND_TRIM_ONLY) {
			region_rules |= rules & TransformRules::TRIM_MASK;
		}
		if rules.contains(TransformRules::EXPAND_REPLACE_ONLY) {
			region_rules |= rules & TransformRules::REPLACE_MASK;
		}

		let begin = delimiters.begin.as_bytes();
		let mut output = String::with_capacity(source.len());
		let mut cursor = Cursor::new(source);
		let mut matched = 0;
		let mut whole = true;

		while let Some(c) = cursor.next_char() {
			if c.is_ascii() && c as u8 == begin[matched] {
				matched += 1;
				if matched < begin.len() {
					continue;
				}
			} else {
				output.push_str(&delimiters.begin[..matched]);
				output.push(c);
				matched = 0;
				whole = false;
				continue;
			}

			matched = 0;
			if matches!(cursor.peek(), Some('{' | '[')) {
				output.push_str(delimiters.begin);
				whole = false;
				continue;
			}

			let node = self.parse_region(&mut cursor, delimiters.end)?;
			let mut value = grammar::evaluate(&*node, self)?;
			if scoped {
				value = Value::String(text::apply(value.into_string(), region_rules));
			}
			cursor.skip_whitespace();
			cursor.expect_delimiter(delimiters.end)?;

			if whole && cursor.at_end() {
				log::trace!("{source:?} is a single region, keeping the {:?} result", value.kind());
				return Ok(value);
			}
			whole = false;
			// Writing to a String can not fail.
			let _ = write!(output, "{value}");
		}

		output.push_str(&delimiters.begin[..matched]);
		Ok(Value::String(output))
	}
}

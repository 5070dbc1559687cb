use serde::de::{Error, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{TransformRules, Value, VariableStore};

impl Serialize for Value {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Self::Null => serializer.serialize_unit(),
			Self::Bool(x) => serializer.serialize_bool(*x),
			Self::Int(x) => serializer.serialize_i64(*x),
			Self::Float(x) => serializer.serialize_f64(*x),
			Self::Decimal(x) => serializer.collect_str(x),
			Self::Guid(x) => serializer.collect_str(x),
			Self::String(x) => serializer.serialize_str(x),
			Self::List(x) => serializer.collect_seq(x),
			Self::Object(x) => serializer.collect_str(x),
		}
	}
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
	type Value = Value;

	fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
		formatter.write_str("null, a boolean, a number, a string or a sequence")
	}

	fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
		Ok(Value::Null)
	}

	fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
		Ok(Value::Null)
	}

	fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
	where
		D: Deserializer<'de>,
	{
		Value::deserialize(deserializer)
	}

	fn visit_bool<E: Error>(self, v: bool) -> Result<Self::Value, E> {
		Ok(Value::Bool(v))
	}

	fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
		Ok(Value::Int(v))
	}

	fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
		match i64::try_from(v) {
			Ok(v) => Ok(Value::Int(v)),
			Err(_) => Ok(Value::Float(v as f64)),
		}
	}

	fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
		Ok(Value::Float(v))
	}

	fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
		Ok(Value::String(v.to_owned()))
	}

	fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
		Ok(Value::String(v))
	}

	fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
	where
		A: SeqAccess<'de>,
	{
		let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
		while let Some(item) = seq.next_element()? {
			items.push(item);
		}
		Ok(Value::List(items))
	}
}

impl<'de> Deserialize<'de> for Value {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_any(ValueVisitor)
	}
}

impl Serialize for VariableStore {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_map(self.iter())
	}
}

struct VariableStoreVisitor;

impl<'de> Visitor<'de> for VariableStoreVisitor {
	type Value = VariableStore;

	fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
		formatter.write_str("a map of variable names to values")
	}

	fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
	where
		A: MapAccess<'de>,
	{
		let mut store = VariableStore::new();
		while let Some((name, value)) = map.next_entry::<String, Value>()? {
			store.set(name, value);
		}
		Ok(store)
	}
}

impl<'de> Deserialize<'de> for VariableStore {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_map(VariableStoreVisitor)
	}
}

/// Rules are serialized as readable names, like `"Expand, Trim"`.
impl Serialize for TransformRules {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_str(self)
	}
}

struct TransformRulesVisitor;

impl<'de> Visitor<'de> for TransformRulesVisitor {
	type Value = TransformRules;

	fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
		formatter.write_str("transform rule names, or a sequence of them")
	}

	fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
		v.parse().map_err(E::custom)
	}

	fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
	where
		A: SeqAccess<'de>,
	{
		let mut rules = TransformRules::empty();
		while let Some(name) = seq.next_element::<String>()? {
			rules |= name.parse::<TransformRules>().map_err(A::Error::custom)?;
		}
		Ok(rules)
	}
}

/// Rules can be deserialized from a string of names or from a sequence of names.
impl<'de> Deserialize<'de> for TransformRules {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_any(TransformRulesVisitor)
	}
}

#[cfg(test)]
#[rustfmt::skip]
mod test {
	use serde_test::{assert_de_tokens, assert_de_tokens_error, assert_ser_tokens, assert_tokens, Token};

	use crate::{TransformRules, Value, VariableStore};

	#[test]
	fn value_ser_de() {
		assert_tokens(&Value::Null, &[Token::Unit]);
		assert_tokens(&Value::Int(-4), &[Token::I64(-4)]);
		assert_tokens(&Value::from("text"), &[Token::Str("text")]);
		assert_tokens(&Value::from(vec![1, 2]), &[
			Token::Seq { len: Some(2) },
			Token::I64(1),
			Token::I64(2),
			Token::SeqEnd,
		]);
		assert_de_tokens(&Value::Int(7), &[Token::U8(7)]);
		assert_ser_tokens(&Value::Decimal("1.50".parse().unwrap()), &[Token::Str("1.50")]);
	}

	#[test]
	fn variable_store_ser_de() {
		let store: VariableStore = [("Name", Value::from("world")), ("count", Value::Int(2))].into_iter().collect();
		assert_tokens(&store, &[
			Token::Map { len: Some(2) },
			Token::Str("Name"),
			Token::Str("world"),
			Token::Str("count"),
			Token::I64(2),
			Token::MapEnd,
		]);
	}

	#[test]
	fn transform_rules_ser_de() {
		let rules = TransformRules::EXPAND | TransformRules::TRIM;
		assert_tokens(&rules, &[Token::Str("Expand, TrimStart, TrimEnd")]);
		assert_de_tokens(&rules, &[Token::Str("expand|trim")]);
		assert_de_tokens(&rules, &[
			Token::Seq { len: Some(2) },
			Token::Str("Expand"),
			Token::Str("Trim"),
			Token::SeqEnd,
		]);
		assert_de_tokens_error::<TransformRules>(&[Token::Str("Explode")], "Unknown transform rule: Explode");
	}
}

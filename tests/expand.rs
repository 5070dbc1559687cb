use assert2::{assert, check, let_assert};
use exsubst::{assert_good_transform, Delimiters, Error, Expander, TransformRules, Value, VariableStore};

#[test]
fn hello_world() {
	let mut expander = Expander::new();
	expander.set("name", "World");
	let_assert!(Ok(output) = expander.transform_to_string("Hello, ${name}!", TransformRules::EXPAND));
	assert!(output == "Hello, World!");
}

#[test]
fn whole_expression_keeps_type() {
	let expander = Expander::new();
	let_assert!(Ok(value) = expander.expand("${2+3}"));
	check!(value == Value::Int(5));
	let_assert!(Ok(value) = expander.expand("x=${2+3}"));
	check!(value == Value::from("x=5"));
}

#[test]
fn doubled_bracket_is_not_an_expression() {
	let expander = Expander::new();
	let_assert!(Ok(value) = expander.expand("${{foo}"));
	check!(value == Value::from("${{foo}"));
}

#[test]
fn unbalanced_delimiters() {
	let_assert!(Err(Error::MissingClosingDelimiter(e)) = assert_good_transform("${missing_close", TransformRules::EXPAND));
	check!(e.delimiter == "}");
	check!(let Ok(()) = assert_good_transform("${ok}", TransformRules::EXPAND));

	let_assert!(Err(e) = assert_good_transform("[[a] b", TransformRules::EXPAND_DUAL_SQUARE));
	check!(e.to_string() == "Missing closing delimiter: ']]'");
}

#[test]
fn delimiter_priority() {
	let rules = TransformRules::EXPAND_DUAL | TransformRules::EXPAND_SQUARE;
	check!(rules.delimiters() == Some(Delimiters::DUAL));
	check!(Delimiters::DUAL.begin == "${{");
	check!(Delimiters::DUAL.end == "}}");

	let mut expander = Expander::new();
	expander.set("a", 1);
	let_assert!(Ok(output) = expander.transform_to_string("[a] ${{a}}", rules));
	check!(output == "[a] 1");
}

#[test]
fn append() {
	let mut store = VariableStore::new();
	store.set("a", "x");
	store.append("a", "y");
	let_assert!(Ok(value) = store.get("a"));
	check!(*value == Value::from("xy"));
}

#[test]
fn repeated_expressions_are_parsed_once() {
	let mut expander = Expander::new();
	expander.set("n", 20);
	let_assert!(Ok(first) = expander.eval("n / 4 + 1"));
	let_assert!(Ok(second) = expander.eval("n / 4 + 1"));
	check!(first == Value::Int(6));
	check!(first == second);

	let stats = expander.cache_stats();
	check!(stats.misses == 1);
	check!(stats.hits == 1);
}

#[test]
fn calculated_keys() {
	let expander = Expander::new();
	let_assert!(Ok(Some(value)) = expander.try_get_value("3"));
	check!(value == Value::Int(3));
	let_assert!(Ok(Some(value)) = expander.try_get_value("=1+1"));
	check!(value == Value::Int(2));
}

#[test]
fn trim_before_expand() {
	let mut expander = Expander::new();
	expander.set("x", 42);
	let rules = TransformRules::EXPAND_AFTER_TRIM | TransformRules::TRIM_START | TransformRules::TRIM_END;
	let_assert!(Ok(value) = expander.transform(Value::from("  ${x}  "), rules));
	check!(value == Value::Int(42));

	let rules: TransformRules = "TrimBeforeExpand, Trim".parse().unwrap();
	let_assert!(Ok(value) = expander.transform(Value::from("\t${x}\n"), rules));
	check!(value == Value::Int(42));
}

#[test]
fn closer_inside_string_literal() {
	let expander = Expander::new();
	let_assert!(Ok(value) = expander.expand("${'}'}"));
	check!(value == Value::from("}"));
	let_assert!(Ok(output) = expander.expand_to_string("<${'a}b' + '}'}>"));
	check!(output == "<a}b}>");
}

#[test]
fn alternatives_fall_through() {
	let mut expander = Expander::new();
	let_assert!(Ok(value) = expander.expand("${a|b|'c'}"));
	check!(value == Value::from("c"));

	expander.set("b", Value::Null);
	let_assert!(Ok(value) = expander.expand("${a|b|'c'}"));
	check!(value == Value::from("c"));

	expander.set("b", "bee");
	let_assert!(Ok(value) = expander.expand("${a|b|'c'}"));
	check!(value == Value::from("bee"));
}

#[test]
fn primitives_bypass_trimming() {
	let expander = Expander::new();
	let_assert!(Ok(value) = expander.transform(Value::Int(5), TransformRules::TRIM | TransformRules::EXPAND));
	check!(value == Value::Int(5));
}

#[test]
fn replace_only_in_expanded_regions() {
	let mut expander = Expander::new();
	expander.set("q", "it's");
	let rules = TransformRules::EXPAND | TransformRules::EXPAND_REPLACE_ONLY | TransformRules::DOUBLE_SINGLE_QUOTES;
	let_assert!(Ok(output) = expander.transform_to_string("SELECT 'x' WHERE y = '${q}'", rules));
	check!(output == "SELECT 'x' WHERE y = 'it''s'");
}

#[test]
fn dump_sorts_and_aligns() {
	let mut store = VariableStore::new();
	store.set("zeta", 1);
	store.set("Alpha", "a");
	store.set("mid_name", Value::Null);
	check!(store.dump() == concat!(
		"Alpha    = \"a\"\n",
		"mid_name = (null)\n",
		"zeta     = 1\n",
	));
}

#[test]
fn errors_point_at_the_problem() {
	let expander = Expander::new();
	let source = "value: ${1 + }";
	let_assert!(Err(e) = expander.expand(source));
	let_assert!(Error::Syntax(syntax) = &e);
	check!(syntax.position == 13);
	check!(e.source_highlighting(source) == concat!(
		"  value: ${1 + }\n",
		"               ^\n",
	));
}

#[test]
fn scoped_expanders() {
	let mut parent = Expander::new();
	parent.set("depth", 0);

	for i in 1..=2 {
		let mut child = Expander::with_variables(parent.variables().clone());
		child.set("depth", i);
		let_assert!(Ok(value) = child.expand("${depth}"));
		check!(value == Value::Int(i));
	}
	let_assert!(Ok(value) = parent.expand("${depth}"));
	check!(value == Value::Int(0));
}

#[test]
fn deep_nesting_is_an_error() {
	let expander = Expander::new();
	let source = format!("${{{}1{}}}", "(".repeat(5_000), ")".repeat(5_000));
	let_assert!(Err(Error::Syntax(e)) = expander.expand(source.as_str()));
	check!(e.message == "expression nested too deeply");

	let source = format!("${{{}1}}", "-".repeat(200_000));
	let_assert!(Err(Error::Syntax(_)) = expander.expand(source.as_str()));

	let source = format!("${{{}1{}}}", "(-".repeat(400), ")".repeat(400));
	let_assert!(Ok(value) = expander.expand(source.as_str()));
	check!(value == Value::Int(1));
}

#[test]
fn extreme_number_literals() {
	let expander = Expander::new();
	let_assert!(Ok(value) = expander.eval("-9223372036854775808"));
	check!(value == Value::Int(i64::MIN));
	let_assert!(Err(Error::Syntax(e)) = expander.eval("1e400"));
	check!(e.message == "invalid number literal: 1e400");
}

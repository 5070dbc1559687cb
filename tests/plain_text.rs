//! Text without a begin delimiter for the active rules comes back unchanged.

use exsubst::{Expander, TransformRules, Value};
use proptest::prelude::*;

fn expander() -> Expander {
	let mut expander = Expander::new();
	expander.set("x", 1);
	expander
}

proptest! {
	#[test]
	fn expand_keeps_plain_text(text in any::<String>().prop_filter("no ${", |s| !s.contains("${"))) {
		let expanded = expander().expand(text.as_str());
		prop_assert!(matches!(&expanded, Ok(Value::String(x)) if *x == text));
	}

	#[test]
	fn square_expand_keeps_plain_text(text in "[^\\[]*") {
		let expanded = expander().transform_to_string(text.as_str(), TransformRules::EXPAND_SQUARE);
		prop_assert!(matches!(&expanded, Ok(x) if *x == text));
	}

	#[test]
	fn dollar_signs_without_braces_are_literal(text in "[a-z $}]*") {
		let expanded = expander().expand_to_string(text.as_str());
		prop_assert!(matches!(&expanded, Ok(x) if *x == text));
	}

	#[test]
	fn dual_rules_ignore_single_regions(name in "[a-z]{1,8}") {
		let text = format!("${{{name}}}");
		let expanded = expander().transform_to_string(text.as_str(), TransformRules::EXPAND_DUAL);
		prop_assert!(matches!(&expanded, Ok(x) if *x == text));
	}
}

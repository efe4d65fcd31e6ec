//! Built-in providers.
//!
//! - [`text`]: whitespace, case and character clean-up for string values
//! - [`list`]: clean-up for list values
//!
//! Both are plain [`Provider`]s; register them like any other.

use normkit_model::Value;

use crate::provider::Provider;

/// String normalization capabilities.
///
/// Most capabilities forward to the value operation of the same name.
/// `trim` is `lstrip | rstrip`, `ltrim`/`rtrim` alias `lstrip`/`rstrip`, and
/// `blank_to_null` turns whitespace-only strings into `Null`.
pub fn text() -> Provider {
    let mut text = Provider::new("text");
    for name in [
        "capitalize",
        "chomp",
        "delete",
        "downcase",
        "replace",
        "reverse",
        "squeeze",
        "strip",
        "swapcase",
        "upcase",
    ] {
        text.forward(name);
    }

    let lstrip = text.forward("lstrip");
    let rstrip = text.forward("rstrip");
    text.existing("ltrim", lstrip.as_transform());
    text.existing("rtrim", rstrip.as_transform());
    text.existing("trim", lstrip.as_transform() | rstrip.as_transform());

    text.process("blank_to_null", |value, _| match value {
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        other => Ok(other),
    });
    text
}

/// List normalization capabilities.
pub fn list() -> Provider {
    let mut list = Provider::new("list");
    for name in ["compact", "join", "sort", "uniq"] {
        list.forward(name);
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(provider: &Provider, name: &str, args: &[Value], value: Value) -> Value {
        provider
            .unit(name, args)
            .and_then(|unit| unit.resolve())
            .and_then(|resolved| resolved.call(value))
            .unwrap()
    }

    #[test]
    fn trim_strips_both_ends() {
        let text = text();
        assert_eq!(
            run(&text, "trim", &[], Value::from("  a b  ")),
            Value::from("a b")
        );
        assert_eq!(
            text.unit("ltrim", &[]).unwrap().owner_label(),
            "text#lstrip"
        );
    }

    #[test]
    fn blank_to_null_only_touches_blank_strings() {
        let text = text();
        assert_eq!(run(&text, "blank_to_null", &[], Value::from("  ")), Value::Null);
        assert_eq!(
            run(&text, "blank_to_null", &[], Value::from(" x ")),
            Value::from(" x ")
        );
    }

    #[test]
    fn list_join_binds_separator() {
        let list = list();
        let value = Value::from(vec!["b", "a", "b"]);
        let unique = run(&list, "uniq", &[], value);
        assert_eq!(
            run(&list, "join", &[Value::from(",")], unique),
            Value::from("b,a")
        );
    }
}

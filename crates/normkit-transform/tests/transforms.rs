//! Tests for unit composition and currying.

use normkit_model::Value;
use normkit_transform::builtin;
use normkit_transform::{Composable, Provider, Unit};

fn apply(composable: impl Into<Composable>, value: &str) -> Value {
    let composable: Composable = composable.into();
    composable
        .resolve()
        .and_then(|resolved| resolved.call(Value::from(value)))
        .unwrap()
}

fn text_unit(text: &Provider, name: &str) -> Composable {
    text.unit(name, &[]).unwrap()
}

#[test]
fn test_upcase_then_squeeze() {
    let text = builtin::text();
    let upcase = text_unit(&text, "upcase");
    let squeeze = text.unit("squeeze", &[Value::from(" ")]).unwrap();

    let pipeline = upcase | squeeze;

    assert_eq!(pipeline.len(), 2);
    assert_eq!(apply(pipeline, "  hello   world  "), Value::from(" HELLO WORLD "));
}

#[test]
fn test_grouping_does_not_change_result() {
    let text = builtin::text();
    let (a, b, c) = (
        text_unit(&text, "lstrip"),
        text_unit(&text, "upcase"),
        text_unit(&text, "reverse"),
    );

    let left = (a.clone() | b.clone()) | c.clone();
    let right = a | (b | c);

    assert_eq!(left.len(), 3);
    assert_eq!(right.len(), 3);
    assert_eq!(apply(left, "  abc"), Value::from("CBA"));
    assert_eq!(apply(right, "  abc"), Value::from("CBA"));
}

#[test]
fn test_with_no_arguments_behaves_like_the_bare_unit() {
    let text = builtin::text();
    let lstrip = text_unit(&text, "lstrip");
    let derived = lstrip.with(&[]);

    assert_eq!(apply(lstrip, "  a  "), apply(derived, "  a  "));
}

#[test]
fn test_currying_appends_parent_arguments() {
    let text = builtin::text();
    let replace = text_unit(&text, "replace");

    // `replace(from, to)`: bind `to` first, then `from`.
    let to_dash = replace.with(&[Value::from("-")]);
    let space_to_dash = to_dash.with(&[Value::from(" ")]);

    assert_eq!(apply(space_to_dash, "a b c"), Value::from("a-b-c"));
    assert!(
        to_dash.resolve().is_ok(),
        "binding more arguments leaves the parent usable"
    );
}

#[test]
fn test_unit_debug_output() {
    let text = builtin::text();
    let squeeze = text.unit("squeeze", &[Value::from(" ")]).unwrap();
    insta::assert_snapshot!(format!("{squeeze:?}"), @r#"#<Unit owner unknown (text#squeeze with [" "])>"#);

    let trim = text_unit(&text, "trim");
    insta::assert_snapshot!(
        format!("{trim:?}"),
        @"#<Sequence text#trim [#<Unit text#lstrip>, #<Unit text#rstrip>]>"
    );
}

#[test]
fn test_custom_unit_errors_propagate() {
    let failing = Unit::new(|value, _| value.send("upcase", &[]));
    let composable: Composable = failing.into();
    let resolved = composable.resolve().unwrap();

    let err = resolved.call(Value::from(1)).unwrap_err();
    assert_eq!(err.to_string(), "`upcase' is not supported for integer values");
}

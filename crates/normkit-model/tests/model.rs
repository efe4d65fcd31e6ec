//! Tests for normkit-model types.

use normkit_model::{NormkitError, Value};

#[test]
fn value_deserializes_untagged_json() {
    let value: Value =
        serde_json::from_str(r#"["  Alice ", 3, 2.5, null, true]"#).expect("parse value");
    assert_eq!(
        value,
        Value::List(vec![
            Value::from("  Alice "),
            Value::Integer(3),
            Value::Float(2.5),
            Value::Null,
            Value::Bool(true),
        ])
    );
}

#[test]
fn value_serializes_as_plain_json() {
    let value = Value::from(vec![Value::from("a"), Value::Null]);
    let json = serde_json::to_string(&value).expect("serialize value");
    assert_eq!(json, r#"["a",null]"#);
}

#[test]
fn error_messages_name_the_unit() {
    assert_eq!(
        NormkitError::unit_not_defined("undefined_method").to_string(),
        "`undefined_method' unit is not defined"
    );
    assert_eq!(
        NormkitError::BlockNotGiven.to_string(),
        "`block' unit cannot be used if a block is not given"
    );
}

#[test]
fn load_errors_keep_the_loader_message() {
    let err = NormkitError::Load(anyhow::anyhow!("cannot load such file -- nkf"));
    assert_eq!(err.to_string(), "cannot load such file -- nkf");
}

#[test]
fn send_forwards_to_string_operations() {
    let value = Value::from("  hello   world  ")
        .send("upcase", &[])
        .and_then(|v| v.send("squeeze", &[Value::from(" ")]))
        .expect("send");
    assert_eq!(value, Value::from(" HELLO WORLD "));
}

#[test]
fn to_s_on_null_is_empty() {
    assert_eq!(Value::Null.send("to_s", &[]).unwrap(), Value::from(""));
    assert!(Value::Null.send("upcase", &[]).is_err());
}

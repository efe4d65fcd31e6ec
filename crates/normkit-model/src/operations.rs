//! Named operations that values answer to.
//!
//! Forwarding units call [`Value::send`] with their own name (or an explicit
//! target) and their captured arguments. Operation names follow the usual
//! string-normalization vocabulary: `strip`, `squeeze`, `upcase` and so on.

use std::collections::BTreeSet;

use crate::error::{NormkitError, Result};
use crate::value::Value;

impl Value {
    /// Invoke the operation `operation` on this value with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`NormkitError::UnsupportedOperation`] when the value kind has
    /// no such operation and [`NormkitError::InvalidArgument`] when the
    /// arguments do not fit it.
    pub fn send(self, operation: &str, args: &[Value]) -> Result<Value> {
        match self {
            Value::String(s) => send_string(s, operation, args),
            Value::List(items) => send_list(items, operation, args),
            Value::Integer(_) | Value::Float(_) => send_number(self, operation, args),
            Value::Null if operation == "to_s" => {
                expect_arity(operation, args, 0)?;
                Ok(Value::String(String::new()))
            }
            other => Err(unsupported(operation, &other)),
        }
    }
}

fn send_string(s: String, operation: &str, args: &[Value]) -> Result<Value> {
    let out = match operation {
        "upcase" => {
            expect_arity(operation, args, 0)?;
            s.to_uppercase()
        }
        "downcase" => {
            expect_arity(operation, args, 0)?;
            s.to_lowercase()
        }
        "capitalize" => {
            expect_arity(operation, args, 0)?;
            capitalize(&s)
        }
        "swapcase" => {
            expect_arity(operation, args, 0)?;
            s.chars().flat_map(swap_char).collect()
        }
        "strip" => {
            expect_arity(operation, args, 0)?;
            s.trim_matches(is_strippable).to_string()
        }
        "lstrip" => {
            expect_arity(operation, args, 0)?;
            s.trim_start_matches(is_strippable).to_string()
        }
        "rstrip" => {
            expect_arity(operation, args, 0)?;
            s.trim_end_matches(is_strippable).to_string()
        }
        "squeeze" => {
            expect_arity(operation, args, 1)?;
            let only = optional_str(operation, args, 0)?.map(char_set);
            squeeze(&s, only.as_ref())
        }
        "chomp" => {
            expect_arity(operation, args, 1)?;
            match optional_str(operation, args, 0)? {
                Some(suffix) => s.strip_suffix(suffix).unwrap_or(&s).to_string(),
                None => chomp_newline(&s).to_string(),
            }
        }
        "reverse" => {
            expect_arity(operation, args, 0)?;
            s.chars().rev().collect()
        }
        "delete" => {
            expect_arity(operation, args, 1)?;
            let set = char_set(required_str(operation, args, 0)?);
            s.chars().filter(|c| !set.contains(c)).collect()
        }
        "replace" => {
            expect_arity(operation, args, 2)?;
            let from = required_str(operation, args, 0)?;
            let to = required_str(operation, args, 1)?;
            if from.is_empty() {
                return Err(NormkitError::invalid_argument(
                    operation,
                    "pattern must not be empty",
                ));
            }
            s.replace(from, to)
        }
        "length" => {
            expect_arity(operation, args, 0)?;
            return Ok(Value::Integer(s.chars().count() as i64));
        }
        "to_s" => {
            expect_arity(operation, args, 0)?;
            s
        }
        "to_i" => {
            expect_arity(operation, args, 0)?;
            return s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| NormkitError::invalid_argument(operation, e.to_string()));
        }
        "to_f" => {
            expect_arity(operation, args, 0)?;
            return s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| NormkitError::invalid_argument(operation, e.to_string()));
        }
        _ => return Err(unsupported(operation, &Value::String(s))),
    };
    Ok(Value::String(out))
}

fn send_list(mut items: Vec<Value>, operation: &str, args: &[Value]) -> Result<Value> {
    match operation {
        "compact" => {
            expect_arity(operation, args, 0)?;
            items.retain(|v| !v.is_null());
            Ok(Value::List(items))
        }
        "uniq" => {
            expect_arity(operation, args, 0)?;
            let mut seen: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !seen.contains(&item) {
                    seen.push(item);
                }
            }
            Ok(Value::List(seen))
        }
        "sort" => {
            expect_arity(operation, args, 0)?;
            // `compare` is not transitive across mixed kinds
            let comparable = items.iter().enumerate().all(|(idx, a)| {
                items[idx + 1..].iter().all(|b| a.compare(b).is_some())
            });
            if !comparable {
                return Err(NormkitError::invalid_argument(
                    operation,
                    "list holds values that cannot be ordered",
                ));
            }
            items.sort_by(|a, b| a.compare(b).unwrap_or(std::cmp::Ordering::Equal));
            Ok(Value::List(items))
        }
        "reverse" => {
            expect_arity(operation, args, 0)?;
            items.reverse();
            Ok(Value::List(items))
        }
        "join" => {
            expect_arity(operation, args, 1)?;
            let separator = optional_str(operation, args, 0)?.unwrap_or("");
            let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
            Ok(Value::String(parts.join(separator)))
        }
        "first" => {
            expect_arity(operation, args, 0)?;
            Ok(items.into_iter().next().unwrap_or_default())
        }
        "last" => {
            expect_arity(operation, args, 0)?;
            Ok(items.pop().unwrap_or_default())
        }
        "length" => {
            expect_arity(operation, args, 0)?;
            Ok(Value::Integer(items.len() as i64))
        }
        _ => Err(unsupported(operation, &Value::List(items))),
    }
}

fn send_number(value: Value, operation: &str, args: &[Value]) -> Result<Value> {
    expect_arity(operation, args, 0)?;
    let out = match (operation, &value) {
        ("abs", Value::Integer(i)) => match i.checked_abs() {
            Some(abs) => Value::Integer(abs),
            None => return Err(NormkitError::invalid_argument(operation, "integer overflow")),
        },
        ("abs", Value::Float(f)) => Value::Float(f.abs()),
        ("round" | "to_i", Value::Integer(i)) => Value::Integer(*i),
        ("round", Value::Float(f)) => Value::Integer(f.round() as i64),
        ("to_i", Value::Float(f)) => Value::Integer(f.trunc() as i64),
        ("to_f", _) => Value::Float(value.as_f64().unwrap_or_default()),
        ("to_s", _) => Value::String(value.to_string()),
        _ => return Err(unsupported(operation, &value)),
    };
    Ok(out)
}

fn unsupported(operation: &str, value: &Value) -> NormkitError {
    NormkitError::UnsupportedOperation {
        operation: operation.to_string(),
        kind: value.kind(),
    }
}

fn expect_arity(operation: &str, args: &[Value], max: usize) -> Result<()> {
    if args.len() > max {
        return Err(NormkitError::invalid_argument(
            operation,
            format!("expects at most {max} argument(s), got {}", args.len()),
        ));
    }
    Ok(())
}

fn optional_str<'a>(operation: &str, args: &'a [Value], idx: usize) -> Result<Option<&'a str>> {
    match args.get(idx) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(NormkitError::invalid_argument(
            operation,
            format!("expected a string argument, got {}", other.kind()),
        )),
    }
}

fn required_str<'a>(operation: &str, args: &'a [Value], idx: usize) -> Result<&'a str> {
    optional_str(operation, args, idx)?.ok_or_else(|| {
        NormkitError::invalid_argument(operation, format!("missing argument {}", idx + 1))
    })
}

fn is_strippable(c: char) -> bool {
    c.is_whitespace() || c == '\0'
}

fn char_set(chars: &str) -> BTreeSet<char> {
    chars.chars().collect()
}

fn squeeze(s: &str, only: Option<&BTreeSet<char>>) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous: Option<char> = None;
    for c in s.chars() {
        let squeezable = only.is_none_or(|set| set.contains(&c));
        if squeezable && previous == Some(c) {
            continue;
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

fn chomp_newline(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .or_else(|| s.strip_suffix('\r'))
        .unwrap_or(s)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn swap_char(c: char) -> Vec<char> {
    if c.is_uppercase() {
        c.to_lowercase().collect()
    } else if c.is_lowercase() {
        c.to_uppercase().collect()
    } else {
        vec![c]
    }
}

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span};

use normkit_core::{NormalizationState, Pipeline, Record, RuleOptions};
use normkit_model::Value;
use normkit_transform::{Composable, EnvironmentType, Registry, builtin};

/// Attribute name the `apply` command normalizes.
const ATTRIBUTE: &str = "value";

/// A unit named on the command line: `NAME` or `NAME=ARG[,ARG...]`.
///
/// Commas inside quoted strings and brackets do not separate arguments.
/// Arguments that parse as JSON (numbers, booleans, quoted strings, lists)
/// are passed as such; anything else is passed as a plain string.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSpec {
    pub name: String,
    pub args: Vec<Value>,
}

impl FromStr for UnitSpec {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let (name, args) = match raw.split_once('=') {
            Some((name, args)) => (name, split_arguments(args).map(parse_value).collect()),
            None => (raw, Vec::new()),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("`{raw}' does not name a unit"));
        }
        Ok(Self {
            name: name.to_string(),
            args,
        })
    }
}

/// Split on commas outside JSON strings, lists and objects.
fn split_arguments(raw: &str) -> impl Iterator<Item = &str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in raw.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&raw[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&raw[start..]);
    pieces.into_iter()
}

/// JSON when it parses, the raw text otherwise.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw))
}

/// Options for [`apply`].
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Context tag the rule is restricted to.
    pub on: Option<String>,
    /// Context to normalize under.
    pub context: Option<String>,
}

/// Single-attribute host the `apply` command runs values through.
#[derive(Debug, Clone)]
pub struct Input {
    value: Value,
    state: NormalizationState,
}

impl Input {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            state: NormalizationState::default(),
        }
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Record for Input {
    fn has_reader(name: &str) -> bool {
        name == ATTRIBUTE
    }

    fn has_writer(name: &str) -> bool {
        name == ATTRIBUTE
    }

    fn read(&self, _name: &str) -> Value {
        self.value.clone()
    }

    fn write(&mut self, _name: &str, value: Value) {
        self.value = value;
    }

    fn normalization(&self) -> &NormalizationState {
        &self.state
    }

    fn normalization_mut(&mut self) -> &mut NormalizationState {
        &mut self.state
    }
}

/// A registry holding the built-in `text` and `list` providers.
pub fn builtin_registry() -> Arc<Registry> {
    let registry = Arc::new(Registry::new());
    registry.register([Arc::new(builtin::text()), Arc::new(builtin::list())]);
    registry
}

/// One rule on `value` composing `units` left to right.
pub fn build_pipeline(
    registry: Arc<Registry>,
    units: &[UnitSpec],
    on: Option<&str>,
) -> Result<Pipeline<Input>> {
    let Some((first, rest)) = units.split_first() else {
        bail!("at least one unit is required");
    };

    let mut options = RuleOptions::new();
    if let Some(tag) = on {
        options = options.on(tag);
    }

    let mut pipeline = Pipeline::with_registry(registry);
    pipeline
        .declare(&[ATTRIBUTE], options, |env| {
            let mut transform = env.call(&first.name, &first.args)?;
            for spec in rest {
                let next = env.call(&spec.name, &spec.args)?;
                transform = Composable::from(transform | next);
            }
            Ok(transform)
        })
        .context("build unit chain")?;
    debug!(pipeline = ?pipeline, "built pipeline");
    Ok(pipeline)
}

/// Normalize each value through `units`, in order.
pub fn apply(
    registry: Arc<Registry>,
    units: &[UnitSpec],
    values: Vec<Value>,
    options: &ApplyOptions,
) -> Result<Vec<Value>> {
    let span = info_span!("apply", units = units.len(), values = values.len());
    let _guard = span.enter();

    let pipeline = build_pipeline(registry, units, options.on.as_deref())?;
    let mut normalized = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        let input = pipeline
            .normalize(&Input::new(value), options.context.as_deref())
            .with_context(|| format!("normalize value #{}", idx + 1))?;
        normalized.push(input.into_value());
    }
    info!(count = normalized.len(), "normalized values");
    Ok(normalized)
}

/// A row of the `units` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRow {
    pub capability: String,
    pub provider: String,
    pub transform: String,
}

/// Capabilities per provider, providers in registration order.
pub fn unit_rows(kind: &EnvironmentType) -> Vec<UnitRow> {
    kind.providers()
        .iter()
        .flat_map(|provider| {
            provider.capabilities().map(|capability| UnitRow {
                capability: capability.name().to_string(),
                provider: provider.name().to_string(),
                transform: capability.as_transform().owner_label(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_bound_units() {
        let bare: UnitSpec = "strip".parse().unwrap();
        assert_eq!(bare.name, "strip");
        assert!(bare.args.is_empty());

        let bound: UnitSpec = "replace=-, ".parse().unwrap();
        assert_eq!(bound.name, "replace");
        assert_eq!(bound.args, vec![Value::from("-"), Value::from(" ")]);
    }

    #[test]
    fn json_arguments_keep_their_kind() {
        let spec: UnitSpec = "round=2".parse().unwrap();
        assert_eq!(spec.args, vec![Value::Integer(2)]);

        let spec: UnitSpec = r#"squeeze=" ""#.parse().unwrap();
        assert_eq!(spec.args, vec![Value::from(" ")]);
    }

    #[test]
    fn quoted_and_bracketed_commas_stay_in_one_argument() {
        let spec: UnitSpec = r#"replace=",",";""#.parse().unwrap();
        assert_eq!(spec.args, vec![Value::from(","), Value::from(";")]);

        let spec: UnitSpec = r#"join=", ""#.parse().unwrap();
        assert_eq!(spec.args, vec![Value::from(", ")]);

        let spec: UnitSpec = r#"replace="\",",[1,2]"#.parse().unwrap();
        assert_eq!(
            spec.args,
            vec![
                Value::from("\","),
                Value::List(vec![Value::Integer(1), Value::Integer(2)]),
            ]
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = "=x".parse::<UnitSpec>().unwrap_err();
        assert_eq!(err, "`=x' does not name a unit");
    }
}

//! Atomic transformation units.
//!
//! A [`Unit`] wraps a processing function `f(value, args) -> value` together
//! with the arguments it has captured. Binding more arguments with
//! [`Unit::with`] never touches the receiver: it returns a derived unit that
//! remembers the receiver as its parent, and the parent chain's arguments are
//! appended after the derived unit's own when the unit runs.

use std::fmt;
use std::sync::{Arc, OnceLock};

use normkit_model::{Result, Value};

use crate::composable::Composable;
use crate::requirements::Requirements;
use crate::sequence::Sequence;

/// Processing function shared by a unit and every unit derived from it.
pub type Process = Arc<dyn Fn(Value, &[Value]) -> Result<Value> + Send + Sync>;

/// Wrap a closure as a [`Process`].
pub fn process<F>(f: F) -> Process
where
    F: Fn(Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The `(scope, name)` a unit was defined under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub scope: String,
    pub name: String,
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.scope, self.name)
    }
}

/// Write-once ownership slot shared by units and sequences.
#[derive(Debug, Default)]
pub(crate) struct Ownership(OnceLock<Owner>);

impl Ownership {
    /// Claim ownership. Returns `false` if an owner was already recorded.
    pub(crate) fn claim(&self, scope: &str, name: &str) -> bool {
        self.0
            .set(Owner {
                scope: scope.to_string(),
                name: name.to_string(),
            })
            .is_ok()
    }

    pub(crate) fn get(&self) -> Option<&Owner> {
        self.0.get()
    }

    pub(crate) fn label(&self) -> String {
        self.get()
            .map_or_else(|| "owner unknown".to_string(), ToString::to_string)
    }
}

/// A value transformation resolved down to a single callable.
pub struct Resolved(Box<dyn Fn(Value) -> Result<Value> + Send + Sync>);

impl Resolved {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }

    /// Apply the transformation to `value`.
    pub fn call(&self, value: Value) -> Result<Value> {
        (self.0)(value)
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolved")
    }
}

/// An atomic, composable transformation.
///
/// Units are cheap to clone; clones share the same identity (and ownership
/// slot).
#[derive(Clone)]
pub struct Unit {
    inner: Arc<UnitInner>,
}

struct UnitInner {
    process: Process,
    arguments: Vec<Value>,
    parent: Option<Unit>,
    requirements: Option<Arc<Requirements>>,
    ownership: Ownership,
}

impl Unit {
    /// Create a unit without requirements from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::from_process(Arc::new(f), None)
    }

    /// Create a unit from a shared process, optionally tied to requirements
    /// that must be loaded before it runs.
    pub fn from_process(process: Process, requirements: Option<Arc<Requirements>>) -> Self {
        Self::build(process, Vec::new(), None, requirements)
    }

    fn build(
        process: Process,
        arguments: Vec<Value>,
        parent: Option<Unit>,
        requirements: Option<Arc<Requirements>>,
    ) -> Self {
        Self {
            inner: Arc::new(UnitInner {
                process,
                arguments,
                parent,
                requirements,
                ownership: Ownership::default(),
            }),
        }
    }

    /// Derive a unit bound to `args`. The receiver is left untouched and
    /// becomes the parent of the returned unit.
    pub fn with(&self, args: &[Value]) -> Unit {
        Self::build(
            Arc::clone(&self.inner.process),
            args.to_vec(),
            Some(self.clone()),
            self.inner.requirements.clone(),
        )
    }

    /// Arguments captured by this unit itself (not its parents).
    pub fn arguments(&self) -> &[Value] {
        &self.inner.arguments
    }

    /// The unit this one was derived from, if any.
    pub fn parent(&self) -> Option<&Unit> {
        self.inner.parent.as_ref()
    }

    pub fn requirements(&self) -> Option<&Arc<Requirements>> {
        self.inner.requirements.as_ref()
    }

    /// Own arguments followed by those of every ancestor, nearest first.
    pub fn bound_arguments(&self) -> Vec<Value> {
        let mut args = self.inner.arguments.clone();
        let mut ancestor = self.parent();
        while let Some(unit) = ancestor {
            args.extend(unit.arguments().iter().cloned());
            ancestor = unit.parent();
        }
        args
    }

    /// Resolve into a callable, loading any outstanding requirements first.
    pub fn resolve(&self) -> Result<Resolved> {
        if let Some(requirements) = &self.inner.requirements {
            requirements.ensure_loaded()?;
        }
        let process = Arc::clone(&self.inner.process);
        let args = self.bound_arguments();
        Ok(Resolved::new(move |value| process(value, &args)))
    }

    /// Record the owner of this unit. Only the first call has any effect.
    pub fn owned_by(&self, scope: &str, name: &str) -> bool {
        self.inner.ownership.claim(scope, name)
    }

    pub fn is_owned(&self) -> bool {
        self.inner.ownership.get().is_some()
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.inner.ownership.get()
    }

    /// `"scope#name"`, or `"owner unknown"` for anonymous units.
    pub fn owner_label(&self) -> String {
        self.inner.ownership.label()
    }

    /// Whether both handles point at the same unit.
    pub fn ptr_eq(&self, other: &Unit) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Compose `self` followed by `other`.
    pub fn then(&self, other: impl Into<Composable>) -> Sequence {
        Composable::from(self).then(other)
    }

    /// Compose `other` followed by `self`.
    pub fn after(&self, other: impl Into<Composable>) -> Sequence {
        Composable::from(self).after(other)
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Unit {}", self.owner_label())?;
        if let Some(parent) = self.parent() {
            write!(
                f,
                " ({} with [{}])",
                parent.owner_label(),
                inspect_values(self.arguments())
            )?;
        }
        f.write_str(">")
    }
}

pub(crate) fn inspect_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| match value {
            Value::String(s) => format!("{s:?}"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append() -> Unit {
        Unit::new(|value, args| {
            let mut out = value.as_str().unwrap_or_default().to_string();
            for arg in args {
                out.push_str(arg.as_str().unwrap_or_default());
            }
            Ok(Value::String(out))
        })
    }

    #[test]
    fn with_does_not_mutate_receiver() {
        let unit = append();
        let derived = unit.with(&[Value::from("!")]);

        assert!(unit.arguments().is_empty());
        assert!(derived.parent().is_some_and(|p| p.ptr_eq(&unit)));
        assert_eq!(
            derived.resolve().unwrap().call(Value::from("a")).unwrap(),
            Value::from("a!")
        );
        assert_eq!(
            unit.resolve().unwrap().call(Value::from("a")).unwrap(),
            Value::from("a")
        );
    }

    #[test]
    fn own_arguments_come_before_inherited_ones() {
        let derived = append().with(&[Value::from("1")]).with(&[Value::from("2")]);
        assert_eq!(
            derived.bound_arguments(),
            vec![Value::from("2"), Value::from("1")]
        );
        assert_eq!(
            derived.resolve().unwrap().call(Value::from("x")).unwrap(),
            Value::from("x21")
        );
    }

    #[test]
    fn ownership_is_set_once() {
        let unit = append();
        assert_eq!(unit.owner_label(), "owner unknown");
        assert!(unit.owned_by("text", "append"));
        assert!(!unit.owned_by("other", "name"));
        assert_eq!(unit.owner_label(), "text#append");
    }

    #[test]
    fn debug_shows_parent_and_arguments() {
        let unit = append();
        unit.owned_by("text", "append");
        let derived = unit.with(&[Value::from(" "), Value::from(2)]);
        assert_eq!(format!("{unit:?}"), "#<Unit text#append>");
        assert_eq!(
            format!("{derived:?}"),
            r#"#<Unit owner unknown (text#append with [" ", 2])>"#
        );
    }
}

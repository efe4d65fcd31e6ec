//! Flat, ordered compositions of units.

use std::fmt;
use std::sync::Arc;

use normkit_model::{Result, Value};

use crate::composable::Composable;
use crate::unit::{Owner, Ownership, Resolved, Unit};

/// An ordered composition of units that behaves as a single transform.
///
/// Sequences never nest: composing two sequences concatenates their units,
/// which is what makes composition associative.
#[derive(Clone)]
pub struct Sequence {
    inner: Arc<SequenceInner>,
}

struct SequenceInner {
    units: Vec<Unit>,
    ownership: Ownership,
}

impl Sequence {
    pub fn new(units: Vec<Unit>) -> Self {
        Self {
            inner: Arc::new(SequenceInner {
                units,
                ownership: Ownership::default(),
            }),
        }
    }

    pub fn units(&self) -> &[Unit] {
        &self.inner.units
    }

    pub fn len(&self) -> usize {
        self.inner.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.units.is_empty()
    }

    /// Bind `args` to every element, each producing its own derived unit.
    pub fn with(&self, args: &[Value]) -> Sequence {
        Sequence::new(self.units().iter().map(|unit| unit.with(args)).collect())
    }

    /// Resolve every element and thread values through them left to right.
    pub fn resolve(&self) -> Result<Resolved> {
        let steps = self
            .units()
            .iter()
            .map(Unit::resolve)
            .collect::<Result<Vec<_>>>()?;
        Ok(Resolved::new(move |value| {
            steps.iter().try_fold(value, |acc, step| step.call(acc))
        }))
    }

    pub fn owned_by(&self, scope: &str, name: &str) -> bool {
        self.inner.ownership.claim(scope, name)
    }

    pub fn is_owned(&self) -> bool {
        self.inner.ownership.get().is_some()
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.inner.ownership.get()
    }

    pub fn owner_label(&self) -> String {
        self.inner.ownership.label()
    }

    pub fn then(&self, other: impl Into<Composable>) -> Sequence {
        Composable::from(self).then(other)
    }

    pub fn after(&self, other: impl Into<Composable>) -> Sequence {
        Composable::from(self).after(other)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self
            .units()
            .iter()
            .map(|unit| format!("{unit:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "#<Sequence {} [{units}]>", self.owner_label())
    }
}

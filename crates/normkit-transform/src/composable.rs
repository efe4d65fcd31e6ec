//! The composition algebra over units and sequences.
//!
//! `a | b` and `a >> b` both mean "`a`, then `b`"; `a << b` means "`b`, then
//! `a`". Every composition yields a flat [`Sequence`].

use std::ops::{BitOr, Shl, Shr};

use normkit_model::{Result, Value};

use crate::sequence::Sequence;
use crate::unit::{Owner, Resolved, Unit};

/// Either a single unit or a sequence of them.
#[derive(Debug, Clone)]
pub enum Composable {
    Unit(Unit),
    Sequence(Sequence),
}

impl Composable {
    /// The units this composable contributes to a composition.
    pub fn units(&self) -> &[Unit] {
        match self {
            Self::Unit(unit) => std::slice::from_ref(unit),
            Self::Sequence(sequence) => sequence.units(),
        }
    }

    pub fn with(&self, args: &[Value]) -> Composable {
        match self {
            Self::Unit(unit) => Self::Unit(unit.with(args)),
            Self::Sequence(sequence) => Self::Sequence(sequence.with(args)),
        }
    }

    pub fn then(&self, other: impl Into<Composable>) -> Sequence {
        let other: Composable = other.into();
        Sequence::new(self.units().iter().chain(other.units()).cloned().collect())
    }

    pub fn after(&self, other: impl Into<Composable>) -> Sequence {
        let other: Composable = other.into();
        other.then(self)
    }

    pub fn resolve(&self) -> Result<Resolved> {
        match self {
            Self::Unit(unit) => unit.resolve(),
            Self::Sequence(sequence) => sequence.resolve(),
        }
    }

    pub fn owned_by(&self, scope: &str, name: &str) -> bool {
        match self {
            Self::Unit(unit) => unit.owned_by(scope, name),
            Self::Sequence(sequence) => sequence.owned_by(scope, name),
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owner().is_some()
    }

    pub fn owner(&self) -> Option<&Owner> {
        match self {
            Self::Unit(unit) => unit.owner(),
            Self::Sequence(sequence) => sequence.owner(),
        }
    }

    pub fn owner_label(&self) -> String {
        match self {
            Self::Unit(unit) => unit.owner_label(),
            Self::Sequence(sequence) => sequence.owner_label(),
        }
    }
}

impl From<Unit> for Composable {
    fn from(unit: Unit) -> Self {
        Self::Unit(unit)
    }
}

impl From<&Unit> for Composable {
    fn from(unit: &Unit) -> Self {
        Self::Unit(unit.clone())
    }
}

impl From<Sequence> for Composable {
    fn from(sequence: Sequence) -> Self {
        Self::Sequence(sequence)
    }
}

impl From<&Sequence> for Composable {
    fn from(sequence: &Sequence) -> Self {
        Self::Sequence(sequence.clone())
    }
}

impl From<&Composable> for Composable {
    fn from(composable: &Composable) -> Self {
        composable.clone()
    }
}

macro_rules! composition_operators {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<R: Into<Composable>> BitOr<R> for $ty {
                type Output = Sequence;

                fn bitor(self, rhs: R) -> Sequence {
                    Composable::from(self).then(rhs)
                }
            }

            impl<R: Into<Composable>> Shr<R> for $ty {
                type Output = Sequence;

                fn shr(self, rhs: R) -> Sequence {
                    Composable::from(self).then(rhs)
                }
            }

            impl<R: Into<Composable>> Shl<R> for $ty {
                type Output = Sequence;

                fn shl(self, rhs: R) -> Sequence {
                    Composable::from(self).after(rhs)
                }
            }
        )*
    };
}

composition_operators!(Unit, Sequence, Composable);

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(label: &'static str) -> Unit {
        let unit = Unit::new(move |value, _| {
            let mut s = value.into_string().unwrap_or_default();
            s.push_str(label);
            Ok(Value::String(s))
        });
        unit.owned_by("test", label);
        unit
    }

    fn run(composable: impl Into<Composable>) -> Value {
        let composable: Composable = composable.into();
        composable
            .resolve()
            .and_then(|resolved| resolved.call(Value::from("")))
            .unwrap()
    }

    #[test]
    fn composition_flattens() {
        let (a, b, c) = (tag("a"), tag("b"), tag("c"));
        let left = (a.clone() | b.clone()) | c.clone();
        let right = a.clone() | (b.clone() | c.clone());

        assert_eq!(left.len(), 3);
        assert_eq!(right.len(), 3);
        for (l, r) in left.units().iter().zip(right.units()) {
            assert!(l.ptr_eq(r));
        }
        assert_eq!(run(left), Value::from("abc"));
        assert_eq!(run(right), Value::from("abc"));
    }

    #[test]
    fn shift_operators_mirror_each_other() {
        let (a, b) = (tag("a"), tag("b"));
        assert_eq!(run(a.clone() >> b.clone()), Value::from("ab"));
        assert_eq!(run(a.clone() << b.clone()), Value::from("ba"));
        assert_eq!(run(a.after(&b)), Value::from("ba"));
    }

    #[test]
    fn sequence_with_distributes_arguments() {
        let echo = Unit::new(|value, args| {
            let mut s = value.into_string().unwrap_or_default();
            for arg in args {
                s.push_str(&arg.to_string());
            }
            Ok(Value::String(s))
        });
        let sequence = echo.clone() | echo.clone();
        let bound = sequence.with(&[Value::from(1)]);

        assert_eq!(bound.len(), 2);
        assert!(bound.units().iter().all(|u| u.parent().is_some()));
        assert_eq!(run(bound), Value::from("11"));
        assert_eq!(run(sequence), Value::from(""));
    }

    #[test]
    fn empty_sequence_is_identity() {
        assert_eq!(
            Sequence::new(Vec::new())
                .resolve()
                .unwrap()
                .call(Value::from("x"))
                .unwrap(),
            Value::from("x")
        );
    }
}

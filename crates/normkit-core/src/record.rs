//! The host contract.
//!
//! Normalization reads and writes attributes through [`Record`] and keeps its
//! per-instance bookkeeping in a [`NormalizationState`] the host stores.

use normkit_model::Value;

/// How a host instance was last normalized.
///
/// A host normalized without a context counts as normalized under every
/// context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NormalizationState {
    #[default]
    Unnormalized,
    Normalized { context: Option<String> },
}

impl NormalizationState {
    /// True iff normalized and the recorded context is unset or equals
    /// `context`.
    pub fn is_normalized(&self, context: Option<&str>) -> bool {
        match self {
            Self::Unnormalized => false,
            Self::Normalized { context: None } => true,
            Self::Normalized {
                context: Some(recorded),
            } => context == Some(recorded.as_str()),
        }
    }

    /// The recorded context, if normalized under one.
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Normalized { context } => context.as_deref(),
            Self::Unnormalized => None,
        }
    }

    pub fn mark(&mut self, context: Option<&str>) {
        *self = Self::Normalized {
            context: context.map(str::to_string),
        };
    }
}

/// An object whose attributes can be normalized.
///
/// `has_reader` / `has_writer` describe the type, not an instance; they are
/// checked when rules are declared. `read` and `write` are only ever called
/// with names that passed both checks.
pub trait Record: Clone {
    fn has_reader(name: &str) -> bool;

    fn has_writer(name: &str) -> bool;

    fn read(&self, name: &str) -> Value;

    fn write(&mut self, name: &str, value: Value);

    fn normalization(&self) -> &NormalizationState;

    fn normalization_mut(&mut self) -> &mut NormalizationState;
}

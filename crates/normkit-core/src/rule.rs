//! Normalization rules.
//!
//! A [`Rule`] binds a composed transform to the conditions under which it
//! runs: an optional context tag and an optional predicate over the host.

use std::fmt;
use std::sync::Arc;

use normkit_model::{NormkitError, Result, Value};
use normkit_transform::Composable;

/// Predicate over the host deciding whether a rule applies.
pub type Predicate<H> = Arc<dyn Fn(&H) -> bool + Send + Sync>;

/// Host applicability of a rule.
pub enum Condition<H> {
    Always,
    When(Predicate<H>),
    Unless(Predicate<H>),
}

impl<H> Condition<H> {
    pub fn holds_for(&self, host: &H) -> bool {
        match self {
            Self::Always => true,
            Self::When(predicate) => predicate(host),
            Self::Unless(predicate) => !predicate(host),
        }
    }
}

/// Options recognized when declaring a rule.
///
/// # Example
///
/// ```ignore
/// let options = RuleOptions::new()
///     .on("import")
///     .when(|person: &Person| person.active);
/// ```
pub struct RuleOptions<H> {
    on: Option<String>,
    when: Option<Predicate<H>>,
    unless: Option<Predicate<H>>,
}

impl<H> RuleOptions<H> {
    pub fn new() -> Self {
        Self {
            on: None,
            when: None,
            unless: None,
        }
    }

    /// Restrict the rule to the context `tag`.
    pub fn on(mut self, tag: impl Into<String>) -> Self {
        self.on = Some(tag.into());
        self
    }

    /// Apply the rule only to hosts for which `predicate` holds.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&H) -> bool + Send + Sync + 'static,
    {
        self.when = Some(Arc::new(predicate));
        self
    }

    /// Apply the rule only to hosts for which `predicate` does not hold.
    pub fn unless<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&H) -> bool + Send + Sync + 'static,
    {
        self.unless = Some(Arc::new(predicate));
        self
    }

    fn into_parts(self) -> Result<(Option<String>, Condition<H>)> {
        let condition = match (self.when, self.unless) {
            (Some(_), Some(_)) => {
                return Err(NormkitError::configuration(
                    "`when' and `unless' cannot be given together",
                ));
            }
            (Some(predicate), None) => Condition::When(predicate),
            (None, Some(predicate)) => Condition::Unless(predicate),
            (None, None) => Condition::Always,
        };
        Ok((self.on, condition))
    }
}

impl<H> Default for RuleOptions<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// A composed transform plus the conditions it runs under.
pub struct Rule<H> {
    transform: Composable,
    condition: Condition<H>,
    context: Option<String>,
}

impl<H> Rule<H> {
    pub fn new(transform: Composable, options: RuleOptions<H>) -> Result<Self> {
        let (context, condition) = options.into_parts()?;
        Ok(Self {
            transform,
            condition,
            context,
        })
    }

    pub fn transform(&self) -> &Composable {
        &self.transform
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn condition(&self) -> &Condition<H> {
        &self.condition
    }

    /// Whether the host passes the rule's predicate.
    pub fn applies_to(&self, host: &H) -> bool {
        self.condition.holds_for(host)
    }

    /// Whether the rule runs when `context` is requested.
    pub fn runs_at(&self, context: Option<&str>) -> bool {
        self.context.is_none() || self.context.as_deref() == context
    }

    /// Run the rule's transform over `value`.
    pub fn normalize(&self, value: Value) -> Result<Value> {
        self.transform.resolve()?.call(value)
    }
}

impl<H> fmt::Debug for Rule<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let condition = match self.condition {
            Condition::Always => "always",
            Condition::When(_) => "when",
            Condition::Unless(_) => "unless",
        };
        f.debug_struct("Rule")
            .field("transform", &self.transform)
            .field("context", &self.context)
            .field("condition", &condition)
            .finish()
    }
}

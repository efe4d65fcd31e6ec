//! Per-attribute normalization pipelines.
//!
//! A [`Pipeline`] maps attribute names to the ordered rules declared for
//! them. Rules are built inside a fresh [`Environment`] from the pipeline's
//! registry and run in declaration order; later rules see the output of
//! earlier ones.
//!
//! # Example
//!
//! ```ignore
//! let mut pipeline = Pipeline::<Person>::new();
//! pipeline.declare(&["name"], RuleOptions::new().on("import"), |env| {
//!     Ok(env.unit("upcase")? | env.bind("squeeze", &[Value::from(" ")])?)
//! })?;
//!
//! let person = pipeline.normalize(&person, Some("import"))?;
//! ```

use std::fmt;
use std::sync::Arc;

use normkit_model::{NormkitError, Result, Value};
use normkit_transform::{Composable, Environment, Process, Registry};
use tracing::{debug, debug_span, trace};

use crate::record::Record;
use crate::rule::{Rule, RuleOptions};

/// Ordered rules per attribute for the host type `H`.
pub struct Pipeline<H> {
    registry: Arc<Registry>,
    attributes: Vec<(String, Vec<Arc<Rule<H>>>)>,
}

impl<H: Record> Pipeline<H> {
    /// A pipeline building against the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(Registry::global())
    }

    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            attributes: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Declare a rule built by `build` for every name in `attributes`.
    pub fn declare<F, C>(
        &mut self,
        attributes: &[&str],
        options: RuleOptions<H>,
        build: F,
    ) -> Result<()>
    where
        F: FnOnce(&Environment) -> Result<C>,
        C: Into<Composable>,
    {
        self.declare_rule(attributes, options, Some(build), None)
    }

    /// Like [`Pipeline::declare`], with `block` available to `build` as the
    /// `block` capability.
    pub fn declare_with_block<F, C>(
        &mut self,
        attributes: &[&str],
        options: RuleOptions<H>,
        build: F,
        block: Process,
    ) -> Result<()>
    where
        F: FnOnce(&Environment) -> Result<C>,
        C: Into<Composable>,
    {
        self.declare_rule(attributes, options, Some(build), Some(block))
    }

    /// Declare a rule whose transform is `block` alone.
    pub fn declare_block(
        &mut self,
        attributes: &[&str],
        options: RuleOptions<H>,
        block: Process,
    ) -> Result<()> {
        self.declare_rule(
            attributes,
            options,
            None::<fn(&Environment) -> Result<Composable>>,
            Some(block),
        )
    }

    /// Declare a rule from a build closure, a block, or both.
    ///
    /// # Errors
    ///
    /// [`NormkitError::Configuration`] when neither `build` nor `block` is
    /// given, when no attribute is named, when an attribute lacks a reader
    /// or a writer, or when the options are contradictory. Errors raised
    /// while building (such as [`NormkitError::UnitNotDefined`]) are
    /// returned as is. Nothing is appended on error.
    pub fn declare_rule<F, C>(
        &mut self,
        attributes: &[&str],
        options: RuleOptions<H>,
        build: Option<F>,
        block: Option<Process>,
    ) -> Result<()>
    where
        F: FnOnce(&Environment) -> Result<C>,
        C: Into<Composable>,
    {
        if build.is_none() && block.is_none() {
            return Err(NormkitError::configuration(
                "a build closure or a block is required to declare a normalizer",
            ));
        }
        if attributes.is_empty() {
            return Err(NormkitError::configuration(
                "at least one attribute must be named",
            ));
        }
        for name in attributes {
            if !H::has_reader(name) {
                return Err(NormkitError::configuration(format!(
                    "`{name}' has no reader"
                )));
            }
            if !H::has_writer(name) {
                return Err(NormkitError::configuration(format!(
                    "`{name}' has no writer"
                )));
            }
        }

        let transform = {
            let env = self.registry.instantiate(block);
            match build {
                Some(build) => build(&env)?.into(),
                None => env.block()?,
            }
        };
        let rule = Arc::new(Rule::new(transform, options)?);
        debug!(attributes = ?attributes, rule = ?rule, "declared rule");

        for name in attributes {
            match self.attributes.iter_mut().find(|(attr, _)| attr == name) {
                Some((_, rules)) => rules.push(Arc::clone(&rule)),
                None => self
                    .attributes
                    .push(((*name).to_string(), vec![Arc::clone(&rule)])),
            }
        }
        Ok(())
    }

    /// Rules declared for `name`, in declaration order.
    pub fn rules(&self, name: &str) -> &[Arc<Rule<H>>] {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, rules)| rules.as_slice())
            .unwrap_or_default()
    }

    /// Declared attribute names, in first-declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The normalized value of `name` on `host` under `context`.
    ///
    /// `Null` values are returned untouched. Rules whose predicate or
    /// context does not match are skipped.
    pub fn attribute(&self, host: &H, name: &str, context: Option<&str>) -> Result<Value> {
        let Some((_, rules)) = self.attributes.iter().find(|(attr, _)| attr == name) else {
            return Err(NormkitError::configuration(format!(
                "`{name}' has no normalizers declared"
            )));
        };

        let mut value = host.read(name);
        if value.is_null() {
            return Ok(value);
        }
        for (idx, rule) in rules.iter().enumerate() {
            if !rule.applies_to(host) || !rule.runs_at(context) {
                trace!(attribute = %name, rule = idx, "rule skipped");
                continue;
            }
            value = rule.normalize(value)?;
            trace!(attribute = %name, rule = idx, "rule applied");
        }
        Ok(value)
    }

    /// A normalized copy of `host`; `host` itself is untouched.
    pub fn normalize(&self, host: &H, context: Option<&str>) -> Result<H> {
        let mut copy = host.clone();
        self.normalize_in_place(&mut copy, context)?;
        Ok(copy)
    }

    /// Normalize every declared attribute of `host` and record `context`.
    ///
    /// Does nothing if `host` is already normalized under `context`. On
    /// error `host` is left exactly as it was.
    pub fn normalize_in_place(&self, host: &mut H, context: Option<&str>) -> Result<()> {
        if host.normalization().is_normalized(context) {
            trace!(context = ?context, "already normalized");
            return Ok(());
        }
        let _span = debug_span!("normalize", context = ?context).entered();

        let mut staged = host.clone();
        for (name, _) in &self.attributes {
            let value = self.attribute(&staged, name, context)?;
            staged.write(name, value);
        }
        staged.normalization_mut().mark(context);
        *host = staged;
        debug!(attributes = self.attributes.len(), "normalized");
        Ok(())
    }

    pub fn is_normalized(&self, host: &H, context: Option<&str>) -> bool {
        host.normalization().is_normalized(context)
    }
}

impl<H: Record> Default for Pipeline<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for Pipeline<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, rules) in &self.attributes {
            map.entry(name, rules);
        }
        map.finish()
    }
}

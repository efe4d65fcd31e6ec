//! Capability providers.
//!
//! A [`Provider`] is a named collection of capabilities. Capabilities are
//! declared in one of three ways (see [`Definition`]) and every unit a
//! provider creates shares the provider's [`Requirements`].
//!
//! # Example
//!
//! ```ignore
//! let mut text = Provider::new("text");
//! let lstrip = text.forward("lstrip");
//! let rstrip = text.forward("rstrip");
//! text.existing("trim", lstrip.as_transform() | rstrip.as_transform());
//! text.process("shout", |value, _| value.send("upcase", &[]));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use normkit_model::{NormkitError, Result, Value};
use tracing::debug;

use crate::composable::Composable;
use crate::requirements::{Loader, Requirements};
use crate::unit::{Process, Unit};

/// How a capability's transform is obtained.
pub enum Definition {
    /// Forward the value to the value operation of the same name.
    Forward,
    /// Forward the value to the named value operation.
    ForwardTo(String),
    /// Reuse an existing unit or sequence.
    Existing(Composable),
    /// Wrap a custom processing function.
    Process(Process),
}

/// A transform registered under a name on a provider.
///
/// A capability is both "the transform" ([`Capability::as_transform`]) and a
/// way to get a parameterized one ([`Capability::bind`]).
#[derive(Debug, Clone)]
pub struct Capability {
    name: String,
    provider: String,
    transform: Composable,
}

impl Capability {
    pub(crate) fn new(name: &str, provider: &str, transform: Composable) -> Self {
        Self {
            name: name.to_string(),
            provider: provider.to_string(),
            transform,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The bare transform, for further composition.
    pub fn as_transform(&self) -> Composable {
        self.transform.clone()
    }

    /// A transform derived from this capability with `args` bound.
    pub fn bind(&self, args: &[Value]) -> Composable {
        self.transform.with(args)
    }

    /// Bare transform when `args` is empty, bound transform otherwise.
    pub fn call(&self, args: &[Value]) -> Composable {
        if args.is_empty() {
            self.as_transform()
        } else {
            self.bind(args)
        }
    }
}

/// A named set of capabilities that can be registered with a
/// [`Registry`](crate::registry::Registry).
///
/// The provider name is its identity inside a registry.
#[derive(Debug)]
pub struct Provider {
    name: String,
    requirements: Arc<Requirements>,
    capabilities: BTreeMap<String, Capability>,
}

impl Provider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: Arc::new(Requirements::new()),
            capabilities: BTreeMap::new(),
        }
    }

    /// Use `loader` to satisfy this provider's requirements.
    pub fn with_loader(self, loader: impl Loader + 'static) -> Self {
        self.requirements.set_loader(Arc::new(loader));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirements(&self) -> &Arc<Requirements> {
        &self.requirements
    }

    /// Declare external requirements that must be loaded before any of this
    /// provider's units run.
    pub fn requires<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements.add(names);
    }

    /// Declare the capability `name`. A later definition under the same name
    /// replaces the earlier one.
    pub fn define(&mut self, name: impl Into<String>, definition: Definition) -> Capability {
        let name = name.into();
        let transform = match definition {
            Definition::Forward => self.forwarding_unit(&name).into(),
            Definition::ForwardTo(target) => self.forwarding_unit(&target).into(),
            Definition::Existing(composable) => composable,
            Definition::Process(process) => {
                Unit::from_process(process, Some(Arc::clone(&self.requirements))).into()
            }
        };
        if !transform.is_owned() {
            transform.owned_by(&self.name, &name);
        }
        debug!(provider = %self.name, capability = %name, owner = %transform.owner_label(), "defined capability");

        let capability = Capability {
            name: name.clone(),
            provider: self.name.clone(),
            transform,
        };
        self.capabilities.insert(name, capability.clone());
        capability
    }

    /// Forward to the value operation named like the capability.
    pub fn forward(&mut self, name: impl Into<String>) -> Capability {
        self.define(name, Definition::Forward)
    }

    /// Forward to the value operation `target`.
    pub fn forward_to(&mut self, name: impl Into<String>, target: impl Into<String>) -> Capability {
        self.define(name, Definition::ForwardTo(target.into()))
    }

    pub fn existing(
        &mut self,
        name: impl Into<String>,
        composable: impl Into<Composable>,
    ) -> Capability {
        self.define(name, Definition::Existing(composable.into()))
    }

    pub fn process<F>(&mut self, name: impl Into<String>, f: F) -> Capability
    where
        F: Fn(Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.define(name, Definition::Process(Arc::new(f)))
    }

    fn forwarding_unit(&self, operation: &str) -> Unit {
        let operation = operation.to_string();
        Unit::from_process(
            Arc::new(move |value: Value, args: &[Value]| value.send(&operation, args)),
            Some(Arc::clone(&self.requirements)),
        )
    }

    /// Look up a capability defined on this provider.
    pub fn capability(&self, name: &str) -> Result<&Capability> {
        self.capabilities
            .get(name)
            .ok_or_else(|| NormkitError::unit_not_defined(name))
    }

    /// Provider-level access with the bare/bound behavior of
    /// [`Capability::call`].
    pub fn unit(&self, name: &str, args: &[Value]) -> Result<Composable> {
        self.capability(name).map(|capability| capability.call(args))
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.values()
    }

    /// Capability names in sorted order.
    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }
}

//! The capability registry.
//!
//! A [`Registry`] keeps the set of registered providers and publishes an
//! immutable [`EnvironmentType`] snapshot of them. Every register/unregister
//! builds a new snapshot and swaps it in under a write lock, so readers see
//! either the old snapshot or the new one. Environments instantiated from an
//! old snapshot keep it.
//!
//! # Thread Safety
//!
//! Writers hold the write lock across read, rebuild and publish; readers only
//! clone the published `Arc`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::environment::{BLOCK, Environment};
use crate::provider::{Capability, Provider};
use crate::unit::Process;

/// An immutable snapshot of the capabilities visible to composition code.
#[derive(Debug)]
pub struct EnvironmentType {
    providers: Vec<Arc<Provider>>,
    table: HashMap<String, Capability>,
}

impl EnvironmentType {
    /// Snapshot with only the baseline `block` capability.
    pub fn empty() -> Self {
        Self::build(Vec::new())
    }

    /// Resolve `providers` into a name table. On a clash the provider
    /// registered first wins.
    fn build(providers: Vec<Arc<Provider>>) -> Self {
        let mut table: HashMap<String, Capability> = HashMap::new();
        for provider in &providers {
            for capability in provider.capabilities() {
                if let Some(existing) = table.get(capability.name()) {
                    warn!(
                        capability = %capability.name(),
                        kept = %existing.provider(),
                        ignored = %provider.name(),
                        "capability defined by more than one provider"
                    );
                    continue;
                }
                if capability.name() == BLOCK {
                    warn!(provider = %provider.name(), "capability shadows the baseline `block'");
                }
                table.insert(capability.name().to_string(), capability.clone());
            }
        }
        Self { providers, table }
    }

    /// Registered providers in registration order.
    pub fn providers(&self) -> &[Arc<Provider>] {
        &self.providers
    }

    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names
    }

    /// Every capability name available, including `block`, sorted.
    pub fn capability_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        if !self.table.contains_key(BLOCK) {
            names.push(BLOCK);
        }
        names.sort_unstable();
        names
    }

    pub fn lookup(&self, name: &str) -> Option<&Capability> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        name == BLOCK || self.table.contains_key(name)
    }

    /// Create an environment bound to this snapshot.
    pub fn instantiate(self: &Arc<Self>, block: Option<Process>) -> Environment {
        Environment::new(Arc::clone(self), block)
    }
}

impl Default for EnvironmentType {
    fn default() -> Self {
        Self::empty()
    }
}

/// Process-wide registry used by [`Registry::global`].
static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::new()));

/// The set of registered providers and its published environment type.
#[derive(Debug)]
pub struct Registry {
    current: RwLock<Arc<EnvironmentType>>,
}

impl Registry {
    /// An empty registry, independent of the global one.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(EnvironmentType::empty())),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Registry> {
        Arc::clone(&GLOBAL)
    }

    /// Add providers. Providers already registered (by name) are kept as is.
    pub fn register<I>(&self, providers: I)
    where
        I: IntoIterator<Item = Arc<Provider>>,
    {
        let added: Vec<Arc<Provider>> = providers.into_iter().collect();
        self.update(|registered| {
            let mut next = registered.to_vec();
            for provider in added {
                if !next.iter().any(|p| p.name() == provider.name()) {
                    next.push(provider);
                }
            }
            next
        });
    }

    /// Remove providers, matched by name.
    pub fn unregister<I>(&self, providers: I)
    where
        I: IntoIterator<Item = Arc<Provider>>,
    {
        let removed: Vec<Arc<Provider>> = providers.into_iter().collect();
        self.update(|registered| {
            registered
                .iter()
                .filter(|p| !removed.iter().any(|r| r.name() == p.name()))
                .cloned()
                .collect()
        });
    }

    /// The currently published environment type.
    pub fn current(&self) -> Arc<EnvironmentType> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Instantiate an environment from the current snapshot.
    pub fn instantiate(&self, block: Option<Process>) -> Environment {
        self.current().instantiate(block)
    }

    fn update<F>(&self, rebuild: F)
    where
        F: FnOnce(&[Arc<Provider>]) -> Vec<Arc<Provider>>,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = EnvironmentType::build(rebuild(guard.providers()));
        debug!(providers = ?next.provider_names(), "rebuilt environment");
        *guard = Arc::new(next);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

//! Environments in which composition expressions are built.

use std::fmt;
use std::sync::Arc;

use normkit_model::{NormkitError, Result, Value};

use crate::composable::Composable;
use crate::provider::Capability;
use crate::registry::EnvironmentType;
use crate::unit::{Process, Unit};

/// Name of the baseline capability carrying the caller-supplied block.
pub const BLOCK: &str = "block";

/// Provider name reported by the block capability.
const BLOCK_PROVIDER: &str = "environment";

/// An instance of an [`EnvironmentType`], optionally carrying an ad-hoc
/// block unit.
///
/// `block` resolves like any other name: a registered capability of that name
/// wins, otherwise the caller-supplied block is used. The block takes no
/// arguments. Lookups of names that the snapshot does not know fail with
/// [`NormkitError::UnitNotDefined`].
pub struct Environment {
    kind: Arc<EnvironmentType>,
    block: Option<Capability>,
}

impl Environment {
    pub fn new(kind: Arc<EnvironmentType>, block: Option<Process>) -> Self {
        let block = block.map(|process| {
            let unit = Unit::from_process(process, None);
            Capability::new(BLOCK, BLOCK_PROVIDER, unit.into())
        });
        Self { kind, block }
    }

    /// The snapshot this environment was created from.
    pub fn kind(&self) -> &Arc<EnvironmentType> {
        &self.kind
    }

    pub fn has_block(&self) -> bool {
        self.block.is_some()
    }

    /// The transform built from the caller-supplied block.
    pub fn block(&self) -> Result<Composable> {
        self.block
            .as_ref()
            .map(Capability::as_transform)
            .ok_or(NormkitError::BlockNotGiven)
    }

    /// Look up a capability, including the baseline `block`.
    pub fn capability(&self, name: &str) -> Result<&Capability> {
        if let Some(capability) = self.kind.lookup(name) {
            return Ok(capability);
        }
        if name == BLOCK {
            return self.block.as_ref().ok_or(NormkitError::BlockNotGiven);
        }
        Err(NormkitError::unit_not_defined(name))
    }

    /// The bare transform named `name`.
    pub fn unit(&self, name: &str) -> Result<Composable> {
        self.call(name, &[])
    }

    /// The transform named `name` with `args` bound.
    pub fn bind(&self, name: &str, args: &[Value]) -> Result<Composable> {
        self.accepting(name, args).map(|capability| capability.bind(args))
    }

    /// Bare transform without arguments, bound transform with them.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Composable> {
        self.accepting(name, args).map(|capability| capability.call(args))
    }

    fn accepting(&self, name: &str, args: &[Value]) -> Result<&Capability> {
        let capability = self.capability(name)?;
        let is_block = self
            .block
            .as_ref()
            .is_some_and(|block| std::ptr::eq(block, capability));
        if is_block && !args.is_empty() {
            return Err(NormkitError::invalid_argument(
                BLOCK,
                "the block unit takes no arguments",
            ));
        }
        Ok(capability)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Environment [{}]", self.kind.provider_names().join(", "))?;
        if self.has_block() {
            f.write_str(" with a block")?;
        }
        f.write_str(">")
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

//! Composable value transformations.
//!
//! This crate provides the composition algebra and the capability registry:
//!
//! - **unit**: atomic transforms with captured arguments and currying
//! - **sequence**: flat, ordered compositions of units
//! - **composable**: the `|` / `>>` / `<<` algebra over both
//! - **requirements**: lazily loaded external requirements of a provider
//! - **provider**: named capabilities (forwarding, existing or custom units)
//! - **registry**: the registered providers and their published snapshot
//! - **environment**: the lookup surface composition code builds against
//! - **builtin**: ready-made `text` and `list` providers

pub mod builtin;
pub mod composable;
pub mod environment;
pub mod provider;
pub mod registry;
pub mod requirements;
pub mod sequence;
pub mod unit;

pub use composable::Composable;
pub use environment::{BLOCK, Environment};
pub use provider::{Capability, Definition, Provider};
pub use registry::{EnvironmentType, Registry};
pub use requirements::{Loader, Requirements};
pub use sequence::Sequence;
pub use unit::{Owner, Process, Resolved, Unit, process};

//! Attribute normalization for host records.
//!
//! - **record**: the host contract and per-instance normalization state
//! - **rule**: a composed transform plus its context tag and predicate
//! - **pipeline**: ordered rules per attribute and the dispatcher running them
//! - **normalize**: the `Normalize` trait hosts implement to expose a static
//!   pipeline

pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod rule;

pub use normalize::Normalize;
pub use pipeline::Pipeline;
pub use record::{NormalizationState, Record};
pub use rule::{Condition, Predicate, Rule, RuleOptions};

//! Value model shared by every normkit crate.
//!
//! - **value**: the dynamic [`Value`] type held by host attributes and unit arguments
//! - **operations**: named operations values answer to ([`Value::send`])
//! - **error**: the [`NormkitError`] enum and crate-wide [`Result`] alias

pub mod error;
mod operations;
pub mod value;

pub use error::{NormkitError, Result};
pub use value::Value;

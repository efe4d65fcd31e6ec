//! Library side of the `normkit` binary.

pub mod commands;
pub mod logging;
pub mod summary;

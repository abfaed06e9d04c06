//! Command-line interface module.

mod args;
pub mod combine;
pub mod common;
pub mod list;
pub mod serve;

pub use args::{Cli, Commands};

//! Command handlers for the itemtable CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod catalog;
pub mod configure;

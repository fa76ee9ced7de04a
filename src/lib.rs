//! nimbus: a cloud-inventory CLI built on a lazily loaded command tree.
//!
//! Commands live in modules registered through a static table. The resolved
//! tree is cached between runs; a cached node is a stub until the dispatcher
//! descends into it, at which point its modules are re-run to restore the
//! handlers.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod inventory;
pub mod output;
pub mod registry;

//! Built-in command modules. Each submodule exposes an `init` that
//! registers its categories and commands on the tree; the registry decides
//! which ones run based on the execution mode.

pub mod account;
pub mod classic;
pub mod dns;
pub mod resource;
pub mod vm;
pub mod vm_endpoint;

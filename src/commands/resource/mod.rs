//! Commands only available in `resource` execution mode.

pub mod group;

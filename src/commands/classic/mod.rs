//! Commands only available in `classic` execution mode.

pub mod network;

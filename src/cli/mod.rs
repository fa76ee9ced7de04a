//! Command-line framework: option parsing, the command tree, dispatch,
//! execution, and help rendering.

pub mod dispatch;
pub mod entrypoint;
pub mod exec;
pub mod help;
pub mod node;
pub mod options;

//! Process entrypoint: wires config, registry, cache, dispatch, and
//! execution together and turns the result into an exit code.

use super::dispatch::{self, Resolution};
use super::exec;
use super::help;
use super::node::{CommandTree, NodeId, NodeKind};
use crate::cache;
use crate::config::NimbusConfig;
use crate::error::CliError;
use crate::output::Output;
use crate::registry::Registry;

const BINARY_NAME: &str = "nimbus";

/// Run with the process arguments. Returns the exit code.
pub fn run() -> i32 {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    run_from(&raw)
}

/// Run against an explicit argument vector.
pub fn run_from(raw: &[String]) -> i32 {
    if raw.first().map(String::as_str) == Some("--version")
        || raw.first().map(String::as_str) == Some("-V")
    {
        println!("{BINARY_NAME} {}", env!("CARGO_PKG_VERSION"));
        return 0;
    }

    // Output settings come from a raw scan so verbosity applies to
    // everything that happens before parsing proper, config loading
    // included.
    let json = raw.iter().any(|t| t == "--json");
    let verbosity = raw
        .iter()
        .filter(|t| *t == "-v" || *t == "--verbose")
        .count() as u8;
    let out = Output::new(json, verbosity);

    let mut config = NimbusConfig::load(&out);
    let mode = config.resolve_mode(&Registry::known_modes(), &out);
    out.silly(&format!("execution mode: {mode}"));
    let registry = Registry::builtin(&mode);

    let mut tree = build_tree(&registry, &out);

    match dispatch::resolve(&mut tree, &registry, &out, raw) {
        Ok(Resolution::Help { node }) => {
            help::render(&tree, &out, node, &config);
            0
        }
        Ok(Resolution::Execute { node, parsed }) => exec::execute(&tree, &out, node, parsed),
        Err(err) => {
            out.error(&err.to_string());
            if let Some(suggestion) = err.suggestion() {
                out.error(&format!("did you mean '{suggestion}'?"));
            }
            match err {
                CliError::UnknownCommand { parent, .. } => {
                    help::render(&tree, &out, parent, &config);
                }
                CliError::UnknownCategory { .. } => {
                    help::render(&tree, &out, CommandTree::ROOT, &config);
                }
                _ => {}
            }
            1
        }
    }
}

/// Rebuild the tree from the snapshot cache, or scan every module and write
/// a fresh snapshot when no usable cache exists.
fn build_tree(registry: &Registry, out: &Output) -> CommandTree {
    if let Some(mut tree) = cache::load(out) {
        out.verbose("command tree loaded from cache");
        promote_root_commands(&mut tree, registry, out);
        return tree;
    }

    let mut tree = CommandTree::new(BINARY_NAME);
    registry.scan(&mut tree, out);
    if let Err(err) = cache::save(&tree) {
        out.warn(&format!("could not write command cache: {err:#}"));
    }
    tree
}

/// Commands that sit directly under the root have no category descent to
/// trigger promotion, so they are promoted as soon as the cache is read.
/// Categories stay lazy.
fn promote_root_commands(tree: &mut CommandTree, registry: &Registry, out: &Output) {
    let commands: Vec<NodeId> = tree
        .children_ids(CommandTree::ROOT)
        .filter(|&id| tree.node(id).kind == NodeKind::Command && !tree.node(id).loaded)
        .collect();
    for id in commands {
        cache::promote(tree, registry, out, id);
    }
}

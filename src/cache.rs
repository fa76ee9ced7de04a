//! Command-tree snapshot cache.
//!
//! The full tree is built by running every command module, which is the
//! slowest part of startup. After a scan the structural part of the tree —
//! names, descriptions, usage, options, module paths — is written to
//! `plugins.json` under the config directory. The next invocation rebuilds
//! the tree from that snapshot as unloaded stubs and only re-runs the
//! modules behind the nodes the command path actually touches.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::cli::node::{CommandTree, NodeId, NodeKind, PositionalSpec};
use crate::cli::options::OptionSpec;
use crate::config;
use crate::output::Output;
use crate::registry::Registry;

const CACHE_FILE: &str = "plugins.json";

/// Serialized snapshot of the tree's structure. Handlers are not cached;
/// promotion re-runs the source modules to restore them.
#[derive(Debug, Serialize, Deserialize)]
pub struct CachedTree {
    /// RFC 3339 stamp of when the snapshot was written.
    #[serde(default)]
    pub generated_at: String,
    /// Tool version that wrote the snapshot. Recorded for diagnostics; a
    /// mismatch does not invalidate the cache.
    #[serde(default)]
    pub tool_version: String,
    pub root: CachedNode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CachedNode {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    #[serde(default)]
    pub positionals: Vec<PositionalSpec>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub children: Vec<CachedNode>,
}

pub fn cache_path() -> PathBuf {
    config::config_home().join(CACHE_FILE)
}

/// Snapshot the structural part of a fully scanned tree.
pub fn snapshot(tree: &CommandTree) -> CachedTree {
    CachedTree {
        generated_at: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        root: snapshot_node(tree, CommandTree::ROOT),
    }
}

fn snapshot_node(tree: &CommandTree, id: NodeId) -> CachedNode {
    let node = tree.node(id);
    CachedNode {
        name: node.name.clone(),
        kind: node.kind,
        description: node.description.clone(),
        usage: node.usage.clone(),
        options: node.options.clone(),
        positionals: node.positionals.clone(),
        modules: node.source_modules.clone(),
        children: tree
            .children_ids(id)
            .map(|child| snapshot_node(tree, child))
            .collect(),
    }
}

pub fn save(tree: &CommandTree) -> anyhow::Result<()> {
    save_to(tree, &cache_path())
}

pub fn save_to(tree: &CommandTree, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&snapshot(tree))?;
    fs::write(path, json)?;
    Ok(())
}

/// Load the cached tree, rebuilt as stubs. Any failure — missing file, bad
/// JSON — quietly yields `None` and the caller falls back to a full scan.
pub fn load(out: &Output) -> Option<CommandTree> {
    load_from(&cache_path(), out)
}

pub fn load_from(path: &Path, out: &Output) -> Option<CommandTree> {
    let raw = fs::read_to_string(path).ok()?;
    let cached: CachedTree = match serde_json::from_str(&raw) {
        Ok(cached) => cached,
        Err(err) => {
            out.verbose(&format!("ignoring unreadable command cache: {err}"));
            return None;
        }
    };
    if cached.tool_version != env!("CARGO_PKG_VERSION") {
        out.verbose(&format!(
            "command cache was written by version {}",
            cached.tool_version
        ));
    }
    Some(rehydrate(&cached))
}

/// Rebuild a tree of unloaded stubs from a snapshot.
pub fn rehydrate(cached: &CachedTree) -> CommandTree {
    let mut tree = CommandTree::new(&cached.root.name);
    {
        let root = tree.node_mut(CommandTree::ROOT);
        root.description = cached.root.description.clone();
        root.source_modules = cached.root.modules.clone();
    }
    // Root options merge over the constructed globals so that options a
    // module registered at the root survive the round trip without
    // duplicating `-v`/`--json`.
    for spec in &cached.root.options {
        tree.add_option(CommandTree::ROOT, spec.clone());
    }
    for child in &cached.root.children {
        rehydrate_node(&mut tree, CommandTree::ROOT, child);
    }
    tree
}

fn rehydrate_node(tree: &mut CommandTree, parent: NodeId, cached: &CachedNode) {
    let id = tree.add_stub(parent, &cached.name, cached.kind);
    {
        let node = tree.node_mut(id);
        node.description = cached.description.clone();
        node.usage = cached.usage.clone();
        node.options = cached.options.clone();
        node.positionals = cached.positionals.clone();
        node.source_modules = cached.modules.clone();
    }
    for child in &cached.children {
        rehydrate_node(tree, id, child);
    }
}

/// Promote a stub node: re-run the modules that contributed it, restoring
/// handlers and anything the snapshot doesn't carry. Recurses into children
/// so that entering a category promotes everything visible beneath it.
pub fn promote(tree: &mut CommandTree, registry: &Registry, out: &Output, id: NodeId) {
    if !tree.node(id).loaded {
        let modules = tree.node(id).source_modules.clone();
        for module in modules {
            registry.load_module(tree, out, &module);
        }
        // Mark loaded even if a module vanished, so a stale stub is not
        // retried on every descent step.
        tree.node_mut(id).loaded = true;
    }
    let children: Vec<NodeId> = tree.children_ids(id).collect();
    for child in children {
        promote(tree, registry, out, child);
    }
}

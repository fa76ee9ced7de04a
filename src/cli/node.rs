//! The command tree: an arena of category and command nodes.
//!
//! Nodes are stored in a flat `Vec` and referenced by index, so a cached
//! tree can be rebuilt without juggling back-pointers. Node 0 is always the
//! root category carrying the global options.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::exec::Handler;
use super::options::OptionSpec;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Category,
    Command,
}

/// One declared positional argument, parsed from a usage string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalSpec {
    pub name: String,
    pub required: bool,
}

/// A node in the command tree.
pub struct CommandNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub description: String,
    pub detailed_description: Option<String>,
    /// The arguments portion of the usage string, e.g. `<dns-name> [ttl]`.
    pub usage: String,
    pub options: Vec<OptionSpec>,
    pub positionals: Vec<PositionalSpec>,
    pub children: BTreeMap<String, NodeId>,
    pub handler: Option<Handler>,
    /// Modules that contribute commands under this node.
    pub source_modules: Vec<String>,
    /// False for a stub rebuilt from cache whose modules haven't run yet.
    pub loaded: bool,
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("usage", &self.usage)
            .field("options", &self.options)
            .field("positionals", &self.positionals)
            .field("children", &self.children)
            .field("handler", &self.handler.is_some())
            .field("source_modules", &self.source_modules)
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl CommandNode {
    fn new(name: &str, kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            parent,
            description: String::new(),
            detailed_description: None,
            usage: String::new(),
            options: Vec::new(),
            positionals: Vec::new(),
            children: BTreeMap::new(),
            handler: None,
            source_modules: Vec::new(),
            loaded: false,
        }
    }

    pub fn is_category(&self) -> bool {
        self.kind == NodeKind::Category
    }
}

/// The full tree plus bookkeeping of which modules already ran.
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    pub loaded_modules: HashSet<String>,
}

impl CommandTree {
    pub const ROOT: NodeId = 0;

    pub fn new(binary_name: &str) -> Self {
        let mut root = CommandNode::new(binary_name, NodeKind::Category, None);
        root.loaded = true;
        root.options.push(OptionSpec::parse(
            "-v, --verbose",
            "increase log verbosity (repeatable)",
        ));
        root.options
            .push(OptionSpec::parse("--json", "machine-readable output"));
        Self {
            nodes: vec![root],
            loaded_modules: HashSet::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child of any kind by name.
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent].children.get(name).copied()
    }

    pub fn child_category(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.child(parent, name)
            .filter(|&id| self.nodes[id].kind == NodeKind::Category)
    }

    pub fn child_command(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.child(parent, name)
            .filter(|&id| self.nodes[id].kind == NodeKind::Command)
    }

    pub fn children_ids(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[parent].children.values().copied()
    }

    /// Space-joined path from (but excluding) the root, e.g. `vm endpoint create`.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if node == Self::ROOT {
                break;
            }
            parts.push(self.nodes[node].name.clone());
            cursor = self.nodes[node].parent;
        }
        parts.reverse();
        parts.join(" ")
    }

    /// Option declared on this node itself.
    pub fn option_for(&self, id: NodeId, token: &str) -> Option<&OptionSpec> {
        self.nodes[id].options.iter().find(|o| o.matches(token))
    }

    /// Option declared on this node or any ancestor, nearest first.
    pub fn option_in_scope(&self, id: NodeId, token: &str) -> Option<&OptionSpec> {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if let Some(spec) = self.option_for(node, token) {
                return Some(spec);
            }
            cursor = self.nodes[node].parent;
        }
        None
    }

    /// All options visible at a node: its own plus every ancestor's.
    pub fn scope_options(&self, id: NodeId) -> Vec<&OptionSpec> {
        let mut specs = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            specs.extend(self.nodes[node].options.iter());
            cursor = self.nodes[node].parent;
        }
        specs
    }

    /// Declare an option on a node. Redefining an option with the same name
    /// and long flag replaces the earlier definition in place; otherwise the
    /// new spec is appended.
    pub fn add_option(&mut self, id: NodeId, spec: OptionSpec) {
        let node = &mut self.nodes[id];
        if let Some(existing) = node
            .options
            .iter_mut()
            .find(|o| o.name() == spec.name() && o.long == spec.long)
        {
            *existing = spec;
        } else {
            node.options.push(spec);
        }
    }

    /// Insert an unloaded node, used when rebuilding the tree from a cached
    /// snapshot. Builder registration later flips it to loaded in place.
    pub(crate) fn add_stub(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        self.push_node(parent, name, kind)
    }

    fn push_node(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(CommandNode::new(name, kind, Some(parent)));
        self.nodes[parent].children.insert(name.to_string(), id);
        id
    }
}

/// Split a usage string like `create <dns-name> [ttl]` into the command name
/// and its positional specs.
fn parse_usage(usage: &str) -> (String, Vec<PositionalSpec>, String) {
    let mut parts = usage.split_whitespace();
    let name = parts.next().unwrap_or_default().to_string();
    let mut positionals = Vec::new();
    let mut args = Vec::new();
    for part in parts {
        args.push(part);
        if let Some(inner) = part.strip_prefix('<').and_then(|p| p.strip_suffix('>')) {
            positionals.push(PositionalSpec {
                name: inner.to_string(),
                required: true,
            });
        } else if let Some(inner) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
            positionals.push(PositionalSpec {
                name: inner.to_string(),
                required: false,
            });
        }
    }
    (name, positionals, args.join(" "))
}

// ============================================================================
// Builder
// ============================================================================

/// Registration handle passed to command modules. Records which module each
/// category's commands came from, so a stub can later be promoted by
/// re-running exactly those modules.
pub struct TreeBuilder<'t> {
    tree: &'t mut CommandTree,
    module: String,
}

impl<'t> TreeBuilder<'t> {
    pub fn new(tree: &'t mut CommandTree, module: &str) -> Self {
        Self {
            tree,
            module: module.to_string(),
        }
    }

    pub fn tree(&mut self) -> &mut CommandTree {
        self.tree
    }

    /// Top-level category under the root.
    pub fn category(&mut self, name: &str, description: &str) -> NodeId {
        self.subcategory(CommandTree::ROOT, name, description)
    }

    /// Get-or-create a category under `parent`. A category registered by a
    /// later module merges into the existing node: the stub becomes loaded,
    /// a stub's empty description is filled in, and the module is recorded
    /// as a contributor.
    pub fn subcategory(&mut self, parent: NodeId, name: &str, description: &str) -> NodeId {
        let id = match self.tree.child_category(parent, name) {
            Some(existing) => existing,
            None => self.tree.push_node(parent, name, NodeKind::Category),
        };
        let node = self.tree.node_mut(id);
        node.loaded = true;
        if node.description.is_empty() {
            node.description = description.to_string();
        }
        if !node.source_modules.contains(&self.module) {
            node.source_modules.push(self.module.clone());
        }
        id
    }

    /// Register a command under `parent` from a usage string. Re-registering
    /// a command of the same name overwrites its usage and positionals
    /// (last writer wins) while options merge via `add_option`.
    pub fn command(&mut self, parent: NodeId, usage: &str) -> CommandBuilder<'_> {
        let (name, positionals, args) = parse_usage(usage);
        let id = match self.tree.child_command(parent, &name) {
            Some(existing) => existing,
            None => self.tree.push_node(parent, &name, NodeKind::Command),
        };
        let node = self.tree.node_mut(id);
        node.loaded = true;
        node.usage = args;
        node.positionals = positionals;
        if !node.source_modules.contains(&self.module) {
            node.source_modules.push(self.module.clone());
        }
        CommandBuilder {
            tree: &mut *self.tree,
            id,
        }
    }
}

/// Fluent configuration of a single command node.
pub struct CommandBuilder<'t> {
    tree: &'t mut CommandTree,
    id: NodeId,
}

impl CommandBuilder<'_> {
    pub fn description(self, text: &str) -> Self {
        self.tree.node_mut(self.id).description = text.to_string();
        self
    }

    pub fn detailed_description(self, text: &str) -> Self {
        self.tree.node_mut(self.id).detailed_description = Some(text.to_string());
        self
    }

    pub fn option(self, flags: &str, description: &str) -> Self {
        let spec = OptionSpec::parse(flags, description);
        self.tree.add_option(self.id, spec);
        self
    }

    pub fn option_with_default(self, flags: &str, description: &str, default: &str) -> Self {
        let mut spec = OptionSpec::parse(flags, description);
        spec.default = Some(default.to_string());
        self.tree.add_option(self.id, spec);
        self
    }

    pub fn handler<F>(self, f: F) -> NodeId
    where
        F: Fn(super::exec::Invocation, &super::exec::Completion) + 'static,
    {
        self.tree.node_mut(self.id).handler = Some(Box::new(f));
        self.id
    }
}

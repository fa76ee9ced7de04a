//! Static registry of command modules.
//!
//! Command sets are declared in a compile-time table rather than discovered
//! by scanning a directory, so a cached tree stub names the module paths it
//! came from and promotion re-runs exactly those entries. Extensions add to
//! the same table shape via a manifest-style secondary list.

use crate::cli::node::{CommandTree, TreeBuilder};
use crate::commands;
use crate::output::Output;

/// One registrable command module. `mode` restricts the entry to a single
/// execution mode; `None` means always available.
#[derive(Clone, Copy)]
pub struct ModuleEntry {
    pub path: &'static str,
    pub mode: Option<&'static str>,
    pub init: fn(&mut TreeBuilder),
}

/// Built-in command modules, kept sorted by path.
const MODULES: &[ModuleEntry] = &[
    ModuleEntry {
        path: "commands/account",
        mode: None,
        init: commands::account::init,
    },
    ModuleEntry {
        path: "commands/classic/network",
        mode: Some("classic"),
        init: commands::classic::network::init,
    },
    ModuleEntry {
        path: "commands/dns",
        mode: None,
        init: commands::dns::init,
    },
    ModuleEntry {
        path: "commands/resource/group",
        mode: Some("resource"),
        init: commands::resource::group::init,
    },
    ModuleEntry {
        path: "commands/vm",
        mode: None,
        init: commands::vm::init,
    },
    ModuleEntry {
        path: "commands/vm_endpoint",
        mode: None,
        init: commands::vm_endpoint::init,
    },
];

/// Extension packages declared by manifest. Empty in a stock build; tests
/// and downstream embedders add entries through [`Registry::with_extra`].
const EXTENSIONS: &[ModuleEntry] = &[];

/// The set of modules eligible under the active execution mode.
pub struct Registry {
    entries: Vec<ModuleEntry>,
}

impl Registry {
    /// Built-in modules filtered for `mode`, extensions appended.
    pub fn builtin(mode: &str) -> Self {
        let entries = MODULES
            .iter()
            .chain(EXTENSIONS.iter())
            .filter(|entry| entry.mode.map_or(true, |m| m == mode))
            .copied()
            .collect();
        Self { entries }
    }

    /// Registry with no modules at all.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an ad-hoc module entry (mode-unrestricted).
    pub fn with_extra(mut self, path: &'static str, init: fn(&mut TreeBuilder)) -> Self {
        self.entries.push(ModuleEntry {
            path,
            mode: None,
            init,
        });
        self.entries.sort_by_key(|entry| entry.path);
        self
    }

    /// Execution modes any built-in module declares.
    pub fn known_modes() -> Vec<&'static str> {
        let mut modes: Vec<&'static str> = MODULES.iter().filter_map(|entry| entry.mode).collect();
        modes.sort_unstable();
        modes.dedup();
        modes
    }

    /// Run every eligible module once, building the full tree.
    pub fn scan(&self, tree: &mut CommandTree, out: &Output) {
        for entry in &self.entries {
            self.run_entry(tree, out, entry);
        }
    }

    /// Run one module by path, if it is eligible and hasn't run yet. A path
    /// recorded in a stale cache that no longer exists is skipped with a
    /// warning rather than failing the whole invocation.
    pub fn load_module(&self, tree: &mut CommandTree, out: &Output, path: &str) {
        match self.entries.iter().find(|entry| entry.path == path) {
            Some(entry) => {
                let entry = *entry;
                self.run_entry(tree, out, &entry);
            }
            None => out.warn(&format!("cached command module '{path}' no longer exists")),
        }
    }

    fn run_entry(&self, tree: &mut CommandTree, out: &Output, entry: &ModuleEntry) {
        if tree.loaded_modules.contains(entry.path) {
            return;
        }
        out.silly(&format!("loading command module {}", entry.path));
        tree.loaded_modules.insert(entry.path.to_string());
        let mut builder = TreeBuilder::new(tree, entry.path);
        (entry.init)(&mut builder);
    }
}

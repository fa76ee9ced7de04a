//! Token-by-token descent through the command tree.
//!
//! The dispatcher walks the argument vector, promoting cached stubs as it
//! enters them, until it lands on a command (execute), runs out of tokens
//! (help), or hits something it cannot place (error with a suggestion).

use super::node::{CommandTree, NodeId, NodeKind};
use super::options::{self, ParsedArgv, ValueArity};
use crate::cache;
use crate::error::CliError;
use crate::output::Output;
use crate::registry::Registry;

/// Levenshtein cutoff for "did you mean" hints.
const SUGGESTION_DISTANCE: usize = 2;

/// Outcome of resolving an argument vector.
#[derive(Debug)]
pub enum Resolution {
    /// A command was reached; run it with its parsed arguments.
    Execute { node: NodeId, parsed: ParsedArgv },
    /// A category (or nothing) was reached; show its help.
    Help { node: NodeId },
}

/// Resolve `argv` against the tree, loading stub nodes on the way down.
pub fn resolve(
    tree: &mut CommandTree,
    registry: &Registry,
    out: &Output,
    argv: &[String],
) -> Result<Resolution, CliError> {
    // `help [path...]` renders help for the named node instead of running it.
    if argv.first().map(String::as_str) == Some("help") {
        return resolve_help(tree, registry, out, &argv[1..]);
    }

    let mut node = CommandTree::ROOT;
    let mut idx = 0;
    let mut literal = false;
    // Option tokens recognized before the command path is complete; replayed
    // into the command's parse so their values are not lost.
    let mut leading: Vec<String> = Vec::new();

    loop {
        let token = match argv.get(idx) {
            Some(token) => token.as_str(),
            None => return Ok(Resolution::Help { node }),
        };

        if !literal {
            if token == "--" {
                literal = true;
                idx += 1;
                continue;
            }
            if token == "-h" || token == "--help" {
                return Ok(Resolution::Help { node });
            }
            if token.len() > 1 && token.starts_with('-') {
                // A global option may legitimately precede the command path;
                // set it aside (with its value, per arity) and keep
                // descending.
                match tree.option_in_scope(node, token) {
                    Some(spec) => {
                        leading.push(token.to_string());
                        idx += 1;
                        match spec.arity {
                            ValueArity::Required => match argv.get(idx) {
                                None => {
                                    return Err(CliError::Parse(
                                        crate::error::ParseError::MissingArgument {
                                            option: spec.long.clone(),
                                            flag: None,
                                        },
                                    ));
                                }
                                Some(next) if next.starts_with('-') => {
                                    return Err(CliError::Parse(
                                        crate::error::ParseError::MissingArgument {
                                            option: spec.long.clone(),
                                            flag: Some(next.clone()),
                                        },
                                    ));
                                }
                                Some(next) => {
                                    leading.push(next.clone());
                                    idx += 1;
                                }
                            },
                            ValueArity::Optional => {
                                if let Some(next) = argv.get(idx) {
                                    if !next.starts_with('-') {
                                        leading.push(next.clone());
                                        idx += 1;
                                    }
                                }
                            }
                            ValueArity::None => {}
                        }
                        continue;
                    }
                    None => return Err(unknown_at(tree, node, token)),
                }
            }
        }

        match tree.child(node, token) {
            Some(child) => {
                cache::promote(tree, registry, out, child);
                idx += 1;
                if tree.node(child).kind == NodeKind::Command {
                    let mut tail = std::mem::take(&mut leading);
                    tail.extend_from_slice(&argv[idx..]);
                    let parsed = options::parse(tree, child, &tail)?;
                    if let Some(option) = parsed.unknown.first() {
                        return Err(CliError::UnknownOption {
                            option: option.clone(),
                            command: tree.full_name(child),
                        });
                    }
                    return Ok(Resolution::Execute {
                        node: child,
                        parsed,
                    });
                }
                node = child;
            }
            None => return Err(unknown_at(tree, node, token)),
        }
    }
}

/// Resolve the path after a leading `help` token. Unknown names fall back
/// to root help rather than failing.
fn resolve_help(
    tree: &mut CommandTree,
    registry: &Registry,
    out: &Output,
    path: &[String],
) -> Result<Resolution, CliError> {
    let mut node = CommandTree::ROOT;
    for name in path {
        match tree.child(node, name) {
            Some(child) => {
                cache::promote(tree, registry, out, child);
                node = child;
            }
            None => break,
        }
    }
    Ok(Resolution::Help { node })
}

/// Build the unknown-name error for a failed descent step, with a
/// close-match suggestion drawn from the node's children.
fn unknown_at(tree: &CommandTree, node: NodeId, token: &str) -> CliError {
    let suggestion = suggest(tree, node, token);
    if node == CommandTree::ROOT {
        CliError::UnknownCategory {
            name: token.to_string(),
            suggestion,
        }
    } else {
        CliError::UnknownCommand {
            name: token.to_string(),
            category: tree.full_name(node),
            parent: node,
            suggestion,
        }
    }
}

fn suggest(tree: &CommandTree, node: NodeId, token: &str) -> Option<String> {
    tree.node(node)
        .children
        .keys()
        .map(|name| (strsim::levenshtein(name, token), name))
        .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::node::TreeBuilder;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn quiet() -> Output {
        Output::new(true, 0)
    }

    fn sample() -> (CommandTree, Registry) {
        let mut tree = CommandTree::new("nimbus");
        let mut cli = TreeBuilder::new(&mut tree, "test/vm");
        let vm = cli.category("vm", "Manage virtual machines");
        cli.command(vm, "list")
            .description("List virtual machines")
            .option("-s, --subscription <id>", "subscription")
            .handler(|_, done| done.ok());
        let ep = cli.subcategory(vm, "endpoint", "Manage endpoints");
        cli.command(ep, "create <vm-name> <public-port>")
            .option("--endpoint-name <name>", "endpoint name")
            .handler(|_, done| done.ok());
        (tree, Registry::empty())
    }

    #[test]
    fn test_empty_argv_is_root_help() {
        let (mut tree, registry) = sample();
        match resolve(&mut tree, &registry, &quiet(), &[]).unwrap() {
            Resolution::Help { node } => assert_eq!(node, CommandTree::ROOT),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_descends_to_command() {
        let (mut tree, registry) = sample();
        match resolve(&mut tree, &registry, &quiet(), &args(&["vm", "list", "-s", "x"])).unwrap() {
            Resolution::Execute { node, parsed } => {
                assert_eq!(tree.full_name(node), "vm list");
                assert_eq!(parsed.values.str_of("subscription"), Some("x"));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_category_without_command_is_help() {
        let (mut tree, registry) = sample();
        match resolve(&mut tree, &registry, &quiet(), &args(&["vm", "endpoint"])).unwrap() {
            Resolution::Help { node } => assert_eq!(tree.full_name(node), "vm endpoint"),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_help_flag_stops_descent() {
        let (mut tree, registry) = sample();
        match resolve(&mut tree, &registry, &quiet(), &args(&["vm", "--help"])).unwrap() {
            Resolution::Help { node } => assert_eq!(tree.full_name(node), "vm"),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_help_command_targets_named_node() {
        let (mut tree, registry) = sample();
        match resolve(&mut tree, &registry, &quiet(), &args(&["help", "vm"])).unwrap() {
            Resolution::Help { node } => assert_eq!(tree.full_name(node), "vm"),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_category_suggests_close_match() {
        let (mut tree, registry) = sample();
        let err = resolve(&mut tree, &registry, &quiet(), &args(&["vn", "list"])).unwrap_err();
        match err {
            CliError::UnknownCategory { name, suggestion } => {
                assert_eq!(name, "vn");
                assert_eq!(suggestion.as_deref(), Some("vm"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_command_names_its_category() {
        let (mut tree, registry) = sample();
        let err = resolve(&mut tree, &registry, &quiet(), &args(&["vm", "lst"])).unwrap_err();
        match err {
            CliError::UnknownCommand {
                name,
                category,
                suggestion,
                ..
            } => {
                assert_eq!(name, "lst");
                assert_eq!(category, "vm");
                assert_eq!(suggestion.as_deref(), Some("list"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_option_on_command_is_fatal() {
        let (mut tree, registry) = sample();
        let err = resolve(
            &mut tree,
            &registry,
            &quiet(),
            &args(&["vm", "list", "--bogus"]),
        )
        .unwrap_err();
        match err {
            CliError::UnknownOption { option, command } => {
                assert_eq!(option, "--bogus");
                assert_eq!(command, "vm list");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_global_option_before_path_is_skipped() {
        let (mut tree, registry) = sample();
        match resolve(&mut tree, &registry, &quiet(), &args(&["--json", "vm", "list"])).unwrap() {
            Resolution::Execute { node, .. } => assert_eq!(tree.full_name(node), "vm list"),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_leading_global_option_value_is_recorded() {
        let (mut tree, registry) = sample();
        tree.add_option(
            CommandTree::ROOT,
            crate::cli::options::OptionSpec::parse("--profile <name>", "the profile to use"),
        );
        match resolve(
            &mut tree,
            &registry,
            &quiet(),
            &args(&["--profile", "staging", "vm", "list"]),
        )
        .unwrap()
        {
            Resolution::Execute { node, parsed } => {
                assert_eq!(tree.full_name(node), "vm list");
                assert_eq!(parsed.values.str_of("profile"), Some("staging"));
                assert!(parsed.positionals.is_empty());
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_option_at_root_is_unknown_category() {
        let (mut tree, registry) = sample();
        let err = resolve(&mut tree, &registry, &quiet(), &args(&["--frobnicate"])).unwrap_err();
        match err {
            CliError::UnknownCategory { name, .. } => assert_eq!(name, "--frobnicate"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Option schema and the context-sensitive argument tokenizer.
//!
//! Parsing is scoped: the option set in effect depends on which node of the
//! command tree is being resolved, plus the global options declared on its
//! ancestors. Tokens that look like options but match nothing in scope are
//! collected into `ParsedArgv::unknown` — whether that is fatal is the
//! caller's decision, not the parser's.

use serde::{Deserialize, Serialize};

use super::node::{CommandTree, NodeId};
use crate::error::ParseError;

// ============================================================================
// Option schema
// ============================================================================

/// Whether an option consumes a following value token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueArity {
    /// Boolean flag, no value consumed.
    None,
    /// Consumes the next token only if it exists and doesn't look like a flag.
    Optional,
    /// The next token must be a value; a missing or flag-looking token fails.
    Required,
}

/// A declared option on a command-tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Long form including dashes, e.g. `--subscription`.
    pub long: String,
    /// Short form including dash, e.g. `-s`.
    #[serde(default)]
    pub short: Option<String>,
    pub arity: ValueArity,
    #[serde(default)]
    pub description: String,
    /// Preassigned value for value-taking options.
    #[serde(default)]
    pub default: Option<String>,
}

impl OptionSpec {
    /// Parse a commander-style flags string, e.g. `-s, --subscription <id>`.
    /// `<x>` marks a required value, `[x]` an optional one; neither means a
    /// boolean flag.
    pub fn parse(flags: &str, description: &str) -> Self {
        let mut long = String::new();
        let mut short = None;
        let mut arity = ValueArity::None;

        for part in flags.split([',', ' ']).filter(|p| !p.is_empty()) {
            if part.starts_with("--") {
                long = part.to_string();
            } else if part.starts_with('-') {
                short = Some(part.to_string());
            } else if part.starts_with('<') {
                arity = ValueArity::Required;
            } else if part.starts_with('[') {
                arity = ValueArity::Optional;
            }
        }

        Self {
            long,
            short,
            arity,
            description: description.to_string(),
            default: None,
        }
    }

    /// Option name: the long form without leading dashes.
    pub fn name(&self) -> &str {
        self.long.trim_start_matches('-')
    }

    /// Exact match against a raw token.
    pub fn matches(&self, token: &str) -> bool {
        token == self.long || self.short.as_deref() == Some(token)
    }

    /// Render the flags column for help output.
    pub fn flags(&self) -> String {
        let value = match self.arity {
            ValueArity::None => String::new(),
            ValueArity::Optional => " [value]".to_string(),
            ValueArity::Required => " <value>".to_string(),
        };
        match &self.short {
            Some(short) => format!("{}, {}{}", short, self.long, value),
            None => format!("{}{}", self.long, value),
        }
    }
}

// ============================================================================
// Parsed values
// ============================================================================

/// A recorded option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            OptionValue::Bool(_) => None,
        }
    }

    /// String form used when an option value stands in for a positional.
    pub fn into_string(self) -> String {
        match self {
            OptionValue::Str(s) => s,
            OptionValue::Bool(b) => b.to_string(),
        }
    }
}

/// Insertion-ordered option values. Later assignment of the same name
/// overwrites the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionValues(Vec<(String, OptionValue)>);

impl OptionValues {
    pub fn set(&mut self, name: &str, value: OptionValue) {
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.0.push((name.to_string(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        let idx = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// String value of an option, if one was recorded.
    pub fn str_of(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_str())
    }

    /// True when a boolean flag was set (or a value recorded).
    pub fn is_set(&self, name: &str) -> bool {
        match self.get(name) {
            Some(OptionValue::Bool(b)) => *b,
            Some(OptionValue::Str(_)) => true,
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of tokenizing an argument vector at a given scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgv {
    /// Tokens that are not options, in order.
    pub positionals: Vec<String>,
    /// Flag-looking tokens (and their heuristically consumed values) that
    /// matched nothing in scope.
    pub unknown: Vec<String>,
    /// Recognized option assignments.
    pub values: OptionValues,
}

// ============================================================================
// Parser
// ============================================================================

/// Does this token look like an option (as opposed to a positional)?
fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

/// Parse raw tokens against the option scope of `scope` (its own options
/// plus ancestor globals).
///
/// A literal `--` switches every subsequent token to positional. A bare `-`
/// still goes through option lookup but ends up a positional, and an empty
/// string is a valid positional value.
pub fn parse(
    tree: &CommandTree,
    scope: NodeId,
    tokens: &[String],
) -> Result<ParsedArgv, ParseError> {
    let mut parsed = ParsedArgv::default();

    // Preassign defaults for value-taking options that declare one.
    for spec in tree.scope_options(scope) {
        if spec.arity != ValueArity::None {
            if let Some(default) = &spec.default {
                parsed
                    .values
                    .set(spec.name(), OptionValue::Str(default.clone()));
            }
        }
    }

    let mut literal = false;
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];

        if !literal && token == "--" {
            literal = true;
            i += 1;
            continue;
        }

        if literal {
            parsed.positionals.push(token.clone());
            i += 1;
            continue;
        }

        if let Some(spec) = tree.option_in_scope(scope, token) {
            let name = spec.name().to_string();
            match spec.arity {
                ValueArity::Required => {
                    let value = match tokens.get(i + 1) {
                        None => {
                            return Err(ParseError::MissingArgument {
                                option: spec.long.clone(),
                                flag: None,
                            });
                        }
                        Some(next) if next.starts_with('-') => {
                            return Err(ParseError::MissingArgument {
                                option: spec.long.clone(),
                                flag: Some(next.clone()),
                            });
                        }
                        Some(next) => next.clone(),
                    };
                    parsed.values.set(&name, OptionValue::Str(value));
                    i += 2;
                }
                ValueArity::Optional => {
                    match tokens.get(i + 1) {
                        Some(next) if !next.starts_with('-') => {
                            parsed.values.set(&name, OptionValue::Str(next.clone()));
                            i += 2;
                        }
                        _ => {
                            // No value supplied: fall back to the declared
                            // default, or plain boolean presence.
                            let value = match &spec.default {
                                Some(d) => OptionValue::Str(d.clone()),
                                None => OptionValue::Bool(true),
                            };
                            parsed.values.set(&name, value);
                            i += 1;
                        }
                    }
                }
                ValueArity::None => {
                    parsed.values.set(&name, OptionValue::Bool(true));
                    i += 1;
                }
            }
            continue;
        }

        if looks_like_flag(token) {
            // Unrecognized at this scope: look for a more specific context
            // among the category/command nodes named by the positionals
            // accumulated so far. First match wins.
            let fallback_arity = fallback_option(tree, scope, &parsed.positionals, token)
                .map(|spec| spec.arity)
                .unwrap_or(ValueArity::Optional);

            parsed.unknown.push(token.clone());
            match fallback_arity {
                ValueArity::Required => {
                    if let Some(next) = tokens.get(i + 1) {
                        parsed.unknown.push(next.clone());
                        i += 1;
                    }
                }
                ValueArity::Optional => {
                    if let Some(next) = tokens.get(i + 1) {
                        if !next.starts_with('-') {
                            parsed.unknown.push(next.clone());
                            i += 1;
                        }
                    }
                }
                ValueArity::None => {}
            }
            i += 1;
            continue;
        }

        parsed.positionals.push(token.clone());
        i += 1;
    }

    Ok(parsed)
}

/// Resolve an unrecognized flag against nodes deeper in the tree.
///
/// Walks the accumulated positionals in order, descending through matching
/// child categories of the node being parsed and probing each one's own
/// option set; if the walk stops on a token naming a child command, that
/// command's options are probed last. The first match wins — when several
/// ancestors declare the same flag this tie-break is deliberate, if
/// surprising, behavior.
fn fallback_option<'t>(
    tree: &'t CommandTree,
    scope: NodeId,
    positionals: &[String],
    token: &str,
) -> Option<&'t OptionSpec> {
    let mut node = scope;
    let mut last: Option<&String> = None;

    for positional in positionals {
        last = Some(positional);
        match tree.child_category(node, positional) {
            Some(child) => {
                node = child;
                if let Some(spec) = tree.option_for(node, token) {
                    return Some(spec);
                }
            }
            None => break,
        }
    }

    if let Some(name) = last {
        if let Some(command) = tree.child_command(node, name) {
            return tree.option_for(command, token);
        }
    }

    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::node::TreeBuilder;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    /// Tree with `vm list` (option -s/--subscription) and `vm endpoint
    /// create` (option --endpoint-name, required value).
    fn sample_tree() -> (CommandTree, NodeId) {
        let mut tree = CommandTree::new("nimbus");
        let mut cli = TreeBuilder::new(&mut tree, "test/vm");
        let vm = cli.category("vm", "Commands to manage your virtual machines");
        let list = cli
            .command(vm, "list")
            .description("List virtual machines")
            .option("-s, --subscription <id>", "the subscription identifier")
            .handler(|_, done| done.ok());
        let endpoint = cli.subcategory(vm, "endpoint", "Commands to manage VM endpoints");
        cli.command(endpoint, "create <vm-name> <public-port>")
            .description("Create a VM endpoint")
            .option("--endpoint-name <name>", "the endpoint name")
            .handler(|_, done| done.ok());
        (tree, list)
    }

    #[test]
    fn test_spec_parse_forms() {
        let spec = OptionSpec::parse("-s, --subscription <id>", "sub");
        assert_eq!(spec.long, "--subscription");
        assert_eq!(spec.short.as_deref(), Some("-s"));
        assert_eq!(spec.arity, ValueArity::Required);
        assert_eq!(spec.name(), "subscription");

        let spec = OptionSpec::parse("--json", "json output");
        assert_eq!(spec.arity, ValueArity::None);
        assert!(spec.short.is_none());

        let spec = OptionSpec::parse("--address-space [cidr]", "cidr");
        assert_eq!(spec.arity, ValueArity::Optional);
    }

    #[test]
    fn test_boolean_and_required_options() {
        let (tree, list) = sample_tree();
        let parsed = parse(&tree, list, &args(&["--json", "-s", "prod-sub"])).unwrap();
        assert!(parsed.values.is_set("json"));
        assert_eq!(parsed.values.str_of("subscription"), Some("prod-sub"));
        assert!(parsed.positionals.is_empty());
        assert!(parsed.unknown.is_empty());
    }

    #[test]
    fn test_required_option_missing_value() {
        let (tree, list) = sample_tree();
        let err = parse(&tree, list, &args(&["--subscription"])).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingArgument {
                option: "--subscription".to_string(),
                flag: None,
            }
        );
    }

    #[test]
    fn test_required_option_followed_by_flag() {
        let (tree, list) = sample_tree();
        let err = parse(&tree, list, &args(&["--subscription", "-v"])).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingArgument {
                option: "--subscription".to_string(),
                flag: Some("-v".to_string()),
            }
        );
    }

    #[test]
    fn test_literal_separator() {
        let (tree, list) = sample_tree();
        let parsed = parse(&tree, list, &args(&["create", "--", "--not-an-option"])).unwrap();
        assert_eq!(parsed.positionals, vec!["create", "--not-an-option"]);
        assert!(parsed.unknown.is_empty());
    }

    #[test]
    fn test_bare_dash_and_empty_string_are_positionals() {
        let (tree, list) = sample_tree();
        let parsed = parse(&tree, list, &args(&["-", ""])).unwrap();
        assert_eq!(parsed.positionals, vec!["-", ""]);
    }

    #[test]
    fn test_later_occurrence_overwrites() {
        let (tree, list) = sample_tree();
        let parsed = parse(&tree, list, &args(&["-s", "one", "-s", "two"])).unwrap();
        assert_eq!(parsed.values.str_of("subscription"), Some("two"));
    }

    #[test]
    fn test_global_option_in_scope_via_ancestors() {
        let (tree, list) = sample_tree();
        // -v is declared on the root, not on `list`.
        let parsed = parse(&tree, list, &args(&["-v"])).unwrap();
        assert!(parsed.values.is_set("verbose"));
    }

    #[test]
    fn test_unknown_option_consumes_value_heuristically() {
        let (tree, list) = sample_tree();
        // Default assumption for an unknown flag is "optional": a following
        // non-flag token is carried along into unknown.
        let parsed = parse(&tree, list, &args(&["--bogus", "value", "pos"])).unwrap();
        assert_eq!(parsed.unknown, vec!["--bogus", "value"]);
        assert_eq!(parsed.positionals, vec!["pos"]);
    }

    #[test]
    fn test_unknown_option_before_flag_consumes_nothing() {
        let (tree, list) = sample_tree();
        let parsed = parse(&tree, list, &args(&["--bogus", "--json"])).unwrap();
        assert_eq!(parsed.unknown, vec!["--bogus"]);
        assert!(parsed.values.is_set("json"));
    }

    #[test]
    fn test_fallback_resolution_finds_deeper_context() {
        let (tree, _) = sample_tree();
        // Parsing at the root: positionals name the path vm endpoint create,
        // whose --endpoint-name requires a value. The flag itself is still
        // unknown at root scope, but the required arity makes the parser
        // carry the following token into unknown with it.
        let parsed = parse(
            &tree,
            CommandTree::ROOT,
            &args(&["vm", "endpoint", "create", "--endpoint-name", "web"]),
        )
        .unwrap();
        assert_eq!(parsed.positionals, vec!["vm", "endpoint", "create"]);
        assert_eq!(parsed.unknown, vec!["--endpoint-name", "web"]);
    }

    #[test]
    fn test_fallback_first_match_wins() {
        // Two levels declare --zone; the shallower one is found first.
        let mut tree = CommandTree::new("nimbus");
        let mut cli = TreeBuilder::new(&mut tree, "test/dns");
        let dns = cli.category("dns", "DNS management");
        cli.tree().add_option(dns, OptionSpec::parse("--zone <name>", "outer zone"));
        let record = cli.subcategory(dns, "record", "record management");
        cli.tree()
            .add_option(record, OptionSpec::parse("--zone [name]", "inner zone"));

        let spec = fallback_option(
            &tree,
            CommandTree::ROOT,
            &args(&["dns", "record"]),
            "--zone",
        )
        .expect("fallback match");
        assert_eq!(spec.description, "outer zone");
        assert_eq!(spec.arity, ValueArity::Required);
    }

    #[test]
    fn test_defaults_preassigned() {
        let mut tree = CommandTree::new("nimbus");
        let mut cli = TreeBuilder::new(&mut tree, "test/net");
        let net = cli.category("network", "network");
        let create = cli
            .command(net, "create <name>")
            .description("create")
            .option_with_default("--address-space [cidr]", "address space", "10.0.0.0/16")
            .handler(|_, done| done.ok());

        let parsed = parse(&tree, create, &args(&["frontend"])).unwrap();
        assert_eq!(parsed.values.str_of("address-space"), Some("10.0.0.0/16"));

        let parsed = parse(&tree, create, &args(&["frontend", "--address-space", "10.1.0.0/24"]))
            .unwrap();
        assert_eq!(parsed.values.str_of("address-space"), Some("10.1.0.0/24"));
    }
}

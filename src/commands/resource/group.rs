//! Resource group commands (resource mode).

use serde_json::json;

use crate::cli::exec::{HandlerError, Invocation};
use crate::cli::node::TreeBuilder;
use crate::inventory::{self, GroupRecord};

pub fn init(cli: &mut TreeBuilder) {
    let group = cli.category("group", "Commands to manage resource groups");

    cli.command(group, "create <name> <location>")
        .description("Create a resource group")
        .handler(|inv, done| done.resolve(run_create(&inv)));

    cli.command(group, "list")
        .description("List resource groups")
        .handler(|inv, done| done.resolve(run_list(&inv)));

    cli.command(group, "delete <name>")
        .description("Delete a resource group")
        .handler(|inv, done| done.resolve(run_delete(&inv)));
}

fn run_create(inv: &Invocation) -> Result<(), HandlerError> {
    let name = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a group name is required"))?
        .to_string();
    let location = inv
        .positional(1)
        .ok_or_else(|| HandlerError::msg("a location is required"))?
        .to_string();
    let mut store = inventory::load()?;
    if store.groups.iter().any(|g| g.name == name) {
        return Err(HandlerError::msg(format!(
            "a resource group named '{name}' already exists"
        )));
    }
    let record = GroupRecord { name, location };
    store.groups.push(record.clone());
    inventory::save(&store)?;

    if inv.output.json {
        inv.output.data(&json!(record));
    } else {
        inv.output.info(&format!(
            "Created resource group '{}' in {}",
            record.name, record.location
        ));
    }
    Ok(())
}

fn run_list(inv: &Invocation) -> Result<(), HandlerError> {
    let store = inventory::load()?;
    if inv.output.json {
        inv.output.data(&json!(store.groups));
        return Ok(());
    }
    if store.groups.is_empty() {
        inv.output.info("No resource groups found");
        return Ok(());
    }
    for g in &store.groups {
        inv.output.info(&format!("{:<20} {}", g.name, g.location));
    }
    Ok(())
}

fn run_delete(inv: &Invocation) -> Result<(), HandlerError> {
    let name = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a group name is required"))?;
    let mut store = inventory::load()?;
    let before = store.groups.len();
    store.groups.retain(|g| g.name != name);
    if store.groups.len() == before {
        return Err(HandlerError::msg(format!(
            "no resource group named '{name}'"
        )));
    }
    inventory::save(&store)?;
    inv.output.info(&format!("Deleted resource group '{name}'"));
    Ok(())
}

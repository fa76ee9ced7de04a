//! Virtual network commands (classic mode).

use serde_json::json;

use crate::cli::exec::{HandlerError, Invocation};
use crate::cli::node::TreeBuilder;
use crate::inventory::{self, VnetRecord};

const DEFAULT_ADDRESS_SPACE: &str = "10.0.0.0/16";

pub fn init(cli: &mut TreeBuilder) {
    let network = cli.category("network", "Commands to manage virtual networks");
    let vnet = cli.subcategory(network, "vnet", "Commands to manage your virtual networks");

    cli.command(vnet, "create <name>")
        .description("Create a virtual network")
        .option_with_default(
            "--address-space [cidr]",
            "the address space",
            DEFAULT_ADDRESS_SPACE,
        )
        .handler(|inv, done| done.resolve(run_create(&inv)));

    cli.command(vnet, "list")
        .description("List virtual networks")
        .handler(|inv, done| done.resolve(run_list(&inv)));
}

fn run_create(inv: &Invocation) -> Result<(), HandlerError> {
    let name = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a network name is required"))?
        .to_string();
    let mut store = inventory::load()?;
    if store.vnets.iter().any(|v| v.name == name) {
        return Err(HandlerError::msg(format!(
            "a virtual network named '{name}' already exists"
        )));
    }
    let record = VnetRecord {
        name,
        address_space: inv
            .options
            .str_of("address-space")
            .unwrap_or(DEFAULT_ADDRESS_SPACE)
            .to_string(),
    };
    store.vnets.push(record.clone());
    inventory::save(&store)?;

    if inv.output.json {
        inv.output.data(&json!(record));
    } else {
        inv.output.info(&format!(
            "Created virtual network '{}' ({})",
            record.name, record.address_space
        ));
    }
    Ok(())
}

fn run_list(inv: &Invocation) -> Result<(), HandlerError> {
    let store = inventory::load()?;
    if inv.output.json {
        inv.output.data(&json!(store.vnets));
        return Ok(());
    }
    if store.vnets.is_empty() {
        inv.output.info("No virtual networks found");
        return Ok(());
    }
    for v in &store.vnets {
        inv.output
            .info(&format!("{:<20} {}", v.name, v.address_space));
    }
    Ok(())
}

//! Virtual machine lifecycle commands.

use serde_json::json;

use crate::cli::exec::{HandlerError, Invocation};
use crate::cli::node::TreeBuilder;
use crate::inventory::{self, VmRecord};

const DEFAULT_SIZE: &str = "small";
const DEFAULT_IMAGE: &str = "ubuntu-24.04";

pub fn init(cli: &mut TreeBuilder) {
    let vm = cli.category("vm", "Commands to manage your virtual machines");

    cli.command(vm, "list")
        .description("List virtual machines")
        .option("-s, --subscription <id>", "the subscription to list from")
        .handler(|inv, done| done.resolve(run_list(&inv)));

    cli.command(vm, "create <name>")
        .description("Create a virtual machine")
        .option("-n, --name <name>", "the machine name")
        .option("--image <image>", "the image to boot from")
        .option_with_default("--size [size]", "the machine size", DEFAULT_SIZE)
        .handler(|inv, done| done.resolve(run_create(&inv)));

    cli.command(vm, "delete <name>")
        .description("Delete a virtual machine")
        .handler(|inv, done| done.resolve(run_delete(&inv)));

    cli.command(vm, "start <name>")
        .description("Start a stopped virtual machine")
        .handler(|inv, done| done.resolve(run_set_state(&inv, "running")));

    cli.command(vm, "stop <name>")
        .description("Stop a running virtual machine")
        .handler(|inv, done| done.resolve(run_set_state(&inv, "stopped")));
}

fn run_list(inv: &Invocation) -> Result<(), HandlerError> {
    let store = inventory::load()?;
    if inv.output.json {
        inv.output.data(&json!(store.vms));
        return Ok(());
    }
    if store.vms.is_empty() {
        inv.output.info("No virtual machines found");
        return Ok(());
    }
    for vm in &store.vms {
        inv.output.info(&format!(
            "{:<20} {:<10} {:<16} {}",
            vm.name, vm.size, vm.image, vm.state
        ));
    }
    Ok(())
}

fn run_create(inv: &Invocation) -> Result<(), HandlerError> {
    let name = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a machine name is required"))?
        .to_string();
    let mut store = inventory::load()?;
    if store.vms.iter().any(|vm| vm.name == name) {
        return Err(HandlerError::Detailed {
            message: format!("a virtual machine named '{name}' already exists"),
            detail: json!({ "name": name, "conflict": true }),
        });
    }

    let record = VmRecord {
        name: name.clone(),
        size: inv
            .options
            .str_of("size")
            .unwrap_or(DEFAULT_SIZE)
            .to_string(),
        image: inv
            .options
            .str_of("image")
            .unwrap_or(DEFAULT_IMAGE)
            .to_string(),
        state: "running".to_string(),
    };
    store.vms.push(record.clone());
    inventory::save(&store)?;

    if inv.output.json {
        inv.output.data(&json!(record));
    } else {
        inv.output.info(&format!(
            "Created virtual machine '{}' ({}, {})",
            record.name, record.size, record.image
        ));
    }
    Ok(())
}

fn run_delete(inv: &Invocation) -> Result<(), HandlerError> {
    let name = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a machine name is required"))?;
    let mut store = inventory::load()?;
    let before = store.vms.len();
    store.vms.retain(|vm| vm.name != name);
    if store.vms.len() == before {
        return Err(HandlerError::msg(format!(
            "no virtual machine named '{name}'"
        )));
    }
    // Endpoints attached to the machine go with it.
    store.endpoints.retain(|ep| ep.vm != name);
    inventory::save(&store)?;
    inv.output
        .info(&format!("Deleted virtual machine '{name}'"));
    Ok(())
}

fn run_set_state(inv: &Invocation, state: &str) -> Result<(), HandlerError> {
    let name = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a machine name is required"))?;
    let mut store = inventory::load()?;
    let vm = store
        .vms
        .iter_mut()
        .find(|vm| vm.name == name)
        .ok_or_else(|| HandlerError::msg(format!("no virtual machine named '{name}'")))?;
    if vm.state == state {
        inv.output
            .info(&format!("Virtual machine '{name}' is already {state}"));
        return Ok(());
    }
    vm.state = state.to_string();
    inventory::save(&store)?;
    inv.output
        .info(&format!("Virtual machine '{name}' is now {state}"));
    Ok(())
}

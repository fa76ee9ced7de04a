//! VM endpoint commands. Registered as its own module so the `vm` category
//! is assembled from more than one contributor, the way larger command
//! surfaces split their registrations.

use serde_json::json;

use crate::cli::exec::{HandlerError, Invocation};
use crate::cli::node::TreeBuilder;
use crate::inventory::{self, EndpointRecord};

const DEFAULT_PROTOCOL: &str = "tcp";

pub fn init(cli: &mut TreeBuilder) {
    let vm = cli.category("vm", "Commands to manage your virtual machines");
    let endpoint = cli.subcategory(vm, "endpoint", "Commands to manage machine endpoints");

    cli.command(endpoint, "create <vm-name> <public-port> [local-port]")
        .description("Open an endpoint on a virtual machine")
        .option("--endpoint-name <name>", "the endpoint name")
        .option_with_default("--protocol [protocol]", "tcp or udp", DEFAULT_PROTOCOL)
        .handler(|inv, done| done.resolve(run_create(&inv)));

    cli.command(endpoint, "list <vm-name>")
        .description("List the endpoints of a virtual machine")
        .handler(|inv, done| done.resolve(run_list(&inv)));

    cli.command(endpoint, "delete <vm-name> <endpoint-name>")
        .description("Close an endpoint")
        .handler(|inv, done| done.resolve(run_delete(&inv)));
}

fn parse_port(raw: &str, what: &str) -> Result<u16, HandlerError> {
    raw.parse()
        .map_err(|_| HandlerError::msg(format!("{what} '{raw}' is not a valid port number")))
}

fn require_vm(store: &inventory::Inventory, name: &str) -> Result<(), HandlerError> {
    if store.vms.iter().any(|vm| vm.name == name) {
        Ok(())
    } else {
        Err(HandlerError::msg(format!(
            "no virtual machine named '{name}'"
        )))
    }
}

fn run_create(inv: &Invocation) -> Result<(), HandlerError> {
    let vm = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a machine name is required"))?
        .to_string();
    let port = parse_port(
        inv.positional(1)
            .ok_or_else(|| HandlerError::msg("a public port is required"))?,
        "public port",
    )?;
    let local_port = inv
        .positional(2)
        .map(|raw| parse_port(raw, "local port"))
        .transpose()?;
    let name = inv
        .options
        .str_of("endpoint-name")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}-{}", inv.options.str_of("protocol").unwrap_or(DEFAULT_PROTOCOL), port));
    let protocol = inv
        .options
        .str_of("protocol")
        .unwrap_or(DEFAULT_PROTOCOL)
        .to_string();
    if protocol != "tcp" && protocol != "udp" {
        return Err(HandlerError::msg(format!(
            "protocol must be tcp or udp, not '{protocol}'"
        )));
    }

    let mut store = inventory::load()?;
    require_vm(&store, &vm)?;
    if store
        .endpoints
        .iter()
        .any(|ep| ep.vm == vm && ep.name == name)
    {
        return Err(HandlerError::msg(format!(
            "endpoint '{name}' already exists on '{vm}'"
        )));
    }

    let record = EndpointRecord {
        vm,
        name,
        port,
        local_port,
        protocol,
    };
    store.endpoints.push(record.clone());
    inventory::save(&store)?;

    if inv.output.json {
        inv.output.data(&json!(record));
    } else {
        inv.output.info(&format!(
            "Opened endpoint '{}' on '{}' ({} {})",
            record.name, record.vm, record.protocol, record.port
        ));
    }
    Ok(())
}

fn run_list(inv: &Invocation) -> Result<(), HandlerError> {
    let vm = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a machine name is required"))?;
    let store = inventory::load()?;
    require_vm(&store, vm)?;
    let endpoints: Vec<&EndpointRecord> =
        store.endpoints.iter().filter(|ep| ep.vm == vm).collect();
    if inv.output.json {
        inv.output.data(&json!(endpoints));
        return Ok(());
    }
    if endpoints.is_empty() {
        inv.output.info(&format!("No endpoints on '{vm}'"));
        return Ok(());
    }
    for ep in endpoints {
        let local = ep.local_port.unwrap_or(ep.port);
        inv.output.info(&format!(
            "{:<20} {:>5} -> {:>5} {}",
            ep.name, ep.port, local, ep.protocol
        ));
    }
    Ok(())
}

fn run_delete(inv: &Invocation) -> Result<(), HandlerError> {
    let vm = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a machine name is required"))?;
    let name = inv
        .positional(1)
        .ok_or_else(|| HandlerError::msg("an endpoint name is required"))?;
    let mut store = inventory::load()?;
    require_vm(&store, vm)?;
    let before = store.endpoints.len();
    store.endpoints.retain(|ep| !(ep.vm == vm && ep.name == name));
    if store.endpoints.len() == before {
        return Err(HandlerError::msg(format!(
            "no endpoint '{name}' on '{vm}'"
        )));
    }
    inventory::save(&store)?;
    inv.output.info(&format!("Closed endpoint '{name}' on '{vm}'"));
    Ok(())
}

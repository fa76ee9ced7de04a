//! DNS record commands, nested two categories deep (`dns record ...`).

use serde_json::json;

use crate::cli::exec::{HandlerError, Invocation};
use crate::cli::node::TreeBuilder;
use crate::inventory::{self, DnsRecord};

const DEFAULT_TYPE: &str = "A";
const DEFAULT_TTL: &str = "3600";

pub fn init(cli: &mut TreeBuilder) {
    let dns = cli.category("dns", "Commands to manage DNS zones");
    let record = cli.subcategory(dns, "record", "Commands to manage zone records");

    cli.command(record, "add <zone> <name> <value>")
        .description("Add a record to a zone")
        .option_with_default("--type [type]", "the record type", DEFAULT_TYPE)
        .option_with_default("--ttl [seconds]", "time to live", DEFAULT_TTL)
        .handler(|inv, done| done.resolve(run_add(&inv)));

    cli.command(record, "list <zone>")
        .description("List the records of a zone")
        .handler(|inv, done| done.resolve(run_list(&inv)));

    cli.command(record, "delete <zone> <name>")
        .description("Delete a record from a zone")
        .handler(|inv, done| done.resolve(run_delete(&inv)));
}

fn run_add(inv: &Invocation) -> Result<(), HandlerError> {
    let zone = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a zone is required"))?
        .to_string();
    let name = inv
        .positional(1)
        .ok_or_else(|| HandlerError::msg("a record name is required"))?
        .to_string();
    let value = inv
        .positional(2)
        .ok_or_else(|| HandlerError::msg("a record value is required"))?
        .to_string();
    let rtype = inv
        .options
        .str_of("type")
        .unwrap_or(DEFAULT_TYPE)
        .to_uppercase();
    let ttl_raw = inv.options.str_of("ttl").unwrap_or(DEFAULT_TTL);
    let ttl: u32 = ttl_raw
        .parse()
        .map_err(|_| HandlerError::msg(format!("ttl '{ttl_raw}' is not a number")))?;

    let mut store = inventory::load()?;
    let record = DnsRecord {
        zone,
        name,
        rtype,
        value,
        ttl,
    };
    store.records.push(record.clone());
    inventory::save(&store)?;

    if inv.output.json {
        inv.output.data(&json!(record));
    } else {
        inv.output.info(&format!(
            "Added {} record '{}' to zone '{}'",
            record.rtype, record.name, record.zone
        ));
    }
    Ok(())
}

fn run_list(inv: &Invocation) -> Result<(), HandlerError> {
    let zone = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a zone is required"))?;
    let store = inventory::load()?;
    let records: Vec<&DnsRecord> = store.records.iter().filter(|r| r.zone == zone).collect();
    if inv.output.json {
        inv.output.data(&json!(records));
        return Ok(());
    }
    if records.is_empty() {
        inv.output.info(&format!("No records in zone '{zone}'"));
        return Ok(());
    }
    for r in records {
        inv.output.info(&format!(
            "{:<24} {:<6} {:>6} {}",
            r.name, r.rtype, r.ttl, r.value
        ));
    }
    Ok(())
}

fn run_delete(inv: &Invocation) -> Result<(), HandlerError> {
    let zone = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("a zone is required"))?;
    let name = inv
        .positional(1)
        .ok_or_else(|| HandlerError::msg("a record name is required"))?;
    let mut store = inventory::load()?;
    let before = store.records.len();
    store.records.retain(|r| !(r.zone == zone && r.name == name));
    if store.records.len() == before {
        return Err(HandlerError::msg(format!(
            "no record '{name}' in zone '{zone}'"
        )));
    }
    inventory::save(&store)?;
    inv.output
        .info(&format!("Deleted record '{name}' from zone '{zone}'"));
    Ok(())
}

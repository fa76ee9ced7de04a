//! Account profile commands: which endpoint and subscription later
//! commands act against.

use serde_json::json;

use crate::cli::exec::{HandlerError, Invocation};
use crate::cli::node::TreeBuilder;
use crate::inventory::{self, Profile};

pub fn init(cli: &mut TreeBuilder) {
    let account = cli.category("account", "Commands to manage your account profile");

    cli.command(account, "set <endpoint>")
        .description("Set the active endpoint")
        .option("-s, --subscription <id>", "the subscription to activate")
        .handler(|inv, done| done.resolve(run_set(&inv)));

    cli.command(account, "show")
        .description("Show the active account profile")
        .handler(|inv, done| done.resolve(run_show(&inv)));

    cli.command(account, "clear")
        .description("Forget the stored account profile")
        .handler(|inv, done| done.resolve(run_clear(&inv)));
}

fn run_set(inv: &Invocation) -> Result<(), HandlerError> {
    let endpoint = inv
        .positional(0)
        .ok_or_else(|| HandlerError::msg("an endpoint name is required"))?;
    let profile = Profile {
        endpoint: endpoint.to_string(),
        subscription: inv.options.str_of("subscription").map(str::to_string),
    };
    inventory::save_profile(&profile)?;
    if inv.output.json {
        inv.output.data(&json!({
            "endpoint": profile.endpoint,
            "subscription": profile.subscription,
        }));
    } else {
        inv.output
            .info(&format!("Active endpoint set to '{}'", profile.endpoint));
    }
    Ok(())
}

fn run_show(inv: &Invocation) -> Result<(), HandlerError> {
    match inventory::load_profile()? {
        Some(profile) => {
            if inv.output.json {
                inv.output.data(&json!({
                    "endpoint": profile.endpoint,
                    "subscription": profile.subscription,
                }));
            } else {
                inv.output.info(&format!("Endpoint:     {}", profile.endpoint));
                inv.output.info(&format!(
                    "Subscription: {}",
                    profile.subscription.as_deref().unwrap_or("<none>")
                ));
            }
            Ok(())
        }
        None => Err(HandlerError::msg(
            "no account profile is set; run 'account set <endpoint>' first",
        )),
    }
}

fn run_clear(inv: &Invocation) -> Result<(), HandlerError> {
    inventory::clear_profile()?;
    inv.output.info("Account profile cleared");
    Ok(())
}

//! End-to-end tests against the built binary. Every invocation gets its own
//! config directory through `NIMBUS_CONFIG_DIR`, so tests are hermetic and
//! can run in parallel.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn nimbus(config: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("nimbus");
    cmd.env("NIMBUS_CONFIG_DIR", config.path());
    cmd
}

mod cli_basics {
    use super::*;

    #[test]
    fn shows_root_help() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("nimbus"))
            .stdout(predicate::str::contains("Categories:"))
            .stdout(predicate::str::contains("vm"))
            .stdout(predicate::str::contains("dns"));
    }

    #[test]
    fn shows_version() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn shows_category_help() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .arg("vm")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage: nimbus vm <command>"))
            .stdout(predicate::str::contains("list"))
            .stdout(predicate::str::contains("create <name>"));
    }

    #[test]
    fn shows_command_help_with_options() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["vm", "create", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage: nimbus vm create"))
            .stdout(predicate::str::contains("--size"))
            .stdout(predicate::str::contains("default: small"))
            .stdout(predicate::str::contains("--json"));
    }

    #[test]
    fn help_command_reaches_nested_category() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["help", "vm", "endpoint"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage: nimbus vm endpoint <command>"));
    }
}

mod failures {
    use super::*;

    #[test]
    fn unknown_category_suggests_close_match() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["vn", "list"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("'vn' is not a nimbus command"))
            .stderr(predicate::str::contains("did you mean 'vm'?"));
    }

    #[test]
    fn unknown_command_shows_category_help() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["vm", "lst"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("'lst' is not a command in 'vm'"))
            .stdout(predicate::str::contains("Usage: nimbus vm <command>"));
    }

    #[test]
    fn unknown_option_is_fatal() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["vm", "list", "--bogus"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown option '--bogus' for 'vm list'"));
    }

    #[test]
    fn required_option_value_missing() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["vm", "list", "--subscription"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "option '--subscription' requires a value",
            ));
    }

    #[test]
    fn surplus_positional_is_rejected() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["vm", "create", "web-1", "extra"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("unexpected argument 'extra'"));
    }

    #[test]
    fn failed_command_writes_diagnostic_dump() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["vm", "delete", "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no virtual machine named 'ghost'"))
            .stderr(predicate::str::contains("vm delete command failed"));
        assert!(config.path().join("nimbus.err").exists());
    }
}

mod workflows {
    use super::*;

    #[test]
    fn create_list_delete_machine() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["vm", "create", "web-1", "--image", "debian-12"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created virtual machine 'web-1'"));

        nimbus(&config)
            .args(["vm", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("web-1"))
            .stdout(predicate::str::contains("debian-12"));

        nimbus(&config)
            .args(["vm", "delete", "web-1"])
            .assert()
            .success();

        nimbus(&config)
            .args(["vm", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No virtual machines found"));
    }

    #[test]
    fn json_output_is_machine_readable() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["vm", "create", "web-1", "--json"])
            .assert()
            .success();

        let output = nimbus(&config)
            .args(["vm", "list", "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let parsed: serde_json::Value = serde_json::from_slice(&output).expect("json stdout");
        assert_eq!(parsed[0]["name"], "web-1");
    }

    #[test]
    fn account_profile_round_trip() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["account", "set", "production", "-s", "sub-42"])
            .assert()
            .success();

        nimbus(&config)
            .args(["account", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("production"))
            .stdout(predicate::str::contains("sub-42"));

        nimbus(&config).args(["account", "clear"]).assert().success();

        nimbus(&config)
            .args(["account", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no account profile is set"));
    }

    #[test]
    fn second_run_reuses_command_cache() {
        let config = TempDir::new().unwrap();
        nimbus(&config).args(["vm", "list"]).assert().success();
        assert!(config.path().join("plugins.json").exists());

        nimbus(&config)
            .args(["vm", "create", "cached-1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cached-1"));
    }

    #[test]
    fn resource_mode_swaps_namespaces() {
        let config = TempDir::new().unwrap();
        std::fs::write(config.path().join("config.toml"), "mode = \"resource\"\n").unwrap();

        nimbus(&config)
            .args(["group", "create", "prod", "eu-west"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created resource group 'prod'"));

        nimbus(&config)
            .args(["network", "vnet", "list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("'network' is not a nimbus command"));
    }

    #[test]
    fn verbose_flag_reveals_internal_logging() {
        let config = TempDir::new().unwrap();
        nimbus(&config)
            .args(["-v", "-v", "vm", "list"])
            .assert()
            .success()
            .stderr(predicate::str::contains("[nimbus]"));
    }
}

//! Local inventory store.
//!
//! Domain commands persist their state as JSON files in the config
//! directory: the active profile (endpoint and subscription) in
//! `profile.json` and the managed resources in `inventory.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config;

const PROFILE_FILE: &str = "profile.json";
const INVENTORY_FILE: &str = "inventory.json";

/// The active account profile set by `account set`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    pub name: String,
    pub size: String,
    pub image: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub vm: String,
    pub name: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_port: Option<u16>,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub zone: String,
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub value: String,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VnetRecord {
    pub name: String,
    pub address_space: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub vms: Vec<VmRecord>,
    #[serde(default)]
    pub endpoints: Vec<EndpointRecord>,
    #[serde(default)]
    pub records: Vec<DnsRecord>,
    #[serde(default)]
    pub vnets: Vec<VnetRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

fn profile_path() -> PathBuf {
    config::config_home().join(PROFILE_FILE)
}

fn inventory_path() -> PathBuf {
    config::config_home().join(INVENTORY_FILE)
}

fn load_json<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> anyhow::Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn load_profile() -> anyhow::Result<Option<Profile>> {
    let path = profile_path();
    if !path.exists() {
        return Ok(None);
    }
    load_json(&path).map(Some)
}

pub fn save_profile(profile: &Profile) -> anyhow::Result<()> {
    save_json(&profile_path(), profile)
}

pub fn clear_profile() -> anyhow::Result<()> {
    let path = profile_path();
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
    }
    Ok(())
}

pub fn load() -> anyhow::Result<Inventory> {
    load_json(&inventory_path())
}

pub fn save(inventory: &Inventory) -> anyhow::Result<()> {
    save_json(&inventory_path(), inventory)
}

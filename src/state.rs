//! Configuration documents and the local state file
//!
//! A configuration document maps resource addresses (`<type>.<name>`) to attribute
//! values and is read from JSON or TOML. State is always JSON.

use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const STATE_VERSION: u32 = 1;

/// Desired resources keyed by address
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: BTreeMap<String, Value>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Ok(toml::from_str(&contents)?)
        } else {
            Ok(serde_json::from_str(&contents)?)
        }
    }
}

/// Split `msgraph_group.admins` into (`msgraph_group`, `admins`)
pub fn parse_address(address: &str) -> Result<(&str, &str)> {
    match address.split_once('.') {
        Some((resource_type, name)) if !resource_type.is_empty() && !name.is_empty() => {
            Ok((resource_type, name))
        }
        _ => Err(ProviderError::ConfigError(format!(
            "Invalid resource address '{}', expected <type>.<name>",
            address
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Load state, empty when the file does not exist yet
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let state: StateFile = serde_json::from_str(&contents)?;
        if state.version != STATE_VERSION {
            return Err(ProviderError::InvalidState(format!(
                "unsupported state version {} in {}",
                state.version,
                path.display()
            )));
        }
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    pub fn insert(&mut self, address: &str, resource_type: &str, attributes: Value) {
        self.resources.insert(
            address.to_string(),
            ResourceState {
                resource_type: resource_type.to_string(),
                attributes,
            },
        );
    }

    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        self.resources.remove(address)
    }
}

//! Device inventory loaded from YAML.
//!
//! The inventory is one mapping. A group key (normally `cisco`) lists the
//! devices to poll in order; every other key is a device entry:
//!
//! ```yaml
//! cisco:
//!   - sw-core-01
//!   - sw-access-02
//! sw-core-01:
//!   host: 10.0.0.1
//!   device_type: cisco_xe
//! sw-access-02:
//!   host: 10.0.0.2
//!   device_type: cisco_ios
//!   port: 2222
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::warn;
use secrecy::SecretString;
use serde::Deserialize;

use super::credentials::Credentials;
use crate::error::ConfigError;

/// Connection settings for one device as written in the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceEntry {
    /// Hostname or IP address.
    pub host: String,

    /// Platform tag, e.g. `cisco_xe`.
    pub device_type: String,

    /// SSH port, 22 when absent.
    #[serde(default)]
    pub port: Option<u16>,
}

impl DeviceEntry {
    /// Attach run-time credentials and the transcript path.
    pub fn descriptor(
        &self,
        name: &str,
        credentials: &Credentials,
        session_log: PathBuf,
    ) -> DeviceDescriptor {
        DeviceDescriptor {
            name: name.to_string(),
            host: self.host.clone(),
            port: self.port.unwrap_or(22),
            device_type: self.device_type.clone(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            session_log,
        }
    }
}

/// Everything needed to open a session to one device during this run.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub device_type: String,
    pub username: String,
    pub password: SecretString,
    pub session_log: PathBuf,
}

/// Ordered set of devices to poll.
#[derive(Debug, Clone)]
pub struct Inventory {
    group: String,
    devices: IndexMap<String, DeviceEntry>,
}

impl Inventory {
    /// Read and validate the inventory file.
    pub fn load(path: &Path, group: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, group, path)
    }

    /// Parse inventory YAML. `origin` is only used in error messages.
    pub fn from_yaml_str(text: &str, group: &str, origin: &Path) -> Result<Self, ConfigError> {
        let malformed = |source| ConfigError::Malformed {
            path: origin.to_path_buf(),
            source,
        };

        let document: IndexMap<String, serde_yaml::Value> =
            serde_yaml::from_str(text).map_err(malformed)?;

        let listed = document
            .get(group)
            .ok_or_else(|| ConfigError::MissingGroup {
                group: group.to_string(),
            })?;
        let names: Vec<String> = serde_yaml::from_value(listed.clone()).map_err(malformed)?;

        let mut devices = IndexMap::with_capacity(names.len());
        for name in names {
            let value = document
                .get(&name)
                .ok_or_else(|| ConfigError::MissingDevice {
                    name: name.clone(),
                    group: group.to_string(),
                })?;
            let entry: DeviceEntry = serde_yaml::from_value(value.clone()).map_err(|source| {
                ConfigError::InvalidDevice {
                    name: name.clone(),
                    source,
                }
            })?;

            if devices.contains_key(&name) {
                warn!("device '{name}' listed twice in group '{group}', polling it once");
                continue;
            }
            devices.insert(name, entry);
        }

        Ok(Self {
            group: group.to_string(),
            devices,
        })
    }

    /// Name of the group that was loaded.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Devices in polling order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceEntry)> {
        self.devices.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Look up one device.
    pub fn get(&self, name: &str) -> Option<&DeviceEntry> {
        self.devices.get(name)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

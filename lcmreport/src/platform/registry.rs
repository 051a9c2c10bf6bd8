//! Registry for looking up platform definitions by device type.

use std::collections::HashMap;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Registry for platform definitions.
///
/// Owned by the shell that opens sessions rather than held in a global, so
/// each run decides which device types it accepts.
#[derive(Debug, Default, Clone)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in Cisco platforms.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(vendors::cisco::iosxe()?)?;
        registry.register(vendors::cisco::ios()?)?;
        registry.register(vendors::cisco::nxos()?)?;
        Ok(registry)
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: platform.name.clone(),
            }
            .into());
        }
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    /// Get a platform by name, failing for unsupported device types.
    pub fn resolve(&self, name: &str) -> Result<&PlatformDefinition> {
        self.get(name).ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: name.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_builtin_platforms() {
        let registry = PlatformRegistry::with_builtin().unwrap();
        for name in ["cisco_xe", "cisco_ios", "cisco_nxos"] {
            assert_eq!(registry.resolve(name).unwrap().name, name);
        }
        assert!(registry.get("arista_eos").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = PlatformRegistry::with_builtin().unwrap();
        let err = registry
            .register(vendors::cisco::iosxe().unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::AlreadyRegistered { .. })
        ));
    }

    #[test]
    fn test_resolve_unknown_device_type() {
        let registry = PlatformRegistry::with_builtin().unwrap();
        let err = registry.resolve("juniper_junos").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Platform error: Unsupported device type 'juniper_junos'"
        );
    }
}

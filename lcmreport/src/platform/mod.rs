//! Platform definitions for the supported device types.
//!
//! A platform tells the driver how a device type's prompt looks, which
//! output marks a rejected command, and what to run right after login.

mod definition;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use registry::PlatformRegistry;

//! Run configuration: device inventory, credentials and mail settings.
//!
//! Everything here is read once at startup. Any error is fatal for the run.

mod credentials;
mod inventory;
mod mail;

pub use credentials::{Credentials, PASSWORD_VAR, Prompter, TerminalPrompter, USERNAME_VAR};
pub use inventory::{DeviceDescriptor, DeviceEntry, Inventory};
pub use mail::{DEFAULT_SMTP_PORT, MailSettings};

/// Process environment lookup for [`Credentials::resolve`] and
/// [`MailSettings::from_lookup`].
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Non-empty value of an environment variable.
fn env_value<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

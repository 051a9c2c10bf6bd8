//! Mail account settings from the environment.

use secrecy::SecretString;

use super::env_value;
use crate::error::ConfigError;

pub const SENDER_VAR: &str = "SENDER_EMAIL";
pub const PASSWORD_VAR: &str = "PASSWORD_EMAIL";
pub const RECEIVER_VAR: &str = "RECEIVER_EMAIL";
pub const SERVER_VAR: &str = "SMTP_SERVER";
pub const PORT_VAR: &str = "SMTP_PORT";

/// Submission port used when `SMTP_PORT` is unset.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Where and as whom the run summary is mailed.
#[derive(Debug, Clone)]
pub struct MailSettings {
    /// From address, also the SMTP login.
    pub sender: String,
    pub password: SecretString,
    pub receiver: String,
    pub server: String,
    pub port: u16,
}

impl MailSettings {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required =
            |name: &'static str| env_value(&lookup, name).ok_or(ConfigError::MissingEnv(name));

        let port = match env_value(&lookup, PORT_VAR) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidEnv {
                name: PORT_VAR,
                message: format!("'{raw}': {e}"),
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            sender: required(SENDER_VAR)?,
            password: SecretString::from(required(PASSWORD_VAR)?),
            receiver: required(RECEIVER_VAR)?,
            server: required(SERVER_VAR)?,
            port,
        })
    }
}

//! Platform definition for device-type specific behaviour.

use memchr::memrchr;
use regex::bytes::Regex;

use crate::error::{PlatformError, Result};

/// Everything the driver needs to know about one device type.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name, matched against a device's `device_type`
    /// (e.g. "cisco_xe", "cisco_ios").
    pub name: String,

    /// Pattern matching the trailing prompt at the end of the buffer.
    pub prompt_pattern: Regex,

    /// Substrings that mark a command as rejected by the device.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when the connection is established.
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a platform definition with its prompt pattern.
    pub fn new(name: impl Into<String>, prompt_pattern: &str) -> Result<Self> {
        let name = name.into();
        let prompt_pattern =
            Regex::new(prompt_pattern).map_err(|e| PlatformError::InvalidDefinition {
                message: format!("prompt pattern for '{name}': {e}"),
            })?;

        Ok(Self {
            name,
            prompt_pattern,
            failed_when_contains: vec![],
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        })
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Strip the command echo and the trailing prompt from raw output.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let text = raw.replace("\r\n", "\n").replace('\r', "");

        let body = match text.find('\n') {
            Some(pos) if text[..pos].contains(command.trim()) => &text[pos + 1..],
            _ => text.as_str(),
        };

        // Last line is the prompt.
        match memrchr(b'\n', body.as_bytes()) {
            Some(pos) => body[..pos].to_string(),
            None => String::new(),
        }
    }

    /// Return the first failure marker found in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .cloned()
    }
}

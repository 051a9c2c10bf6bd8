//! Structured parsing of command output.
//!
//! A parser turns the text a device printed for one command into an ordered
//! list of records. Anything it cannot structure is a [`ParseError`], which
//! the command runner records as a failed command.

mod textfsm;

pub use textfsm::TextFsmParser;

use indexmap::IndexMap;
use thiserror::Error;

/// One parsed record: field name (lowercase) to value.
pub type Record = IndexMap<String, String>;

/// Records parsed from one command's output, in the order they appeared.
///
/// A stacked switch yields one record per member for `show switch`; a
/// single-record command such as `show version` yields exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    records: Vec<Record>,
}

impl ParsedOutput {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Build output from `(field, value)` pairs, one slice per record.
    pub fn from_pairs(records: &[&[(&str, &str)]]) -> Self {
        Self::new(
            records
                .iter()
                .map(|pairs| {
                    pairs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Field of the record at `index`.
    pub fn field(&self, index: usize, field: &str) -> Option<&str> {
        self.records
            .get(index)
            .and_then(|record| record.get(field))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Why output could not be structured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No template/parser exists for this command
    #[error("no parser for command '{command}'")]
    UnknownCommand { command: String },

    /// Parser ran but matched nothing
    #[error("output of '{command}' produced no records")]
    NoRecords { command: String },

    /// Template is broken or the parser failed
    #[error("parser for '{command}' failed: {message}")]
    Parser { command: String, message: String },
}

/// Capability to structure raw command output.
pub trait StructuredParser: Send + Sync {
    fn parse(&self, command: &str, raw: &str) -> Result<ParsedOutput, ParseError>;
}

/// Canonical form of a command used for lookups: lowercase, single spaces.
pub fn normalize_command(command: &str) -> String {
    command
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_command() {
        assert_eq!(normalize_command("  Show   Version "), "show version");
    }

    #[test]
    fn test_field_lookup() {
        let output = ParsedOutput::from_pairs(&[
            &[("switch", "1"), ("mac_address", "00a3.d1e5.2b00")],
            &[("switch", "2"), ("mac_address", "00a3.d1e5.4a80")],
        ]);
        assert_eq!(output.len(), 2);
        assert_eq!(output.field(1, "mac_address"), Some("00a3.d1e5.4a80"));
        assert_eq!(output.field(2, "mac_address"), None);
        assert_eq!(output.field(0, "serial"), None);
    }
}

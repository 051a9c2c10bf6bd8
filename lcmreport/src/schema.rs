//! Declarative report schemas.
//!
//! A schema names the commands to run on every device and describes each
//! report sheet: its header and where every cell comes from. Report variants
//! differ only in their schema.
//!
//! ```yaml
//! name: catalyst-basic
//! label: Cisco Catalyst
//! commands: [show version, show switch]
//! sheets:
//!   - title: General
//!     columns:
//!       - header: Device
//!       - header: Software
//!         command: show version
//!         field: version
//!   - title: Serial and Mac
//!     rows:
//!       per_record:
//!         command: show switch
//!     columns:
//!       - header: Device
//!       - header: Mac
//!         command: show switch
//!         field: mac_address
//! ```
//!
//! A column without `command` is a device attribute: the device name when
//! `field` is absent, otherwise one of `name`, `host` or `device_type`.
//!
//! On a per-record sheet, records of other commands are matched to the
//! driving record by position, or by the shared `key` field when one is
//! given (`key: switch` pairs inventory entries with stack members).

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::parse::normalize_command;

const BUILTIN_SCHEMAS: &[(&str, &str)] = &[
    ("catalyst", include_str!("../schemas/catalyst.yml")),
    ("catalyst-basic", include_str!("../schemas/catalyst-basic.yml")),
];

/// Where a cell value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    DeviceName,
    Host,
    DeviceType,
    /// A field of a command's parsed output.
    Field { command: String, field: String },
}

/// One report column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawColumn")]
pub struct ColumnSpec {
    pub header: String,
    pub source: ColumnSource,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawColumn {
    header: String,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    field: Option<String>,
}

impl TryFrom<RawColumn> for ColumnSpec {
    type Error = String;

    fn try_from(raw: RawColumn) -> Result<Self, Self::Error> {
        let source = match (raw.command, raw.field) {
            (None, None) => ColumnSource::DeviceName,
            (None, Some(field)) => match field.as_str() {
                "name" => ColumnSource::DeviceName,
                "host" => ColumnSource::Host,
                "device_type" => ColumnSource::DeviceType,
                other => {
                    return Err(format!(
                        "column '{}': '{other}' is not a device attribute, add a command",
                        raw.header
                    ));
                }
            },
            (Some(command), Some(field)) => ColumnSource::Field {
                command: normalize_command(&command),
                field: field.to_ascii_lowercase(),
            },
            (Some(_), None) => {
                return Err(format!("column '{}': command without field", raw.header));
            }
        };
        Ok(Self {
            header: raw.header,
            source,
        })
    }
}

/// How many rows a device contributes to a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowMode {
    /// Exactly one row per device.
    #[default]
    PerDevice,
    /// One row per record of `command`'s output. Other commands' records
    /// join on the `key` field, or by position without one.
    PerRecord {
        command: String,
        #[serde(default)]
        key: Option<String>,
    },
}

/// One sheet of the report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetSchema {
    pub title: String,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub rows: RowMode,
    pub columns: Vec<ColumnSpec>,
}

impl SheetSchema {
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.clone()).collect()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// A complete report variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSchema {
    pub name: String,
    /// Human-readable name used in the mail subject.
    #[serde(default)]
    pub label: Option<String>,
    pub commands: Vec<String>,
    pub sheets: Vec<SheetSchema>,
}

impl ReportSchema {
    /// A built-in schema by name.
    pub fn builtin(name: &str) -> Result<Self, ConfigError> {
        let (_, text) = BUILTIN_SCHEMAS
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .ok_or_else(|| ConfigError::UnknownSchema(name.to_string()))?;
        Self::from_yaml_str(text, Path::new(name))
    }

    /// Names of the built-in schemas.
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTIN_SCHEMAS.iter().map(|(name, _)| *name)
    }

    /// Read a schema from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    /// Built-in name, or else a path to a schema file.
    pub fn resolve(name_or_path: &str) -> Result<Self, ConfigError> {
        if Self::builtin_names().any(|name| name == name_or_path) {
            return Self::builtin(name_or_path);
        }
        let path = Path::new(name_or_path);
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml" | "yaml")
        );
        if is_yaml || path.exists() {
            Self::load(path)
        } else {
            Err(ConfigError::UnknownSchema(name_or_path.to_string()))
        }
    }

    /// Parse and validate schema YAML. `origin` is only used in errors.
    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut schema: Self =
            serde_yaml::from_str(text).map_err(|source| ConfigError::Malformed {
                path: origin.to_path_buf(),
                source,
            })?;
        schema.normalize();
        schema.validate()?;
        Ok(schema)
    }

    /// Name used in the mail subject.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn sheet(&self, title: &str) -> Option<&SheetSchema> {
        self.sheets.iter().find(|sheet| sheet.title == title)
    }

    fn normalize(&mut self) {
        for command in &mut self.commands {
            *command = normalize_command(command);
        }
        for sheet in &mut self.sheets {
            if let RowMode::PerRecord { command, key } = &mut sheet.rows {
                *command = normalize_command(command);
                if let Some(key) = key {
                    *key = key.trim().to_ascii_lowercase();
                }
            }
        }
    }

    /// Check that the schema is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidSchema {
            schema: self.name.clone(),
            message,
        };

        if self.commands.is_empty() {
            return Err(invalid("no commands".into()));
        }
        if self.sheets.is_empty() {
            return Err(invalid("no sheets".into()));
        }

        let mut commands = HashSet::new();
        for command in &self.commands {
            if !commands.insert(command.as_str()) {
                return Err(invalid(format!("command '{command}' listed twice")));
            }
        }

        let mut titles = HashSet::new();
        for sheet in &self.sheets {
            // Excel compares sheet titles case-insensitively.
            if !titles.insert(sheet.title.to_lowercase()) {
                return Err(invalid(format!("duplicate sheet '{}'", sheet.title)));
            }
            check_sheet_title(&sheet.title).map_err(|reason| {
                invalid(format!("sheet title '{}' {reason}", sheet.title))
            })?;
            if sheet.columns.is_empty() {
                return Err(invalid(format!("sheet '{}' has no columns", sheet.title)));
            }
            if let RowMode::PerRecord { command, key } = &sheet.rows {
                if !commands.contains(command.as_str()) {
                    return Err(invalid(format!(
                        "sheet '{}' is driven by '{command}', which is not run",
                        sheet.title
                    )));
                }
                if key.as_deref() == Some("") {
                    return Err(invalid(format!(
                        "sheet '{}' has an empty join key",
                        sheet.title
                    )));
                }
            }
            for column in &sheet.columns {
                if let ColumnSource::Field { command, .. } = &column.source {
                    if !commands.contains(command.as_str()) {
                        return Err(invalid(format!(
                            "column '{}' of sheet '{}' reads '{command}', which is not run",
                            column.header, sheet.title
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Characters Excel refuses in a sheet title.
const FORBIDDEN_TITLE_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

fn check_sheet_title(title: &str) -> Result<(), String> {
    if title.is_empty() || title.chars().count() > 31 {
        return Err("must be 1 to 31 characters".into());
    }
    if let Some(c) = title.chars().find(|c| FORBIDDEN_TITLE_CHARS.contains(c)) {
        return Err(format!("must not contain '{c}'"));
    }
    if title.starts_with('\'') || title.ends_with('\'') {
        return Err("must not start or end with an apostrophe".into());
    }
    if title.eq_ignore_ascii_case("history") {
        return Err("is reserved".into());
    }
    Ok(())
}

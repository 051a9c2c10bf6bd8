//! TextFSM-backed parser with bundled Cisco templates.

use std::collections::HashMap;

use log::trace;
use textfsm_rust::Template;

use super::{ParseError, ParsedOutput, Record, StructuredParser, normalize_command};

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "show version",
        include_str!("../../templates/cisco_show_version.textfsm"),
    ),
    (
        "show switch",
        include_str!("../../templates/cisco_show_switch.textfsm"),
    ),
    (
        "show inventory",
        include_str!("../../templates/cisco_show_inventory.textfsm"),
    ),
    (
        "show license summary",
        include_str!("../../templates/cisco_show_license_summary.textfsm"),
    ),
];

/// Parser mapping commands to TextFSM templates.
///
/// Field names come out lowercase (`VERSION` becomes `version`).
#[derive(Debug, Clone, Default)]
pub struct TextFsmParser {
    templates: HashMap<String, String>,
}

impl TextFsmParser {
    /// Parser with no templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser holding the bundled templates.
    pub fn with_builtin() -> Result<Self, ParseError> {
        let mut parser = Self::new();
        for (command, template) in BUILTIN_TEMPLATES {
            parser.register(command, *template)?;
        }
        Ok(parser)
    }

    /// Register (or replace) the template for a command.
    ///
    /// The template is compiled once here so a broken template is reported
    /// at startup rather than as a failed command on every device.
    pub fn register(
        &mut self,
        command: &str,
        template: impl Into<String>,
    ) -> Result<(), ParseError> {
        let template = template.into();
        Template::parse_str(&template).map_err(|e| ParseError::Parser {
            command: command.to_string(),
            message: e.to_string(),
        })?;
        self.templates.insert(normalize_command(command), template);
        Ok(())
    }

    /// Whether a template exists for `command`.
    pub fn supports(&self, command: &str) -> bool {
        self.templates.contains_key(&normalize_command(command))
    }
}

impl StructuredParser for TextFsmParser {
    fn parse(&self, command: &str, raw: &str) -> Result<ParsedOutput, ParseError> {
        let source = self
            .templates
            .get(&normalize_command(command))
            .ok_or_else(|| ParseError::UnknownCommand {
                command: command.to_string(),
            })?;

        let parser_error = |message: String| ParseError::Parser {
            command: command.to_string(),
            message,
        };

        let template = Template::parse_str(source).map_err(|e| parser_error(e.to_string()))?;
        let mut parser = template.parser();
        let rows = parser
            .parse_text_to_dicts(raw)
            .map_err(|e| parser_error(e.to_string()))?;

        trace!("'{command}' parsed into {} records", rows.len());

        if rows.is_empty() {
            return Err(ParseError::NoRecords {
                command: command.to_string(),
            });
        }

        let records = rows
            .into_iter()
            .map(|row| {
                let mut fields: Vec<(String, String)> = row
                    .into_iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v))
                    .collect();
                fields.sort_by(|a, b| a.0.cmp(&b.0));
                fields.into_iter().collect::<Record>()
            })
            .collect();

        Ok(ParsedOutput::new(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_VERSION: &str = "\
Cisco IOS XE Software, Version 17.09.04a
Cisco IOS Software [Cupertino], Catalyst L3 Switch Software (CAT9K_IOSXE), Version 17.9.4a, RELEASE SOFTWARE (fc5)
Technical Support: http://www.cisco.com/techsupport

ROM: IOS-XE ROMMON
BOOTLDR: System Bootstrap, Version 17.9.1r, RELEASE SOFTWARE (P)

sw-core-01 uptime is 1 year, 2 weeks, 3 days, 4 hours, 5 minutes
Uptime for this control processor is 1 year, 2 weeks, 3 days, 4 hours, 7 minutes

Base Ethernet MAC Address          : 00:a3:d1:e5:2b:00
Model Number                       : C9300-48P
System Serial Number               : FCW2234L0AB
";

    const SHOW_SWITCH: &str = "\
Switch/Stack Mac Address : 00a3.d1e5.2b00 - Local Mac Address
Mac persistency wait time: Indefinite
                                             H/W   Current
Switch#   Role    Mac Address     Priority Version  State
-------------------------------------------------------------
*1       Active   00a3.d1e5.2b00     15     V02     Ready
 2       Standby  00a3.d1e5.4a80     14     V02     Ready
";

    const SHOW_INVENTORY: &str = r#"NAME: "c93xx Stack", DESCR: "c93xx Stack"
PID: C9300-48P         , VID: V02  , SN: FCW2234L0AB

NAME: "Switch 1", DESCR: "C9300-48P"
PID: C9300-48P         , VID: V02  , SN: FCW2234L0AB

NAME: "Switch 1 - Power Supply A", DESCR: "Switch 1 - Power Supply A"
PID: PWR-C1-715WAC-P   , VID: V01  , SN: DCB2231G0XY

NAME: "Switch 2", DESCR: "C9300-24T"
PID: C9300-24T         , VID: V02  , SN: FOC2222B
"#;

    #[test]
    fn test_builtin_templates_compile() {
        let parser = TextFsmParser::with_builtin().unwrap();
        for (command, _) in BUILTIN_TEMPLATES {
            assert!(parser.supports(command));
        }
        assert!(parser.supports("SHOW   VERSION"));
    }

    #[test]
    fn test_show_version() {
        let parser = TextFsmParser::with_builtin().unwrap();
        let output = parser.parse("show version", SHOW_VERSION).unwrap();

        assert_eq!(output.len(), 1);
        assert_eq!(output.field(0, "hostname"), Some("sw-core-01"));
        // The release line, not the IOS XE banner or the bootloader.
        assert_eq!(output.field(0, "version"), Some("17.9.4a"));
        assert_eq!(output.field(0, "model"), Some("C9300-48P"));
        assert_eq!(output.field(0, "serial"), Some("FCW2234L0AB"));
        assert_eq!(
            output.field(0, "uptime"),
            Some("1 year, 2 weeks, 3 days, 4 hours, 5 minutes")
        );
    }

    #[test]
    fn test_show_switch_one_record_per_member() {
        let parser = TextFsmParser::with_builtin().unwrap();
        let output = parser.parse("show switch", SHOW_SWITCH).unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(output.field(0, "switch"), Some("1"));
        assert_eq!(output.field(0, "role"), Some("Active"));
        assert_eq!(output.field(1, "mac_address"), Some("00a3.d1e5.4a80"));
    }

    #[test]
    fn test_show_inventory_keeps_stack_members_only() {
        let parser = TextFsmParser::with_builtin().unwrap();
        let output = parser.parse("show inventory", SHOW_INVENTORY).unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(output.field(0, "switch"), Some("1"));
        assert_eq!(output.field(1, "switch"), Some("2"));
        assert_eq!(output.field(1, "pid"), Some("C9300-24T"));
        assert_eq!(output.field(1, "sn"), Some("FOC2222B"));
    }

    #[test]
    fn test_unknown_command() {
        let parser = TextFsmParser::with_builtin().unwrap();
        let err = parser.parse("show ip route", "Gateway of last resort").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownCommand {
                command: "show ip route".to_string()
            }
        );
    }

    #[test]
    fn test_no_records() {
        let parser = TextFsmParser::with_builtin().unwrap();
        let err = parser.parse("show switch", "").unwrap_err();
        assert!(matches!(err, ParseError::NoRecords { .. }));
    }
}

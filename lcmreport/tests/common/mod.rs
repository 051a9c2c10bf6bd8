//! Scripted shell and parser shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use lcmreport::config::{DeviceDescriptor, Inventory};
use lcmreport::driver::Response;
use lcmreport::error::{ChannelError, Result, TransportError};
use lcmreport::parse::{ParseError, ParsedOutput, Record, StructuredParser};
use lcmreport::session::{RemoteShell, ShellSession};
use lcmreport::{Credentials, RunContext, RunPaths};
use secrecy::SecretString;

/// How a scripted device answers one command.
#[derive(Debug, Clone)]
pub enum Answer {
    /// `key=value` lines; `---` separates records.
    Output(String),
    /// Device prints an error marker.
    Rejected(String),
}

#[derive(Debug, Clone, Default)]
pub struct DeviceScript {
    pub unreachable: bool,
    pub answers: HashMap<String, Answer>,
}

impl DeviceScript {
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            answers: HashMap::new(),
        }
    }

    pub fn answer(mut self, command: &str, output: &str) -> Self {
        self.answers
            .insert(command.to_string(), Answer::Output(output.to_string()));
        self
    }

    pub fn reject(mut self, command: &str, marker: &str) -> Self {
        self.answers
            .insert(command.to_string(), Answer::Rejected(marker.to_string()));
        self
    }
}

/// Shell whose devices follow a script. Reachable devices write a transcript
/// to their session log; unreachable ones leave an empty file behind, like a
/// transport that opened its log before the connection failed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedShell {
    devices: HashMap<String, DeviceScript>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, name: &str, script: DeviceScript) -> Self {
        self.devices.insert(name.to_string(), script);
        self
    }
}

pub struct ScriptedSession {
    name: String,
    answers: HashMap<String, Answer>,
    transcript: std::fs::File,
}

impl RemoteShell for ScriptedShell {
    type Session = ScriptedSession;

    async fn open(&self, device: &DeviceDescriptor) -> Result<ScriptedSession> {
        let mut transcript = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&device.session_log)
            .map_err(TransportError::Io)?;

        let script = self.devices.get(&device.name).cloned().unwrap_or_default();
        if script.unreachable {
            return Err(TransportError::Timeout(Duration::from_secs(30)).into());
        }

        writeln!(transcript, "{}#", device.name).map_err(TransportError::Io)?;
        Ok(ScriptedSession {
            name: device.name.clone(),
            answers: script.answers,
            transcript,
        })
    }
}

impl ShellSession for ScriptedSession {
    async fn send(&mut self, command: &str) -> Result<Response> {
        let prompt = format!("{}#", self.name);
        let answer = self
            .answers
            .get(command)
            .cloned()
            .ok_or(ChannelError::Closed)?;
        let text = match &answer {
            Answer::Output(text) | Answer::Rejected(text) => text.clone(),
        };
        writeln!(self.transcript, "{command}\n{text}\n{prompt}").map_err(TransportError::Io)?;

        let response = Response::new(command, text, Duration::ZERO);
        Ok(match answer {
            Answer::Output(_) => response,
            Answer::Rejected(marker) => response.with_failure(marker),
        })
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

/// Parses `key=value` lines; `---` starts a new record.
pub struct KeyValueParser;

impl StructuredParser for KeyValueParser {
    fn parse(&self, command: &str, raw: &str) -> std::result::Result<ParsedOutput, ParseError> {
        let records: Vec<Record> = raw
            .split("---")
            .map(|chunk| {
                chunk
                    .lines()
                    .filter_map(|line| line.split_once('='))
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .collect::<Record>()
            })
            .filter(|record| !record.is_empty())
            .collect();
        if records.is_empty() {
            return Err(ParseError::NoRecords {
                command: command.to_string(),
            });
        }
        Ok(ParsedOutput::new(records))
    }
}

/// Run context rooted in `dir`, with the session directory created.
pub fn context(dir: &Path) -> RunContext {
    let timestamp = "2024-03-01_09-30-00";
    let paths = RunPaths::new(
        &dir.join("reports"),
        &dir.join("logs"),
        "LCM_REPORT_CISCO",
        timestamp,
    );
    std::fs::create_dir_all(&paths.session_dir).unwrap();
    std::fs::create_dir_all(paths.run_log.parent().unwrap()).unwrap();
    std::fs::write(&paths.run_log, b"").unwrap();
    RunContext::new(
        timestamp,
        Credentials::new("netops", SecretString::from("s3cret".to_string())),
        paths,
    )
}

/// Inventory of `names`, all `cisco_xe`, in the given order.
pub fn inventory(names: &[&str]) -> Inventory {
    let mut yaml = String::from("cisco:\n");
    for name in names {
        yaml.push_str(&format!("  - {name}\n"));
    }
    for (index, name) in names.iter().enumerate() {
        yaml.push_str(&format!(
            "{name}:\n  host: 10.0.0.{}\n  device_type: cisco_xe\n",
            index + 1
        ));
    }
    Inventory::from_yaml_str(&yaml, "cisco", Path::new("devices.yml")).unwrap()
}

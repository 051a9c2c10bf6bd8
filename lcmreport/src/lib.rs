//! # lcmreport
//!
//! Lifecycle inventory reporting for fleets of network switches.
//!
//! lcmreport logs into every switch of an inventory over SSH, runs a fixed
//! list of `show` commands, parses their output into structured records and
//! writes the facts into a multi-sheet XLSX report. Devices are polled one at
//! a time; each device's rows are persisted as soon as it is done, so an
//! interrupted run keeps what it already collected. At the end an operator
//! gets a summary naming every device that could not be fully polled.
//!
//! ## Pipeline
//!
//! - [`session`]: opens one interactive session per device ([`SshShell`] on
//!   top of [`GenericDriver`]).
//! - [`poller`]: runs the commands in order and records every result,
//!   success or failure, in a [`DeviceOutcome`].
//! - [`extract`]: maps outcomes onto rows as described by a [`ReportSchema`].
//! - [`report`]: appends rows to the report ([`XlsxReport`]).
//! - [`fleet`]: drives all of the above for a whole [`Inventory`].
//! - [`notify`]: mails or prints the run summary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use lcmreport::{
//!     Credentials, Fleet, Inventory, PlatformRegistry, ReportSchema, RunContext, RunPaths,
//!     SshShell, TextFsmParser, XlsxReport,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let inventory = Inventory::load("devices.yml".as_ref(), "cisco")?;
//!     let schema = ReportSchema::builtin("catalyst")?;
//!     let paths = RunPaths::new("reports".as_ref(), "logs".as_ref(), "LCM", "2024-01-01_00-00-00");
//!     let credentials = Credentials::new("admin", "secret".to_string().into());
//!     let context = RunContext::new("2024-01-01_00-00-00", credentials, paths);
//!
//!     let mut report = XlsxReport::create(&context.paths.report, &schema)?;
//!     let shell = SshShell::new(PlatformRegistry::with_builtin()?, Duration::from_secs(30));
//!     let parser = TextFsmParser::with_builtin()?;
//!
//!     let result = Fleet::new(&context, &shell, &parser, &schema)
//!         .run(&inventory, &mut report)
//!         .await;
//!     println!("failed: {:?}", result.failed_devices);
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod extract;
pub mod fleet;
pub mod notify;
pub mod parse;
pub mod platform;
pub mod poller;
pub mod report;
pub mod schema;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use config::{Credentials, DeviceDescriptor, Inventory, MailSettings};
pub use context::{RunContext, RunPaths};
pub use driver::{DriverBuilder, GenericDriver, Response};
pub use error::Error;
pub use extract::{DeviceRows, FactExtractor, UNKNOWN};
pub use fleet::{Fleet, FleetRunResult};
pub use notify::{Notification, Notifier, SmtpMailer};
pub use parse::{ParsedOutput, StructuredParser, TextFsmParser};
pub use platform::{PlatformDefinition, PlatformRegistry};
pub use poller::{CommandResult, DeviceOutcome, DevicePoller};
pub use report::{MemoryReport, ReportSink, XlsxReport};
pub use schema::ReportSchema;
pub use session::{RemoteShell, ShellSession, SshShell};
pub use transport::SshConfig;

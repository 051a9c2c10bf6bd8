//! Per-device polling.
//!
//! A [`DevicePoller`] opens a session, runs the configured commands in fixed
//! order and always closes what it opened. Every problem on the way ends up
//! in the returned [`DeviceOutcome`]; nothing here returns an error.

mod outcome;
mod runner;

pub use outcome::{CommandFailure, CommandResult, Connection, DeviceOutcome, FailureCause};
pub use runner::CommandRunner;

use indexmap::IndexMap;
use log::info;

use crate::config::DeviceDescriptor;
use crate::parse::StructuredParser;
use crate::session::{RemoteShell, SessionHandle};

/// Polls one device at a time with a fixed command list.
pub struct DevicePoller<'a, R, P: ?Sized> {
    shell: &'a R,
    runner: CommandRunner<'a, P>,
    commands: &'a [String],
}

impl<'a, R, P> DevicePoller<'a, R, P>
where
    R: RemoteShell,
    P: StructuredParser + ?Sized,
{
    pub fn new(shell: &'a R, parser: &'a P, commands: &'a [String]) -> Self {
        Self {
            shell,
            runner: CommandRunner::new(parser),
            commands,
        }
    }

    /// Poll `device`. Produces exactly one outcome whatever happens.
    pub async fn poll(&self, device: &DeviceDescriptor) -> DeviceOutcome {
        let mut session = match SessionHandle::open(self.shell, device).await {
            Ok(session) => session,
            Err(failure) => {
                return DeviceOutcome::unreachable(
                    &device.name,
                    &device.host,
                    &device.device_type,
                    failure.cause,
                );
            }
        };

        let mut results = IndexMap::with_capacity(self.commands.len());
        for command in self.commands {
            let result = self.runner.run(&mut session, command).await;
            results.insert(command.clone(), result);
        }

        session.close().await;

        let outcome = DeviceOutcome {
            device: device.name.clone(),
            host: device.host.clone(),
            device_type: device.device_type.clone(),
            connection: Connection::Connected,
            results,
        };
        if outcome.fully_ok() {
            info!("{}: all {} commands succeeded", device.name, self.commands.len());
        } else {
            info!(
                "{}: {} of {} commands failed",
                device.name,
                outcome.failures().count(),
                self.commands.len()
            );
        }
        outcome
    }
}

//! Command runner: send one command, structure the answer.

use log::{debug, warn};

use super::outcome::{CommandResult, FailureCause};
use crate::parse::StructuredParser;
use crate::session::{SessionHandle, ShellSession};

/// Runs single commands against an open session.
pub struct CommandRunner<'a, P: ?Sized> {
    parser: &'a P,
}

impl<'a, P: StructuredParser + ?Sized> CommandRunner<'a, P> {
    pub fn new(parser: &'a P) -> Self {
        Self { parser }
    }

    /// Send `command` and parse the answer. Never fails: every problem is
    /// returned as [`CommandResult::Failure`] and logged with the device.
    pub async fn run<S: ShellSession>(
        &self,
        session: &mut SessionHandle<S>,
        command: &str,
    ) -> CommandResult {
        let device = session.device().to_string();
        debug!("{device}: sending '{command}'");

        let response = match session.session_mut().send(command).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{device}: '{command}' failed: {e}");
                return CommandResult::failure(command, FailureCause::Transport(e.to_string()));
            }
        };

        if let Some(marker) = &response.failure_message {
            warn!("{device}: '{command}' rejected by device ({marker})");
            return CommandResult::failure(
                command,
                FailureCause::Unparseable(format!("device reported '{marker}'")),
            );
        }

        match self.parser.parse(command, &response.result) {
            Ok(output) => {
                debug!(
                    "{device}: '{command}' parsed into {} records in {:?}",
                    output.len(),
                    response.elapsed
                );
                CommandResult::Success(output)
            }
            Err(e) => {
                warn!("{device}: cannot parse output of '{command}': {e}");
                CommandResult::failure(command, FailureCause::Unparseable(e.to_string()))
            }
        }
    }
}

//! Fleet orchestration: poll every device in inventory order.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{error, info};

use crate::config::Inventory;
use crate::context::RunContext;
use crate::extract::FactExtractor;
use crate::parse::StructuredParser;
use crate::poller::DevicePoller;
use crate::report::ReportSink;
use crate::schema::ReportSchema;
use crate::session::RemoteShell;

/// What a fleet run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetRunResult {
    /// Devices that were unreachable or had a failed command, in polling order.
    pub failed_devices: Vec<String>,
    pub report_path: PathBuf,
    pub run_log_path: PathBuf,
    pub polled: usize,
    pub elapsed: Duration,
}

impl FleetRunResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed_devices.is_empty()
    }
}

/// Polls an inventory sequentially and feeds the report.
pub struct Fleet<'a, R, P: ?Sized> {
    context: &'a RunContext,
    shell: &'a R,
    parser: &'a P,
    schema: &'a ReportSchema,
}

impl<'a, R, P> Fleet<'a, R, P>
where
    R: RemoteShell,
    P: StructuredParser + ?Sized,
{
    pub fn new(
        context: &'a RunContext,
        shell: &'a R,
        parser: &'a P,
        schema: &'a ReportSchema,
    ) -> Self {
        Self {
            context,
            shell,
            parser,
            schema,
        }
    }

    /// Poll every device once, appending its rows to `report` as soon as it
    /// is done. One device failing never stops the run; neither does a
    /// report write error, which is logged.
    pub async fn run<S: ReportSink + ?Sized>(
        &self,
        inventory: &Inventory,
        report: &mut S,
    ) -> FleetRunResult {
        let started = Instant::now();
        let poller = DevicePoller::new(self.shell, self.parser, &self.schema.commands);
        let extractor = FactExtractor::new(self.schema);
        let mut failed_devices = Vec::new();

        info!(
            "Polling {} devices from group '{}' with schema '{}'",
            inventory.len(),
            inventory.group(),
            self.schema.name
        );

        for (name, entry) in inventory.iter() {
            let device = entry.descriptor(
                name,
                &self.context.credentials,
                self.context.session_log_path(name),
            );

            let outcome = poller.poll(&device).await;
            if !outcome.fully_ok() {
                failed_devices.push(outcome.device.clone());
            }

            let rows = extractor.extract(&outcome);
            match report.append_device_rows(&rows) {
                Ok(()) => info!("{name}: output written to report"),
                Err(e) => error!("{name}: cannot write rows to report: {e}"),
            }
        }

        let result = FleetRunResult {
            failed_devices,
            report_path: self.context.paths.report.clone(),
            run_log_path: self.context.paths.run_log.clone(),
            polled: inventory.len(),
            elapsed: started.elapsed(),
        };
        info!(
            "Polled {} devices, {} failed",
            result.polled,
            result.failed_devices.len()
        );
        result
    }
}

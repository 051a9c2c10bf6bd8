//! End-of-run notification.
//!
//! The summary names every device that did not fully succeed. It is either
//! mailed, with the report and (on failure) the run log attached, or printed.
//! Notification problems are logged and printed but never fail the run.

mod smtp;

pub use smtp::SmtpMailer;

use std::future::Future;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::config::MailSettings;
use crate::error::NotifyError;
use crate::fleet::FleetRunResult;

pub const SUCCESS_TEXT: &str =
    "Connecting and retrieving information from all devices was successful.";
pub const FAILURE_HEADER: &str =
    "Couldn't connect or retrieve desired information from the following device(s):";
pub const FAILURE_FOOTER: &str = "Check logging for more details.";

/// Human-readable run summary. Failed devices are listed once each, in the
/// order given.
pub fn summary(failed_devices: &[String]) -> String {
    if failed_devices.is_empty() {
        return SUCCESS_TEXT.to_string();
    }
    let mut text = String::from(FAILURE_HEADER);
    text.push('\n');
    for device in failed_devices {
        text.push_str("  *");
        text.push_str(device);
        text.push('\n');
    }
    text.push_str(FAILURE_FOOTER);
    text
}

/// A file attached to the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Attachment {
    /// Read `path` into an attachment named after its file name.
    pub async fn read(path: &Path) -> Result<Self, NotifyError> {
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| NotifyError::Attachment {
                path: path.to_path_buf(),
                source,
            })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, content })
    }
}

/// A fully assembled notification mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

/// Capability to deliver a [`Mail`].
pub trait MailTransport: Send + Sync {
    fn send(&self, mail: &Mail) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// How the summary reaches the operator.
#[derive(Debug, Clone)]
pub enum Delivery<M> {
    Console,
    Mail {
        transport: M,
        sender: String,
        receiver: String,
    },
}

/// Result of [`Notifier::notify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Printed,
    Sent,
    Failed(String),
}

/// Sends the end-of-run summary.
#[derive(Debug, Clone)]
pub struct Notifier<M> {
    delivery: Delivery<M>,
    subject: String,
}

impl<M: MailTransport> Notifier<M> {
    /// Print the summary instead of mailing it.
    pub fn console(subject: impl Into<String>) -> Self {
        Self {
            delivery: Delivery::Console,
            subject: subject.into(),
        }
    }

    /// Mail the summary with `transport`, using the accounts in `settings`.
    pub fn mail(transport: M, settings: &MailSettings, subject: impl Into<String>) -> Self {
        Self {
            delivery: Delivery::Mail {
                transport,
                sender: settings.sender.clone(),
                receiver: settings.receiver.clone(),
            },
            subject: subject.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Deliver the summary of `result`. Never fails.
    pub async fn notify(&self, result: &FleetRunResult) -> Notification {
        let body = summary(&result.failed_devices);

        let Delivery::Mail {
            transport,
            sender,
            receiver,
        } = &self.delivery
        else {
            println!("{body}");
            return Notification::Printed;
        };

        let mut paths: Vec<&PathBuf> = vec![&result.report_path];
        if !result.all_succeeded() {
            paths.push(&result.run_log_path);
        }
        let mut attachments = Vec::with_capacity(paths.len());
        for path in paths {
            match Attachment::read(path).await {
                Ok(attachment) => attachments.push(attachment),
                Err(e) => {
                    error!("Skipping attachment: {e}");
                    eprintln!("Skipping attachment: {e}");
                }
            }
        }

        let mail = Mail {
            from: sender.clone(),
            to: receiver.clone(),
            subject: self.subject.clone(),
            body,
            attachments,
        };

        match transport.send(&mail).await {
            Ok(()) => {
                info!("Mail sent to {}", mail.to);
                Notification::Sent
            }
            Err(e) => {
                warn!("Failed to send mail to {}: {e}", mail.to);
                eprintln!("Failed to send mail to {}: {e}", mail.to);
                Notification::Failed(e.to_string())
            }
        }
    }
}

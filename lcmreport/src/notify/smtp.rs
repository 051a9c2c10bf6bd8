//! SMTP delivery via lettre (STARTTLS, authenticated submission).

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

use super::{Mail, MailTransport};
use crate::config::MailSettings;
use crate::error::NotifyError;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Mailer for the account described by [`MailSettings`].
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn new(settings: &MailSettings) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .map_err(|e| NotifyError::Smtp(e.to_string()))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.sender.clone(),
                settings.password.expose_secret().to_string(),
            ))
            .build();
        Ok(Self { transport })
    }
}

impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
        let message = build_message(mail)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
        address: address.to_string(),
        message: e.to_string(),
    })
}

fn content_type(filename: &str) -> Result<ContentType, NotifyError> {
    let mime = if filename.ends_with(".xlsx") {
        XLSX_CONTENT_TYPE
    } else if filename.ends_with(".log") {
        "text/plain"
    } else {
        "application/octet-stream"
    };
    ContentType::parse(mime).map_err(|e| NotifyError::Message(e.to_string()))
}

fn build_message(mail: &Mail) -> Result<Message, NotifyError> {
    let mut body = MultiPart::mixed().singlepart(SinglePart::plain(mail.body.clone()));
    for attachment in &mail.attachments {
        body = body.singlepart(
            MimeAttachment::new(attachment.filename.clone())
                .body(attachment.content.clone(), content_type(&attachment.filename)?),
        );
    }

    Message::builder()
        .from(mailbox(&mail.from)?)
        .to(mailbox(&mail.to)?)
        .subject(mail.subject.clone())
        .multipart(body)
        .map_err(|e| NotifyError::Message(e.to_string()))
}

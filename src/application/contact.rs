//! Quote-request intake: validate the form, keep the attachment, notify
//! the studio by email.

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::domain::contact::{QuoteRequest, QuoteRequestDraft};
use crate::infra::error::InfraError;
use crate::infra::uploads::UploadStorage;

/// Outbound notification message, provider-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub subject: String,
    pub text_body: String,
    pub reply_to: Option<String>,
}

/// Transactional email delivery seam. The HTTP client lives in infra;
/// tests substitute a recording stub.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), InfraError>;
}

/// Issued to the visitor on success, quoted in the notification mail so
/// follow-up threads can be matched to stored attachments.
#[derive(Debug, Clone)]
pub struct ContactReceipt {
    pub reference: String,
}

/// An uploaded file accompanying a quote request.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub data: Bytes,
}

pub struct ContactService {
    mailer: Arc<dyn Mailer>,
    uploads: Arc<UploadStorage>,
}

impl ContactService {
    pub fn new(mailer: Arc<dyn Mailer>, uploads: Arc<UploadStorage>) -> Self {
        Self { mailer, uploads }
    }

    /// Process one submission end to end.
    ///
    /// The attachment is persisted before the mail-out; if delivery
    /// fails, the stored file survives so the request can be recovered
    /// from logs by its reference.
    pub async fn submit(
        &self,
        draft: QuoteRequestDraft,
        attachment: Option<AttachmentUpload>,
    ) -> Result<ContactReceipt, AppError> {
        let request = draft.validate().map_err(AppError::from)?;
        let reference = Uuid::new_v4().to_string();

        let stored = match attachment {
            Some(upload) => {
                let stored = self
                    .uploads
                    .store(&upload.file_name, upload.data)
                    .await
                    .map_err(|err| AppError::validation(err.to_string()))?;
                info!(
                    target = "printworks::contact",
                    reference = %reference,
                    stored_path = %stored.stored_path,
                    size_bytes = stored.size_bytes,
                    "stored quote attachment"
                );
                Some(stored)
            }
            None => None,
        };

        let email = build_notification(&request, &reference, stored.as_ref().map(|s| &*s.stored_path));
        if let Err(err) = self.mailer.send(&email).await {
            warn!(
                target = "printworks::contact",
                reference = %reference,
                error = %err,
                "quote notification mail failed; attachment retained"
            );
            counter!("printworks_contact_mail_failed_total").increment(1);
            return Err(AppError::from(err));
        }

        counter!("printworks_contact_submitted_total").increment(1);
        info!(
            target = "printworks::contact",
            reference = %reference,
            "quote request submitted"
        );
        Ok(ContactReceipt { reference })
    }
}

fn build_notification(
    request: &QuoteRequest,
    reference: &str,
    stored_path: Option<&str>,
) -> OutboundEmail {
    let subject = format!("Quote request from {}", request.name);

    let mut body = String::new();
    let _ = writeln!(body, "Reference: {reference}");
    let _ = writeln!(body, "Name: {}", request.name);
    let _ = writeln!(body, "Email: {}", request.email);
    if let Some(phone) = &request.phone {
        let _ = writeln!(body, "Phone: {phone}");
    }
    if let Some(service) = &request.service {
        let _ = writeln!(body, "Service: {service}");
    }
    if let Some(path) = stored_path {
        let _ = writeln!(body, "Attachment: {path}");
    }
    let _ = writeln!(body);
    let _ = writeln!(body, "{}", request.message);

    OutboundEmail {
        subject,
        text_body: body,
        reply_to: Some(request.email.clone()),
    }
}

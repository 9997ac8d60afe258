//! `POST /email/send`.
//!
//! Uploads are streamed to temp files as they arrive and checked against the
//! upload policy before a single byte goes to Gmail. Every temp file written
//! by the request is owned by an [`AttachmentCleanup`] guard from the moment
//! it is created, so a rejected, failed or abandoned request leaves nothing
//! behind in the upload directory.

use crate::error::{ApiError, MessageBody};
use crate::state::AppState;
use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use gmailsend_core::{AttachmentCleanup, AttachmentFile, OutgoingEmail};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const FIELD_TO: &str = "to";
const FIELD_SUBJECT: &str = "subject";
const FIELD_MESSAGE: &str = "message";
const FIELD_ATTACHMENTS: &str = "attachments";

#[derive(Debug, Default)]
struct SendForm {
    to: String,
    subject: String,
    message: String,
}

/// `POST /email/send`
pub async fn send_email(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MessageBody>, ApiError> {
    state.uploads.ensure().await.map_err(ApiError::internal)?;

    let mut form = SendForm::default();
    let mut uploads = AttachmentCleanup::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_TO => form.to = field.text().await?,
            FIELD_SUBJECT => form.subject = field.text().await?,
            FIELD_MESSAGE => form.message = field.text().await?,
            FIELD_ATTACHMENTS => receive_upload(&state, field, &mut uploads).await?,
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let to = form.to.trim();
    if to.is_empty() {
        return Err(ApiError::BadRequest("Recipient address is required".to_string()));
    }

    info!(%to, subject = %form.subject, "Sending email");
    info!(
        attachments = %uploads
            .files()
            .iter()
            .map(|f| f.original_name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        "Attachments"
    );

    let email = OutgoingEmail {
        to: to.to_string(),
        subject: form.subject,
        body_text: form.message,
        attachments: uploads.into_files(),
    };
    let receipt = state.sender.send(email).await?;
    debug!(message_id = %receipt.message_id, "Gmail accepted the message");

    Ok(Json(MessageBody {
        message: "Email sent successfully".to_string(),
    }))
}

/// Streams one `attachments` part to a fresh temp file and hands it to the
/// request's cleanup guard.
async fn receive_upload(
    state: &AppState,
    mut field: Field<'_>,
    uploads: &mut AttachmentCleanup,
) -> Result<(), ApiError> {
    let policy = &state.policy;
    policy.check_count(uploads.len() + 1)?;

    let original_name = field.file_name().unwrap_or("attachment").to_string();
    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    policy.check_type(&mime_type)?;

    let path = state.uploads.unique_path(&original_name);
    let pending = AttachmentCleanup::new(vec![AttachmentFile {
        original_name: original_name.clone(),
        mime_type,
        path: path.clone(),
        size_bytes: 0,
    }]);

    let mut written = 0usize;
    let mut out = create(&path).await?;
    while let Some(chunk) = field.chunk().await? {
        written += chunk.len();
        policy.check_size(&original_name, written)?;
        out.write_all(&chunk).await.map_err(ApiError::internal)?;
    }
    out.flush().await.map_err(ApiError::internal)?;
    drop(out);

    debug!(name = %original_name, bytes = written, path = %path.display(), "Stored upload");
    for mut file in pending.into_files() {
        file.size_bytes = written as u64;
        uploads.push(file);
    }
    Ok(())
}

async fn create(path: &Path) -> Result<tokio::fs::File, ApiError> {
    tokio::fs::File::create(path)
        .await
        .map_err(|e| ApiError::internal(format!("cannot create {}: {e}", path.display())))
}

// src/confirmation/types.rs
//
// Confirmation request/response shapes and errors.
//
// CRITICAL RULES:
// - A request is owned by the caller awaiting it
// - The correlation id is assigned by the channel, never by the caller
// - Wire shapes are camelCase

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{RecognizeMediaFilePlan, RecognizedFile, RenameTask};

/// Event asking a consumer to approve a rename plan
pub const RENAME_FILES_CONFIRMATION_EVENT: &str = "askForRenameFilesConfirmation";

/// Event asking a consumer to approve a recognition plan
pub const RECOGNIZE_MEDIA_FILE_CONFIRMATION_EVENT: &str = "askForRecognizeMediaFileConfirmation";

/// Wait bound used when the caller does not pass one
pub const DEFAULT_CONFIRMATION_TIMEOUT_MS: u64 = 30_000;

/// A question addressed to one consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub event: String,
    pub data: serde_json::Value,
    pub client_id: String,
}

#[derive(Serialize)]
struct RenameFilesData<'a> {
    files: &'a [RenameTask],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeMediaFileData<'a> {
    task: &'static str,
    media_folder_path: &'a str,
    files: &'a [RecognizedFile],
}

impl ConfirmationRequest {
    pub fn new(
        event: impl Into<String>,
        data: serde_json::Value,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            event: event.into(),
            data,
            client_id: client_id.into(),
        }
    }

    /// `{event: "askForRenameFilesConfirmation", data: {files}, clientId}`
    pub fn rename_files(
        tasks: &[RenameTask],
        client_id: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_value(RenameFilesData { files: tasks })?;
        Ok(Self::new(RENAME_FILES_CONFIRMATION_EVENT, data, client_id))
    }

    pub fn recognize_media_file(
        plan: &RecognizeMediaFilePlan,
        client_id: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_value(RecognizeMediaFileData {
            task: RecognizeMediaFilePlan::TASK,
            media_folder_path: &plan.media_folder_path,
            files: &plan.files,
        })?;
        Ok(Self::new(
            RECOGNIZE_MEDIA_FILE_CONFIRMATION_EVENT,
            data,
            client_id,
        ))
    }

    pub(crate) fn into_outgoing(self, correlation_id: Uuid) -> OutgoingConfirmation {
        OutgoingConfirmation {
            event: self.event,
            data: self.data,
            client_id: self.client_id,
            correlation_id,
        }
    }
}

/// The envelope handed to the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingConfirmation {
    pub event: String,
    pub data: serde_json::Value,
    pub client_id: String,
    pub correlation_id: Uuid,
}

/// The yes/no answer shape every plan confirmation expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    pub confirmed: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("No response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Confirmation wait was cancelled")]
    Aborted,

    #[error("Transport failed: {0}")]
    Transport(String),

    #[error("Confirmation channel closed")]
    ChannelClosed,

    #[error("Invalid confirmation response: {0}")]
    InvalidResponse(String),
}

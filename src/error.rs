//! Error taxonomy for the AgriFund client.

use thiserror::Error;

const GENERIC_SUBMIT_ERROR: &str = "Something went wrong while saving. Please try again.";
const UPLOAD_FAILED_ERROR: &str = "Uploading your images failed. Nothing was saved.";

/// Failures while talking to the AgriFund backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a decodable response: connect failure,
    /// timeout, or a body that did not match the expected shape.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status code.
    #[error("server returned status {status}")]
    Status {
        status: u16,
        /// Human-readable message extracted from the error body, if any.
        message: Option<String>,
    },
}

impl ApiError {
    /// The message the server attached to its rejection, when one was found.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            ApiError::Network(_) => None,
        }
    }
}

/// Failures of the wizard submission pipeline.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Submission was requested while the wizard was not on the final step.
    #[error("submission attempted on step {step_index}, not the confirmation step")]
    NotAtConfirmation { step_index: usize },

    /// A gated step no longer passes its completeness check.
    #[error("step '{step_key}' is incomplete")]
    IncompleteStep {
        step_index: usize,
        step_key: &'static str,
    },

    /// The assembled payload failed wire-level validation.
    #[error("payload failed validation: {0}")]
    InvalidPayload(#[from] validator::ValidationErrors),

    /// Staging the images on the server failed; no record was written.
    #[error("image upload failed: {0}")]
    Upload(#[source] ApiError),

    /// The create or update call itself failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SubmitError {
    /// Message shown to the user when this failure surfaces as a notification.
    /// Server-supplied messages win over the generic fallbacks.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Upload(api) => api
                .server_message()
                .unwrap_or(UPLOAD_FAILED_ERROR)
                .to_string(),
            SubmitError::Api(api) => api
                .server_message()
                .unwrap_or(GENERIC_SUBMIT_ERROR)
                .to_string(),
            _ => GENERIC_SUBMIT_ERROR.to_string(),
        }
    }
}

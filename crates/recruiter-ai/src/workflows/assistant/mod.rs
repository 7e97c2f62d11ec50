//! Generative-AI collaborator: a content-generation client with retries, and
//! the recruiter-facing analyses built on top of it.

pub mod analysis;
pub mod client;
pub mod prompts;
pub mod retry;

pub use analysis::{InterviewAnalysis, RecruiterAssistant};
pub use client::{
    ChatRole, ChatTurn, GeminiClient, GenerationRequest, GenerativeModel, UnconfiguredModel,
};
pub use retry::RetryPolicy;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant is not configured: set AI_API_KEY")]
    NotConfigured,
    #[error("request to the generative service failed: {0}")]
    Transport(String),
    #[error("generative service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generative service returned no content")]
    EmptyResponse,
    #[error("generative reply is not the expected JSON: {0}")]
    MalformedResponse(String),
    #[error("resume has no extracted text to analyze")]
    MissingDocumentText,
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<AssistantError>,
    },
}

impl AssistantError {
    /// Transport failures, throttling and server errors are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Text suitable for showing to the recruiter.
    /// Never includes transport details or response bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotConfigured => "The AI assistant is not configured.".to_string(),
            Self::MalformedResponse(_) | Self::EmptyResponse => {
                "Could not analyze the document. Please try again.".to_string()
            }
            Self::MissingDocumentText => {
                "This resume has no readable text to analyze.".to_string()
            }
            Self::Exhausted { last, .. } => last.user_message(),
            Self::Transport(_) => {
                "The AI service could not be reached. Please try again later.".to_string()
            }
            Self::Status { status: 429, .. } => {
                "The AI service is busy right now. Please try again shortly.".to_string()
            }
            Self::Status { status, .. } => {
                format!("The AI service is unavailable right now (status {status}).")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_leave_out_raw_service_details() {
        let status = AssistantError::Status {
            status: 503,
            body: "{\"error\":\"backend overloaded at 10.0.0.7\"}".to_string(),
        };
        assert_eq!(
            status.user_message(),
            "The AI service is unavailable right now (status 503)."
        );

        let exhausted = AssistantError::Exhausted {
            attempts: 3,
            last: Box::new(AssistantError::Transport("connection refused".to_string())),
        };
        assert!(!exhausted.user_message().contains("connection refused"));
    }
}

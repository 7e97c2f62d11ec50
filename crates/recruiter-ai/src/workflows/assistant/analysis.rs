use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::client::{ChatTurn, GenerationRequest, GenerativeModel};
use super::prompts;
use super::AssistantError;
use crate::workflows::vacancy::domain::{CandidateResume, ResumeAnalysis, Vacancy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewAnalysis {
    pub summary: String,
    pub overall_score: u8,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

/// Recruiter-facing analyses on top of any [`GenerativeModel`].
#[derive(Debug)]
pub struct RecruiterAssistant<M> {
    model: M,
}

impl<M> RecruiterAssistant<M>
where
    M: GenerativeModel,
{
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn analyze_resume(
        &self,
        vacancy: &Vacancy,
        resume: &CandidateResume,
    ) -> Result<ResumeAnalysis, AssistantError> {
        let text = resume
            .document
            .text()
            .ok_or(AssistantError::MissingDocumentText)?;

        let request = GenerationRequest {
            system: Some(prompts::RESUME_SYSTEM.to_string()),
            turns: vec![ChatTurn::user(prompts::resume_prompt(
                vacancy,
                &resume.file_name,
                text,
            ))],
            response_schema: Some(prompts::resume_schema()),
        };

        let reply = self.model.generate(&request).await?;
        let mut analysis: ResumeAnalysis = parse_json_reply(&reply)?;
        analysis.match_score = analysis.match_score.min(100);
        info!(
            vacancy_id = %vacancy.id,
            resume_id = %resume.id,
            score = analysis.match_score,
            "resume analyzed"
        );
        Ok(analysis)
    }

    pub async fn analyze_interview(
        &self,
        vacancy: Option<&Vacancy>,
        transcript: &str,
    ) -> Result<InterviewAnalysis, AssistantError> {
        let request = GenerationRequest {
            system: Some(prompts::INTERVIEW_SYSTEM.to_string()),
            turns: vec![ChatTurn::user(prompts::interview_prompt(vacancy, transcript))],
            response_schema: Some(prompts::interview_schema()),
        };

        let reply = self.model.generate(&request).await?;
        let mut analysis: InterviewAnalysis = parse_json_reply(&reply)?;
        analysis.overall_score = analysis.overall_score.min(100);
        Ok(analysis)
    }

    pub async fn chat(&self, turns: Vec<ChatTurn>) -> Result<String, AssistantError> {
        let request = GenerationRequest {
            system: Some(prompts::CHAT_SYSTEM.to_string()),
            turns,
            response_schema: None,
        };
        let reply = self.model.generate(&request).await?;
        Ok(reply.trim().to_string())
    }
}

/// Parse a JSON reply, tolerating a Markdown code fence around it.
pub(crate) fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, AssistantError> {
    serde_json::from_str(strip_code_fence(reply))
        .map_err(|err| AssistantError::MalformedResponse(err.to_string()))
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag line, e.g. ```json
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::workflows::vacancy::domain::Vacancy;

pub(crate) const RESUME_SYSTEM: &str = "You are an experienced technical recruiter. \
Compare the candidate resume with the vacancy and answer strictly in the requested JSON format. \
Scores range from 0 (no fit) to 100 (perfect fit).";

pub(crate) const INTERVIEW_SYSTEM: &str = "You are a hiring manager reviewing an interview transcript. \
Judge the candidate's answers against the vacancy when one is given, and answer strictly in the requested JSON format.";

pub(crate) const CHAT_SYSTEM: &str = "You are a concise assistant for a recruiter. \
Help with sourcing, outreach messages, interview questions and pipeline decisions. \
Do not invent facts about candidates.";

pub(crate) fn resume_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "match_score": { "type": "INTEGER" },
            "summary": { "type": "STRING" },
            "strengths": { "type": "ARRAY", "items": { "type": "STRING" } },
            "gaps": { "type": "ARRAY", "items": { "type": "STRING" } },
            "recommendation": { "type": "STRING" }
        },
        "required": ["match_score", "summary", "strengths", "gaps"]
    })
}

pub(crate) fn interview_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "overall_score": { "type": "INTEGER" },
            "strengths": { "type": "ARRAY", "items": { "type": "STRING" } },
            "concerns": { "type": "ARRAY", "items": { "type": "STRING" } },
            "follow_up_questions": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["summary", "overall_score", "strengths", "concerns", "follow_up_questions"]
    })
}

/// Vacancy block shared by the resume and interview prompts.
pub(crate) fn describe_vacancy(vacancy: &Vacancy) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "VACANCY: {}", vacancy.title);
    let _ = writeln!(
        out,
        "Priority: {} | Stage: {} | Starts: {}",
        vacancy.priority.label(),
        vacancy.stage.label(),
        vacancy.start_date
    );
    if let Some(brief) = &vacancy.brief {
        match (brief.text(), brief.url.as_deref()) {
            (Some(text), _) => {
                let _ = writeln!(out, "Brief:\n{text}");
            }
            (None, Some(url)) => {
                let _ = writeln!(out, "Brief document: {url}");
            }
            (None, None) => {}
        }
    }
    out
}

pub(crate) fn resume_prompt(vacancy: &Vacancy, file_name: &str, resume_text: &str) -> String {
    format!(
        "{}\nRESUME ({file_name}):\n{resume_text}\n\n\
         TASK: score how well this candidate fits the vacancy, summarize the fit in 2-4 sentences, \
         list concrete strengths and gaps, and give a one-line recommendation.",
        describe_vacancy(vacancy)
    )
}

pub(crate) fn interview_prompt(vacancy: Option<&Vacancy>, transcript: &str) -> String {
    let context = vacancy.map(describe_vacancy).unwrap_or_default();
    format!(
        "{context}\nINTERVIEW TRANSCRIPT:\n{transcript}\n\n\
         TASK: summarize the interview, score the candidate overall, list strengths and concerns, \
         and propose follow-up questions for the next round."
    )
}

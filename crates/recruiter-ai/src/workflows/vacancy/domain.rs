use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque, time-based identifier assigned when a vacancy is first added.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyId(pub String);

/// Weak reference to a recruiter. The store never resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecruiterId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeId(pub String);

macro_rules! display_id {
    ($($name:ident),+) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.pad(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }
        )+
    };
}

display_id!(VacancyId, RecruiterId, ResumeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VacancyPriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl VacancyPriority {
    pub const fn ordered() -> [Self; 4] {
        [Self::Urgent, Self::High, Self::Medium, Self::Low]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Urgent => "Urgent",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Pipeline position. Any stage may follow any other; there is no terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VacancyStage {
    New,
    Sourcing,
    Interview,
    Offer,
    Archive,
}

impl VacancyStage {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::New,
            Self::Sourcing,
            Self::Interview,
            Self::Offer,
            Self::Archive,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Sourcing => "Sourcing",
            Self::Interview => "Interview",
            Self::Offer => "Offer",
            Self::Archive => "Archive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for VacancyPriority {
    type Err = ParseLabelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|priority| priority.label().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| ParseLabelError {
                kind: "priority",
                value: raw.to_string(),
            })
    }
}

impl FromStr for VacancyStage {
    type Err = ParseLabelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| ParseLabelError {
                kind: "stage",
                value: raw.to_string(),
            })
    }
}

/// A document reference: a link, extracted text, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DocumentRef {
    /// Extracted text, if any non-blank text is attached.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Structured verdict produced by the assistant for one resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    pub match_score: u8,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisState {
    #[default]
    NotStarted,
    Loading,
    Done {
        result: ResumeAnalysis,
    },
    Failed {
        error: String,
    },
}

impl AnalysisState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Loading => "loading",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResume {
    pub id: ResumeId,
    pub file_name: String,
    pub document: DocumentRef,
    #[serde(default)]
    pub analysis: AnalysisState,
    /// Bumped whenever an analysis starts or the document is replaced.
    #[serde(default)]
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub title: String,
    pub priority: VacancyPriority,
    pub stage: VacancyStage,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_recruiter: Option<RecruiterId>,
    #[serde(default)]
    pub brief: Option<DocumentRef>,
    #[serde(default)]
    pub resumes: Vec<CandidateResume>,
}

impl Vacancy {
    pub fn resume(&self, resume_id: &ResumeId) -> Option<&CandidateResume> {
        self.resumes.iter().find(|resume| &resume.id == resume_id)
    }

    pub(crate) fn resume_mut(&mut self, resume_id: &ResumeId) -> Option<&mut CandidateResume> {
        self.resumes.iter_mut().find(|resume| &resume.id == resume_id)
    }
}

/// Add-or-update payload. Absent fields keep the stored value on merge; nullable
/// fields use a nested `Option` so an explicit `null` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyDraft {
    #[serde(default)]
    pub id: Option<VacancyId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub priority: Option<VacancyPriority>,
    #[serde(default)]
    pub stage: Option<VacancyStage>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_recruiter: Option<Option<RecruiterId>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub brief: Option<Option<DocumentRef>>,
}

impl VacancyDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn for_id(id: VacancyId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: VacancyPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_stage(mut self, stage: VacancyStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub(crate) fn merge_into(self, vacancy: &mut Vacancy) {
        if let Some(title) = self.title {
            vacancy.title = title;
        }
        if let Some(priority) = self.priority {
            vacancy.priority = priority;
        }
        if let Some(stage) = self.stage {
            vacancy.stage = stage;
        }
        if let Some(start_date) = self.start_date {
            vacancy.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            vacancy.end_date = end_date;
        }
        if let Some(recruiter) = self.assigned_recruiter {
            vacancy.assigned_recruiter = recruiter;
        }
        if let Some(brief) = self.brief {
            vacancy.brief = brief;
        }
    }

    pub(crate) fn into_vacancy(self, id: VacancyId, today: NaiveDate) -> Vacancy {
        Vacancy {
            id,
            title: self.title.unwrap_or_default(),
            priority: self.priority.unwrap_or(VacancyPriority::Medium),
            stage: self.stage.unwrap_or(VacancyStage::New),
            start_date: self.start_date.unwrap_or(today),
            end_date: self.end_date.flatten(),
            assigned_recruiter: self.assigned_recruiter.flatten(),
            brief: self.brief.flatten(),
            resumes: Vec::new(),
        }
    }
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

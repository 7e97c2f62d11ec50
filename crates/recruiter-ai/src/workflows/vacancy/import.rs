use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::domain::{RecruiterId, Vacancy, VacancyDraft, VacancyPriority, VacancyStage};
use super::store::VacancyStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read vacancy file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid vacancy CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
}

/// Reads vacancy spreadsheets exported with the columns
/// `Title, Priority, Stage, Start Date, End Date, Recruiter`.
#[derive(Debug, Default, Clone, Copy)]
pub struct VacancyCsvImporter;

impl VacancyCsvImporter {
    pub fn parse<R: Read>(&self, reader: R) -> Result<Vec<VacancyDraft>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if !headers.iter().any(|header| header == "Title") {
            return Err(ImportError::MissingColumn("Title"));
        }

        let mut drafts = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |position| position.line());
            let row: VacancyRow = record.deserialize(Some(&headers))?;
            let draft = row
                .into_draft()
                .map_err(|reason| ImportError::InvalidRow { line, reason })?;
            drafts.push(draft);
        }

        Ok(drafts)
    }

    /// Parse everything first, then upsert each row; a bad row leaves the store untouched.
    pub fn import_into<R: Read>(
        &self,
        reader: R,
        store: &mut VacancyStore,
    ) -> Result<Vec<Vacancy>, ImportError> {
        let drafts = self.parse(reader)?;
        let imported: Vec<Vacancy> = drafts
            .into_iter()
            .filter_map(|draft| store.upsert(draft))
            .collect();
        info!(imported = imported.len(), total = store.vacancies().len(), "vacancies imported");
        Ok(imported)
    }

    pub fn import_path(
        &self,
        path: impl AsRef<Path>,
        store: &mut VacancyStore,
    ) -> Result<Vec<Vacancy>, ImportError> {
        let file = File::open(path)?;
        self.import_into(file, store)
    }
}

#[derive(Debug, Deserialize)]
struct VacancyRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Priority", default, deserialize_with = "empty_string_as_none")]
    priority: Option<String>,
    #[serde(rename = "Stage", default, deserialize_with = "empty_string_as_none")]
    stage: Option<String>,
    #[serde(rename = "Start Date", default, deserialize_with = "empty_string_as_none")]
    start_date: Option<String>,
    #[serde(rename = "End Date", default, deserialize_with = "empty_string_as_none")]
    end_date: Option<String>,
    #[serde(rename = "Recruiter", default, deserialize_with = "empty_string_as_none")]
    recruiter: Option<String>,
}

impl VacancyRow {
    fn into_draft(self) -> Result<VacancyDraft, String> {
        if self.title.is_empty() {
            return Err("title is empty".to_string());
        }

        let priority = self
            .priority
            .map(|raw| raw.parse::<VacancyPriority>())
            .transpose()
            .map_err(|err| err.to_string())?;
        let stage = self
            .stage
            .map(|raw| raw.parse::<VacancyStage>())
            .transpose()
            .map_err(|err| err.to_string())?;
        let start_date = self.start_date.as_deref().map(parse_date).transpose()?;
        let end_date = self.end_date.as_deref().map(parse_date).transpose()?;

        Ok(VacancyDraft {
            id: None,
            title: Some(self.title),
            priority,
            stage,
            start_date,
            end_date: end_date.map(Some),
            assigned_recruiter: self.recruiter.map(|id| Some(RecruiterId(id))),
            brief: None,
        })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| format!("'{raw}' is not a YYYY-MM-DD date"))
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

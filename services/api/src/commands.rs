use crate::infra::{parse_date, parse_priority, parse_stage};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use recruiter_ai::config::AppConfig;
use recruiter_ai::error::AppError;
use recruiter_ai::workflows::persistence::{
    FileKeyValueStore, SnapshotWriter, WorkspaceRepository,
};
use recruiter_ai::workflows::vacancy::{
    RecruiterId, SystemClock, Vacancy, VacancyAction, VacancyCsvImporter, VacancyDraft, VacancyId,
    VacancyPriority, VacancyStage, VacancyStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Subcommand, Debug)]
pub(crate) enum VacancyCommand {
    /// List vacancies, optionally filtered by stage or recruiter
    List(ListArgs),
    /// Add a new vacancy
    Add(AddArgs),
    /// Edit the title or dates of an existing vacancy
    Update(UpdateArgs),
    /// Move a vacancy to another pipeline stage
    Stage {
        id: String,
        #[arg(value_parser = parse_stage)]
        stage: VacancyStage,
    },
    /// Change the priority of a vacancy
    Priority {
        id: String,
        #[arg(value_parser = parse_priority)]
        priority: VacancyPriority,
    },
    /// Assign a recruiter; omit the recruiter to unassign
    Assign { id: String, recruiter: Option<String> },
    /// Remove a vacancy
    Delete { id: String },
    /// Upsert every row of a CSV export (Title, Priority, Stage, Start Date, End Date, Recruiter)
    Import { path: PathBuf },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ListArgs {
    #[arg(long, value_parser = parse_stage)]
    pub(crate) stage: Option<VacancyStage>,
    #[arg(long)]
    pub(crate) recruiter: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct AddArgs {
    pub(crate) title: String,
    #[arg(long, value_parser = parse_priority)]
    pub(crate) priority: Option<VacancyPriority>,
    #[arg(long, value_parser = parse_stage)]
    pub(crate) stage: Option<VacancyStage>,
    /// Start date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) end_date: Option<NaiveDate>,
    #[arg(long)]
    pub(crate) recruiter: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct UpdateArgs {
    pub(crate) id: String,
    #[arg(long)]
    pub(crate) title: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date, conflicts_with = "clear_end_date")]
    pub(crate) end_date: Option<NaiveDate>,
    /// Remove the end date
    #[arg(long)]
    pub(crate) clear_end_date: bool,
}

impl AddArgs {
    fn into_draft(self) -> VacancyDraft {
        VacancyDraft {
            title: Some(self.title),
            priority: self.priority,
            stage: self.stage,
            start_date: self.start_date,
            end_date: self.end_date.map(Some),
            assigned_recruiter: self.recruiter.map(|id| Some(RecruiterId(id))),
            ..VacancyDraft::default()
        }
    }
}

impl UpdateArgs {
    fn into_draft(self) -> VacancyDraft {
        let end_date = if self.clear_end_date {
            Some(None)
        } else {
            self.end_date.map(Some)
        };
        VacancyDraft {
            id: Some(VacancyId(self.id)),
            title: self.title,
            start_date: self.start_date,
            end_date,
            ..VacancyDraft::default()
        }
    }
}

/// Open the stored board with a writer that saves after every change.
fn open_board(data_dir: &Path) -> Result<VacancyStore, AppError> {
    let kv = Arc::new(FileKeyValueStore::open(data_dir)?);
    let repository = WorkspaceRepository::new(kv);
    let vacancies = repository.load_vacancies()?;

    let mut store = VacancyStore::new(SystemClock).with_vacancies(vacancies);
    store.subscribe(SnapshotWriter::new(repository));
    Ok(store)
}

pub(crate) fn run_vacancy_command(
    command: VacancyCommand,
    data_dir: Option<PathBuf>,
) -> Result<(), AppError> {
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => AppConfig::load()?.storage.data_dir,
    };
    let mut store = open_board(&data_dir)?;
    execute(command, &mut store)
}

fn execute(command: VacancyCommand, store: &mut VacancyStore) -> Result<(), AppError> {
    match command {
        VacancyCommand::List(args) => {
            let recruiter = args.recruiter.map(RecruiterId);
            let listed: Vec<&Vacancy> = store
                .vacancies()
                .iter()
                .filter(|vacancy| args.stage.map_or(true, |stage| vacancy.stage == stage))
                .filter(|vacancy| {
                    recruiter.is_none() || vacancy.assigned_recruiter.as_ref() == recruiter.as_ref()
                })
                .collect();

            if listed.is_empty() {
                println!("No vacancies.");
            }
            for vacancy in listed {
                println!("{}", format_row(vacancy));
            }

            let counts = store
                .stage_counts()
                .into_iter()
                .map(|(stage, count)| format!("{} {count}", stage.label()))
                .collect::<Vec<_>>()
                .join(" | ");
            println!("\nPipeline: {counts}");
        }
        VacancyCommand::Add(args) => {
            if let Some(vacancy) = store.upsert(args.into_draft()) {
                println!("Added {}", format_row(&vacancy));
            }
        }
        VacancyCommand::Update(args) => {
            let id = VacancyId(args.id.clone());
            if store.get(&id).is_none() {
                println!("No vacancy with id {id}.");
                return Ok(());
            }
            if let Some(vacancy) = store.upsert(args.into_draft()) {
                println!("Updated {}", format_row(&vacancy));
            }
        }
        VacancyCommand::Stage { id, stage } => {
            let id = VacancyId(id);
            store.dispatch(VacancyAction::ChangeStage {
                id: id.clone(),
                stage,
            });
            report_change(store, &id);
        }
        VacancyCommand::Priority { id, priority } => {
            let id = VacancyId(id);
            store.dispatch(VacancyAction::ChangePriority {
                id: id.clone(),
                priority,
            });
            report_change(store, &id);
        }
        VacancyCommand::Assign { id, recruiter } => {
            let id = VacancyId(id);
            store.dispatch(VacancyAction::AssignRecruiter {
                id: id.clone(),
                recruiter: recruiter.map(RecruiterId),
            });
            report_change(store, &id);
        }
        VacancyCommand::Delete { id } => {
            let id = VacancyId(id);
            let before = store.vacancies().len();
            store.dispatch(VacancyAction::Delete(id.clone()));
            if store.vacancies().len() < before {
                println!("Deleted {id}.");
            } else {
                println!("No vacancy with id {id}.");
            }
        }
        VacancyCommand::Import { path } => {
            let imported = VacancyCsvImporter.import_path(&path, store)?;
            println!("Imported {} vacancies from {}", imported.len(), path.display());
            for vacancy in &imported {
                println!("  {}", format_row(vacancy));
            }
        }
    }
    Ok(())
}

fn report_change(store: &VacancyStore, id: &VacancyId) {
    match store.get(id) {
        Some(vacancy) => println!("Updated {}", format_row(vacancy)),
        None => println!("No vacancy with id {id}."),
    }
}

fn format_row(vacancy: &Vacancy) -> String {
    let recruiter = vacancy
        .assigned_recruiter
        .as_ref()
        .map_or_else(|| "unassigned".to_string(), ToString::to_string);
    let window = match vacancy.end_date {
        Some(end) => format!("{} to {end}", vacancy.start_date),
        None => vacancy.start_date.to_string(),
    };
    format!(
        "{:<24} {:<9} {:<6} {:<23} {} [{recruiter}] ({} resumes)",
        vacancy.id,
        vacancy.stage.label(),
        vacancy.priority.label(),
        window,
        vacancy.title,
        vacancy.resumes.len()
    )
}

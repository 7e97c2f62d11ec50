use crate::commands::{run_vacancy_command, VacancyCommand};
use crate::server;
use clap::{Args, Parser, Subcommand};
use recruiter_ai::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Recruiter AI",
    about = "Run the recruiter vacancy board service or manage vacancies from the command line",
    version
)]
struct Cli {
    /// Override the configured data directory (RECRUITER_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect and edit the stored vacancy board
    Vacancy {
        #[command(subcommand)]
        command: VacancyCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args, cli.data_dir).await,
        Command::Vacancy { command } => run_vacancy_command(command, cli.data_dir),
    }
}

use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_vacancy_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use recruiter_ai::config::AppConfig;
use recruiter_ai::error::AppError;
use recruiter_ai::telemetry;
use recruiter_ai::workflows::assistant::{
    GeminiClient, GenerativeModel, RecruiterAssistant, UnconfiguredModel,
};
use recruiter_ai::workflows::persistence::{
    spawn_debounced_writer, FileKeyValueStore, RecruiterPreferences, WorkspaceRepository,
};
use recruiter_ai::workflows::vacancy::{VacancyService, VacancyStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Everything loaded from disk before the listener starts.
struct Workspace {
    store: VacancyStore,
    repository: WorkspaceRepository,
    preferences: RecruiterPreferences,
    writer_task: JoinHandle<()>,
}

pub(crate) async fn run(mut args: ServeArgs, data_dir: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }

    telemetry::init(&config.telemetry)?;

    let workspace = open_workspace(&config)?;

    match config.assistant.api_key.clone() {
        Some(api_key) => {
            let client = GeminiClient::new(&config.assistant, api_key)?;
            serve(config, workspace, client).await
        }
        None => {
            warn!("AI_API_KEY is not set; assistant features will report as unavailable");
            serve(config, workspace, UnconfiguredModel).await
        }
    }
}

fn open_workspace(config: &AppConfig) -> Result<Workspace, AppError> {
    let kv = Arc::new(FileKeyValueStore::open(&config.storage.data_dir)?);
    let repository = WorkspaceRepository::new(kv);
    let vacancies = repository.load_vacancies()?;
    let preferences = repository.load_preferences()?;
    info!(
        vacancies = vacancies.len(),
        data_dir = %config.storage.data_dir.display(),
        "workspace loaded"
    );

    let (writer, writer_task) = spawn_debounced_writer(
        repository.clone(),
        config.storage.debounce(),
        config.storage.max_delay(),
    );
    let mut store = VacancyStore::default().with_vacancies(vacancies);
    store.subscribe(writer);

    Ok(Workspace {
        store,
        repository,
        preferences,
        writer_task,
    })
}

async fn serve<M>(config: AppConfig, workspace: Workspace, model: M) -> Result<(), AppError>
where
    M: GenerativeModel + 'static,
{
    let Workspace {
        store,
        repository,
        preferences,
        writer_task,
    } = workspace;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(VacancyService::new(
        store,
        RecruiterAssistant::new(model),
        repository,
        preferences,
    ));

    let app = with_vacancy_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, model = %config.assistant.model, "recruiter service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last store handle; once it is gone the writer flushes and exits.
    if let Err(err) = writer_task.await {
        error!(error = %err, "snapshot writer did not shut down cleanly");
    }
    info!("recruiter service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested");
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::Duration;
    use tokio::signal::unix::{signal, SignalKind};

    #[tokio::test]
    async fn sigterm_triggers_graceful_shutdown() {
        // Registering first replaces the default SIGTERM action for this process.
        let _guard = signal(SignalKind::terminate()).expect("register SIGTERM");
        let shutdown = tokio::spawn(shutdown_signal());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let status = Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .expect("kill runs");
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(2), shutdown)
            .await
            .expect("shutdown future resolves")
            .expect("task completes");
    }
}

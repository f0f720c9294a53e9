use crate::cli::ServeArgs;
use crate::demo::seed_demo;
use crate::infra::{
    AppState, Clock, InMemoryDirectory, InMemoryEventLog, InMemoryPlanStore,
    InMemoryResponseStore, InMemorySessionStore, SystemClock,
};
use crate::routes::{build_router, DashboardState};
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use psyrisk::config::{AlertSettings, AppConfig, DashboardConfig};
use psyrisk::error::AppError;
use psyrisk::telemetry;
use psyrisk::workflows::assessment::questionnaire::{SubmissionService, WizardState};
use psyrisk::workflows::assessment::report::{
    ActionLookup, ActionPlanState, CampaignPlanService, NoActions, ReportService, ReportState,
};
use psyrisk::workflows::assessment::QuestionCatalog;
use psyrisk::workflows::dashboard::DashboardService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (store, directory, events, actions, catalog) = if args.seed_demo {
        let world = seed_demo(Local::now().date_naive(), 18)?;
        info!(
            baseline = %world.baseline.token,
            current = %world.current.token,
            "demo tenant seeded"
        );
        (
            world.store,
            world.directory,
            world.events,
            world.actions as Arc<dyn ActionLookup>,
            world.catalog,
        )
    } else {
        (
            Arc::new(InMemoryResponseStore::default()),
            Arc::new(InMemoryDirectory::default()),
            Arc::new(InMemoryEventLog::default()),
            Arc::new(NoActions) as Arc<dyn ActionLookup>,
            Arc::new(QuestionCatalog::standard()),
        )
    };

    let services = ServiceParts {
        store,
        directory,
        events,
        actions,
        catalog,
        dashboard: config.dashboard,
        alerts: config.alerts,
        clock: Arc::new(SystemClock),
    };
    let app = app_router(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "psychosocial risk service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Stores and settings the HTTP surface is assembled from.
pub(crate) struct ServiceParts {
    pub(crate) store: Arc<InMemoryResponseStore>,
    pub(crate) directory: Arc<InMemoryDirectory>,
    pub(crate) events: Arc<InMemoryEventLog>,
    pub(crate) actions: Arc<dyn ActionLookup>,
    pub(crate) catalog: Arc<QuestionCatalog>,
    pub(crate) dashboard: DashboardConfig,
    pub(crate) alerts: AlertSettings,
    pub(crate) clock: Arc<dyn Clock>,
}

pub(crate) fn app_router(parts: ServiceParts) -> Router {
    let ServiceParts {
        store,
        directory,
        events,
        actions,
        catalog,
        dashboard,
        alerts,
        clock,
    } = parts;

    let wizard = Arc::new(WizardState {
        service: Arc::new(SubmissionService::new(store.clone(), catalog.clone())),
        sessions: Arc::new(InMemorySessionStore::default()),
        campaigns: directory.clone(),
        tenants: directory.clone(),
    });
    let reports = Arc::new(ReportState {
        service: Arc::new(ReportService::new(store, catalog, actions, directory.clone())),
        campaigns: directory.clone(),
        tenants: directory.clone(),
    });
    let plans = Arc::new(ActionPlanState {
        service: Arc::new(CampaignPlanService::new(Arc::new(InMemoryPlanStore::default()))),
        campaigns: directory,
    });
    let dashboard = Arc::new(DashboardState {
        service: Arc::new(DashboardService::new(events, dashboard).with_alert_settings(alerts)),
        clock,
    });

    build_router(wizard, reports, plans, dashboard)
}

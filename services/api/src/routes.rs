use crate::infra::{AppState, Clock};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use psyrisk::error::AppError;
use psyrisk::workflows::assessment::campaign::GroupId;
use psyrisk::workflows::assessment::questionnaire::{
    questionnaire_router, ResponseStore, SessionStore, WizardState,
};
use psyrisk::workflows::assessment::report::{
    action_plan_router, report_router, ActionPlanState, CampaignPlanStore, ReportState,
};
use psyrisk::workflows::assessment::TenantId;
use psyrisk::workflows::dashboard::{
    AlertEvaluation, DashboardFilter, DashboardReport, DashboardService, EventLog,
    PeriodComparison,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query string of the dashboard routes. Dates are `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardQuery {
    #[serde(default)]
    pub(crate) start: Option<String>,
    #[serde(default)]
    pub(crate) end: Option<String>,
    #[serde(default)]
    pub(crate) kiosk: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<u64>,
    #[serde(default)]
    pub(crate) ghe: Option<u64>,
}

impl DashboardQuery {
    fn filter(&self) -> DashboardFilter {
        DashboardFilter {
            kiosk: self.kiosk.clone(),
            department: self.department.map(GroupId),
            ghe: self.ghe.map(GroupId),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PeriodComparisonQuery {
    #[serde(default)]
    pub(crate) a_start: Option<String>,
    #[serde(default)]
    pub(crate) a_end: Option<String>,
    #[serde(default)]
    pub(crate) b_start: Option<String>,
    #[serde(default)]
    pub(crate) b_end: Option<String>,
    #[serde(default)]
    pub(crate) kiosk: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<u64>,
    #[serde(default)]
    pub(crate) ghe: Option<u64>,
}

/// Dashboard service plus the clock that anchors default windows.
pub(crate) struct DashboardState<L> {
    pub(crate) service: Arc<DashboardService<L>>,
    pub(crate) clock: Arc<dyn Clock>,
}

/// Full HTTP surface: wizard, reports, action plans, dashboard and health checks.
pub(crate) fn build_router<R, S, P, L>(
    wizard: Arc<WizardState<R, S>>,
    reports: Arc<ReportState<R>>,
    plans: Arc<ActionPlanState<P>>,
    dashboard: Arc<DashboardState<L>>,
) -> Router
where
    R: ResponseStore + 'static,
    S: SessionStore + 'static,
    P: CampaignPlanStore + 'static,
    L: EventLog + 'static,
{
    questionnaire_router(wizard)
        .merge(report_router(reports))
        .merge(action_plan_router(plans))
        .merge(dashboard_router(dashboard))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) fn dashboard_router<L>(state: Arc<DashboardState<L>>) -> Router
where
    L: EventLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenants/:tenant/dashboard",
            get(dashboard_endpoint::<L>),
        )
        .route(
            "/api/v1/tenants/:tenant/dashboard/compare",
            get(dashboard_compare_endpoint::<L>),
        )
        .route("/api/v1/tenants/:tenant/alerts", get(alerts_endpoint::<L>))
        .with_state(state)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn dashboard_endpoint<L>(
    State(state): State<Arc<DashboardState<L>>>,
    Path(tenant): Path<u64>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardReport>, AppError>
where
    L: EventLog + 'static,
{
    let service = &state.service;
    let today = state.clock.today();
    let period = service.resolve_period(query.start.as_deref(), query.end.as_deref(), today);
    let report = service.report(TenantId(tenant), period, &query.filter())?;
    Ok(Json(report))
}

pub(crate) async fn alerts_endpoint<L>(
    State(state): State<Arc<DashboardState<L>>>,
    Path(tenant): Path<u64>,
) -> Result<Json<AlertEvaluation>, AppError>
where
    L: EventLog + 'static,
{
    let evaluation = state.service.alerts(TenantId(tenant), state.clock.today())?;
    Ok(Json(evaluation))
}

pub(crate) async fn dashboard_compare_endpoint<L>(
    State(state): State<Arc<DashboardState<L>>>,
    Path(tenant): Path<u64>,
    Query(query): Query<PeriodComparisonQuery>,
) -> Result<Json<PeriodComparison>, AppError>
where
    L: EventLog + 'static,
{
    let service = &state.service;
    let today = state.clock.today();
    let a = service.resolve_period(query.a_start.as_deref(), query.a_end.as_deref(), today);
    let b = service.resolve_period(query.b_start.as_deref(), query.b_end.as_deref(), today);
    let filter = DashboardFilter {
        kiosk: query.kiosk.clone(),
        department: query.department.map(GroupId),
        ghe: query.ghe.map(GroupId),
    };
    let comparison = service.compare(TenantId(tenant), a, b, &filter)?;
    Ok(Json(comparison))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryEventLog;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use psyrisk::config::DashboardConfig;
    use psyrisk::workflows::dashboard::{
        AlertKind, AlertLevel, CaseStatus, ComplaintRecord, RecordedEvents,
    };
    use tower::ServiceExt;

    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).expect("valid date")
    }

    fn state(today: NaiveDate) -> Arc<DashboardState<InMemoryEventLog>> {
        let log = InMemoryEventLog::default();
        let complaint = |day: u32| ComplaintRecord {
            date: june(day),
            category: "Workload".to_string(),
            status: CaseStatus::Open,
            kiosk: Some("lobby".to_string()),
        };
        log.record(
            TenantId(7),
            RecordedEvents {
                complaints: (10..16).map(complaint).collect(),
                ..RecordedEvents::default()
            },
        );
        Arc::new(DashboardState {
            service: Arc::new(DashboardService::new(
                Arc::new(log),
                DashboardConfig::default(),
            )),
            clock: Arc::new(FixedClock(today)),
        })
    }

    #[tokio::test]
    async fn dashboard_endpoint_reports_high_risk() {
        let Json(report) = dashboard_endpoint(
            State(state(june(30))),
            Path(7),
            Query(DashboardQuery::default()),
        )
        .await
        .expect("dashboard builds");

        assert_eq!(report.current.complaint_count, 6);
        assert_eq!(report.current.risk_label, "High");
        assert_eq!(report.current.timeline.len(), 30);
    }

    #[tokio::test]
    async fn default_window_follows_the_injected_clock() {
        // A window ending before the complaints were filed sees none of them.
        let Json(report) = dashboard_endpoint(
            State(state(june(9))),
            Path(7),
            Query(DashboardQuery::default()),
        )
        .await
        .expect("dashboard builds");

        assert_eq!(report.current.period.end, june(9));
        assert_eq!(report.current.complaint_count, 0);
    }

    #[tokio::test]
    async fn today_is_not_read_from_the_query_string() {
        let response = dashboard_router(state(june(9)))
            .oneshot(
                Request::builder()
                    .uri("/api/v1/tenants/7/dashboard?today=2025-06-30")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router answers");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let report: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(report["current"]["complaint_count"], 0);
    }

    #[tokio::test]
    async fn dashboard_endpoint_applies_kiosk_filter() {
        let query = DashboardQuery {
            kiosk: Some("canteen".to_string()),
            ..DashboardQuery::default()
        };

        let Json(report) = dashboard_endpoint(State(state(june(30))), Path(7), Query(query))
            .await
            .expect("dashboard builds");

        assert_eq!(report.current.complaint_count, 0);
        assert_eq!(report.current.risk_label, "Low");
    }

    #[tokio::test]
    async fn alerts_endpoint_evaluates_the_window_ending_today() {
        let Json(evaluation) = alerts_endpoint(State(state(june(30))), Path(7))
            .await
            .expect("alerts evaluate");

        assert_eq!(evaluation.period.end, june(30));
        assert_eq!(evaluation.alerts.len(), 1);
        assert_eq!(evaluation.alerts[0].kind, AlertKind::Complaint);
        assert_eq!(evaluation.alerts[0].level, AlertLevel::High);

        let Json(quiet) = alerts_endpoint(State(state(june(9))), Path(7))
            .await
            .expect("alerts evaluate");
        assert!(quiet.alerts.is_empty());
    }

    #[tokio::test]
    async fn period_comparison_counts_both_windows() {
        let query = PeriodComparisonQuery {
            a_start: Some("2025-06-01".to_string()),
            a_end: Some("2025-06-11".to_string()),
            b_start: Some("2025-06-12".to_string()),
            b_end: Some("2025-06-20".to_string()),
            ..PeriodComparisonQuery::default()
        };

        let Json(comparison) =
            dashboard_compare_endpoint(State(state(june(30))), Path(7), Query(query))
                .await
                .expect("comparison builds");

        assert_eq!(comparison.complaints.a, 2);
        assert_eq!(comparison.complaints.b, 4);
        assert_eq!(comparison.complaints.delta, 2);
        assert_eq!(comparison.complaints.relative_percent, Some(100.0));
    }
}

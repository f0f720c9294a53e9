use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::assessment::questionnaire::repository::StoreError;
use crate::workflows::assessment::report::{ActionPlanImportError, ReportError};
use crate::workflows::dashboard::EventLogError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Store(StoreError),
    Report(ReportError),
    Import(ActionPlanImportError),
    Events(EventLogError),
    Export { line: usize, source: serde_json::Error },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Store(err) => write!(f, "response store error: {}", err),
            AppError::Report(err) => write!(f, "report error: {}", err),
            AppError::Import(err) => write!(f, "action plan import error: {}", err),
            AppError::Events(err) => write!(f, "dashboard error: {}", err),
            AppError::Export { line, source } => {
                write!(f, "response export line {}: {}", line, source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Report(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Events(err) => Some(err),
            AppError::Export { source, .. } => Some(source),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Report(ReportError::NotFinished(_)) => StatusCode::CONFLICT,
            AppError::Report(ReportError::TenantMismatch { .. }) => StatusCode::FORBIDDEN,
            AppError::Report(ReportError::SameCampaign(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Import(_) | AppError::Export { .. } => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Store(_)
            | AppError::Report(ReportError::Store(_))
            | AppError::Events(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ReportError> for AppError {
    fn from(value: ReportError) -> Self {
        Self::Report(value)
    }
}

impl From<ActionPlanImportError> for AppError {
    fn from(value: ActionPlanImportError) -> Self {
        Self::Import(value)
    }
}

impl From<EventLogError> for AppError {
    fn from(value: EventLogError) -> Self {
        Self::Events(value)
    }
}

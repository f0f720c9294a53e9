use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{AlertSettings, DashboardConfig};
use crate::workflows::assessment::campaign::TenantId;

use super::alerts::{evaluate_alerts, AlertEvaluation};
use super::domain::{DashboardFilter, EventLog, EventLogError};
use super::metrics::{compare_periods, period_metrics, PeriodComparison, PeriodMetrics};
use super::period::ReportingPeriod;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub current: PeriodMetrics,
    pub previous: PeriodMetrics,
    pub comparison: PeriodComparison,
}

pub struct DashboardService<L> {
    log: Arc<L>,
    config: DashboardConfig,
    alerts: AlertSettings,
}

impl<L> DashboardService<L>
where
    L: EventLog,
{
    pub fn new(log: Arc<L>, config: DashboardConfig) -> Self {
        Self {
            log,
            config,
            alerts: AlertSettings::default(),
        }
    }

    pub fn with_alert_settings(mut self, alerts: AlertSettings) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn resolve_period(
        &self,
        raw_start: Option<&str>,
        raw_end: Option<&str>,
        today: NaiveDate,
    ) -> ReportingPeriod {
        ReportingPeriod::resolve(raw_start, raw_end, today, &self.config)
    }

    /// Metrics for one period.
    pub fn metrics(
        &self,
        tenant: TenantId,
        period: ReportingPeriod,
        filter: &DashboardFilter,
    ) -> Result<PeriodMetrics, EventLogError> {
        let prior = period.previous();
        let events = self.log.events(tenant, period.start, period.end)?;
        let previous = self.log.events(tenant, prior.start, prior.end)?;

        debug!(
            tenant = %tenant,
            start = %period.start,
            end = %period.end,
            moods = events.moods.len(),
            complaints = events.complaints.len(),
            "dashboard events loaded"
        );

        Ok(period_metrics(period, &events, &previous, filter))
    }

    /// Metrics for `period` and the window before it, compared.
    pub fn report(
        &self,
        tenant: TenantId,
        period: ReportingPeriod,
        filter: &DashboardFilter,
    ) -> Result<DashboardReport, EventLogError> {
        let current = self.metrics(tenant, period, filter)?;
        let previous = self.metrics(tenant, period.previous(), filter)?;
        let comparison = compare_periods(&previous, &current);
        Ok(DashboardReport {
            current,
            previous,
            comparison,
        })
    }

    /// Evaluate the automatic alert limits over the alert window ending on `today`.
    pub fn alerts(
        &self,
        tenant: TenantId,
        today: NaiveDate,
    ) -> Result<AlertEvaluation, EventLogError> {
        let window = i64::from(self.alerts.window_days.max(1));
        let period = ReportingPeriod {
            start: today - Duration::days(window - 1),
            end: today,
        };
        let events = self.log.events(tenant, period.start, period.end)?;
        let evaluation = evaluate_alerts(&self.alerts, period, &events);

        for alert in &evaluation.alerts {
            warn!(
                tenant = %tenant,
                kind = ?alert.kind,
                level = ?alert.level,
                observed = %alert.observed,
                "automatic alert raised"
            );
        }
        Ok(evaluation)
    }

    /// Compare two arbitrary periods; `a` is the baseline.
    pub fn compare(
        &self,
        tenant: TenantId,
        a: ReportingPeriod,
        b: ReportingPeriod,
        filter: &DashboardFilter,
    ) -> Result<PeriodComparison, EventLogError> {
        let baseline = self.metrics(tenant, a, filter)?;
        let current = self.metrics(tenant, b, filter)?;
        Ok(compare_periods(&baseline, &current))
    }
}

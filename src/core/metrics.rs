use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_enrollment(course_id: &str) {
    metrics::counter!("enrollments_total", "course_id" => course_id.to_string()).increment(1);
}

pub(crate) fn record_module_completion() {
    metrics::counter!("module_completions_total").increment(1);
}

pub(crate) fn record_quiz_attempt(passed: bool) {
    let outcome = if passed { "passed" } else { "failed" };
    metrics::counter!("quiz_attempts_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_certificate_issued(trigger: &'static str) {
    metrics::counter!("certificates_issued_total", "trigger" => trigger).increment(1);
}

pub(crate) fn record_counter_drift(table: &'static str, rows: u64) {
    metrics::counter!("counter_drift_rows_total", "table" => table).increment(rows);
}

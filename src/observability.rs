use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Clone)]
pub struct MetricsSnapshot {
    pub started_at: Option<DateTime<Utc>>,
    pub steps: BTreeMap<String, StepMetrics>,
    pub total_duration_ms: f64,
    pub failed_step: Option<String>,
}

#[derive(Debug, Default, Serialize, Clone)]
pub struct StepMetrics {
    pub calls: u64,
    pub duration_ms: f64,
}

/// Shared handle; clones observe the same snapshot.
#[derive(Debug, Default, Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsSnapshot>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_step(&self, step_name: &'static str) -> StepTimer {
        StepTimer {
            step: step_name,
            started_at: Instant::now(),
            collector: self.inner.clone(),
        }
    }

    pub fn begin_run(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = MetricsSnapshot {
                started_at: Some(Utc::now()),
                ..MetricsSnapshot::default()
            };
        }
    }

    pub fn record_total_duration(&self, duration: Duration) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.total_duration_ms = duration.as_secs_f64() * 1_000.0;
        }
    }

    pub fn record_failure(&self, step_name: &str) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.failed_step = Some(step_name.to_string());
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

/// Records the step duration when dropped, so failing steps are timed too.
pub struct StepTimer {
    step: &'static str,
    started_at: Instant,
    collector: Arc<Mutex<MetricsSnapshot>>,
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        let duration_ms = self.started_at.elapsed().as_secs_f64() * 1_000.0;
        if let Ok(mut guard) = self.collector.lock() {
            let metrics = guard.steps.entry(self.step.to_string()).or_default();
            metrics.calls += 1;
            metrics.duration_ms += duration_ms;
        }
        debug!(step = self.step, duration_ms, "Step duration recorded");
    }
}

pub fn log_snapshot(snapshot: &MetricsSnapshot) {
    info!(
        total_duration_ms = snapshot.total_duration_ms,
        step_count = snapshot.steps.len(),
        failed_step = snapshot.failed_step.as_deref().unwrap_or("none"),
        "Pipeline metrics summary"
    );
    for (step, metrics) in &snapshot.steps {
        info!(
            step = step.as_str(),
            calls = metrics.calls,
            duration_ms = metrics.duration_ms,
            "Step metrics"
        );
    }
}

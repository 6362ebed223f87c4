//! Shared health state for the /health endpoint.
//! Updated by the startup ETL, read by the API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::routes::ApiState;

#[derive(Default)]
pub struct HealthState {
    /// True when the last ETL run committed a snapshot.
    last_etl_ok: AtomicBool,
    /// Millisecond timestamp of the last ETL attempt (0 = none this process).
    last_etl_at_ms: AtomicU64,
    /// Entities skipped by the last successful run.
    last_etl_skipped: AtomicU64,
    /// True when the stored snapshot is the built-in sample league.
    sample_data: AtomicBool,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_etl(&self, ok: bool, skipped: u64) {
        self.last_etl_ok.store(ok, Ordering::Relaxed);
        self.last_etl_at_ms
            .store(chrono::Utc::now().timestamp_millis().max(0) as u64, Ordering::Relaxed);
        if ok {
            self.last_etl_skipped.store(skipped, Ordering::Relaxed);
        }
    }

    pub fn set_sample_data(&self, v: bool) {
        self.sample_data.store(v, Ordering::Relaxed);
    }

    pub fn last_etl_ok(&self) -> bool {
        self.last_etl_ok.load(Ordering::Relaxed)
    }

    pub fn last_etl_at_ms(&self) -> u64 {
        self.last_etl_at_ms.load(Ordering::Relaxed)
    }

    pub fn last_etl_skipped(&self) -> u64 {
        self.last_etl_skipped.load(Ordering::Relaxed)
    }

    pub fn sample_data(&self) -> bool {
        self.sample_data.load(Ordering::Relaxed)
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
    pub last_etl_ok: bool,
    pub last_etl_at_ms: Option<u64>,
    pub last_etl_skipped: u64,
    pub sample_data: bool,
}

pub async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let h = &state.health;
    let at = h.last_etl_at_ms();

    Json(HealthResponse {
        status: if db_ok { "healthy" } else { "degraded" },
        database: state.db_path.clone(),
        last_etl_ok: h.last_etl_ok(),
        last_etl_at_ms: (at > 0).then_some(at),
        last_etl_skipped: h.last_etl_skipped(),
        sample_data: h.sample_data(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_run_keeps_previous_skip_count() {
        let h = HealthState::new();
        assert_eq!(h.last_etl_at_ms(), 0);

        h.record_etl(true, 3);
        assert!(h.last_etl_ok());
        assert_eq!(h.last_etl_skipped(), 3);
        assert!(h.last_etl_at_ms() > 0);

        h.record_etl(false, 0);
        assert!(!h.last_etl_ok());
        assert_eq!(h.last_etl_skipped(), 3);
    }
}

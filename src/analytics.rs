//! # Analytics
//!
//! Two reports are served under `/analytics`:
//!
//! - **entities**: record counts per kind plus relationship totals, computed
//!   with the same scan-and-filter walk the listings use
//! - **usage**: request volume since the first request ever seen
//!
//! Usage is collected by `track_requests`, a middleware that runs on every
//! request before the handler. Recording is best effort: if the store refuses,
//! the request proceeds as if nothing happened.

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{Json, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};

use crate::records::count_entities;
use crate::relationship::count_links;
use crate::{ApiError, EntityKind, KeyValueStore, SharedStore, StoreError};

/// Unix seconds of the first request, written once.
pub const STATS_START_TS_KEY: &str = "stats:start_ts";

/// Running request count.
pub const STATS_REQUESTS_KEY: &str = "stats:requests";

/// Current unix time in seconds.
pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

/////////////////////////////////////////////// Counts ///////////////////////////////////////////////

/// Record and relationship counts, as served by `GET /analytics/entities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    /// Hospital records.
    pub hospitals: usize,
    /// Doctor records.
    pub doctors: usize,
    /// Patient records.
    pub patients: usize,
    /// Diagnosis records.
    pub diagnoses: usize,
    /// Doctors with at least one linked patient.
    pub doctor_patient_sets: usize,
    /// Total doctor to patient links.
    pub doctor_patient_links: usize,
}

/// Counts every kind of record and the relationship sets.
pub async fn entity_counts(store: &dyn KeyValueStore) -> Result<EntityCounts, StoreError> {
    let hospitals = count_entities(store, EntityKind::Hospital).await?;
    let doctors = count_entities(store, EntityKind::Doctor).await?;
    let patients = count_entities(store, EntityKind::Patient).await?;
    let diagnoses = count_entities(store, EntityKind::Diagnosis).await?;
    let (doctor_patient_sets, doctor_patient_links) = count_links(store).await?;
    Ok(EntityCounts {
        hospitals,
        doctors,
        patients,
        diagnoses,
        doctor_patient_sets,
        doctor_patient_links,
    })
}

//////////////////////////////////////////////// Usage ///////////////////////////////////////////////

/// Request volume, as served by `GET /analytics/usage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    /// Unix seconds of the first recorded request.
    pub start_ts: i64,
    /// Unix seconds when the report was computed.
    pub now_ts: i64,
    /// Seconds since `start_ts`, never less than one.
    pub uptime_seconds: i64,
    /// Requests recorded so far.
    pub total_requests: u64,
    /// Average requests per second over the uptime.
    pub avg_rps: f64,
    /// Average requests per minute over the uptime.
    pub avg_rpm: f64,
}

impl UsageReport {
    /// Builds a report from the stored counters. Missing counters mean no
    /// request has been recorded yet: the start is taken to be `now_ts` and the
    /// total to be zero.
    pub fn compute(start_ts: Option<i64>, total_requests: Option<u64>, now_ts: i64) -> Self {
        let start_ts = start_ts.unwrap_or(now_ts);
        let total_requests = total_requests.unwrap_or(0);
        let uptime_seconds = now_ts.saturating_sub(start_ts).max(1);
        let avg_rps = total_requests as f64 / uptime_seconds as f64;
        Self {
            start_ts,
            now_ts,
            uptime_seconds,
            total_requests,
            avg_rps,
            avg_rpm: avg_rps * 60.0,
        }
    }
}

fn parse_stat<T: std::str::FromStr>(
    key: &str,
    value: Option<String>,
) -> Result<Option<T>, StoreError> {
    value
        .map(|v| {
            v.parse::<T>().map_err(|_| {
                StoreError::Internal(format!("{} holds non-numeric value {:?}", key, v))
            })
        })
        .transpose()
}

/// Reads the usage counters and computes the report as of `now_ts`.
pub async fn usage_report(
    store: &dyn KeyValueStore,
    now_ts: i64,
) -> Result<UsageReport, StoreError> {
    let start_ts = parse_stat(STATS_START_TS_KEY, store.get(STATS_START_TS_KEY).await?)?;
    let total = parse_stat(STATS_REQUESTS_KEY, store.get(STATS_REQUESTS_KEY).await?)?;
    Ok(UsageReport::compute(start_ts, total, now_ts))
}

/// Records one request: sets the start time if absent and bumps the counter.
///
/// Never fails; store errors are logged and dropped.
pub async fn record_request(store: &dyn KeyValueStore, now_ts: i64) {
    let result: Result<(), StoreError> = async {
        store.set_nx(STATS_START_TS_KEY, &now_ts.to_string()).await?;
        store.incr(STATS_REQUESTS_KEY).await?;
        Ok(())
    }
    .await;
    if let Err(e) = result {
        tracing::debug!(error = %e, "could not record request statistics");
    }
}

/// Middleware counting every request, whatever its route or outcome.
pub async fn track_requests(
    State(store): State<SharedStore>,
    request: Request,
    next: Next,
) -> Response {
    record_request(store.as_ref(), now_ts()).await;
    next.run(request).await
}

////////////////////////////////////////////// Routes //////////////////////////////////////////////////

async fn get_entity_counts(
    State(store): State<SharedStore>,
) -> Result<Json<EntityCounts>, ApiError> {
    Ok(Json(entity_counts(store.as_ref()).await?))
}

async fn get_usage(State(store): State<SharedStore>) -> Result<Json<UsageReport>, ApiError> {
    Ok(Json(usage_report(store.as_ref(), now_ts()).await?))
}

/// Router serving `/analytics/entities` and `/analytics/usage`.
pub fn create_analytics_router(store: SharedStore) -> Router {
    Router::new()
        .route("/analytics/entities", get(get_entity_counts))
        .route("/analytics/usage", get(get_usage))
        .with_state(store)
}

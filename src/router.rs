use std::path::Path;

use axum::Router;
use axum::middleware;
use axum::response::Html;
use axum::routing::get;
use tower_http::services::ServeDir;

use crate::analytics::{create_analytics_router, track_requests};
use crate::diagnosis::create_diagnosis_router;
use crate::doctor::create_doctor_router;
use crate::doctor_patient::create_doctor_patient_router;
use crate::hospital::create_hospital_router;
use crate::html::INDEX_HTML;
use crate::patient::create_patient_router;
use crate::SharedStore;

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Builds the whole application: landing page, the five resources, analytics
/// and static files, with request statistics recorded for every request.
pub fn create_app(store: SharedStore, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(create_hospital_router(store.clone()))
        .merge(create_doctor_router(store.clone()))
        .merge(create_patient_router(store.clone()))
        .merge(create_diagnosis_router(store.clone()))
        .merge(create_doctor_patient_router(store.clone()))
        .merge(create_analytics_router(store.clone()))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(store, track_requests))
}

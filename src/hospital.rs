use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use serde::{Deserialize, Serialize};

use crate::form::{FormArgs, created_message, record_of, trimmed};
use crate::records::{create_entity, list_entities};
use crate::{ApiError, EntityKind, SharedStore, html};

/// Form fields accepted by `POST /hospital`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HospitalForm {
    /// Required.
    #[serde(default, deserialize_with = "trimmed")]
    pub name: String,
    /// Required.
    #[serde(default, deserialize_with = "trimmed")]
    pub address: String,
    /// Optional.
    #[serde(default, deserialize_with = "trimmed")]
    pub beds_number: String,
    /// Optional.
    #[serde(default, deserialize_with = "trimmed")]
    pub phone: String,
}

async fn list_hospitals(State(store): State<SharedStore>) -> Result<Html<String>, ApiError> {
    let hospitals = list_entities(store.as_ref(), EntityKind::Hospital).await?;
    Ok(Html(html::render_listing(EntityKind::Hospital, &hospitals)))
}

async fn create_hospital(
    State(store): State<SharedStore>,
    FormArgs(form): FormArgs<HospitalForm>,
) -> Result<String, ApiError> {
    if form.name.is_empty() || form.address.is_empty() {
        return Err(ApiError::Validation("Hospital name and address required"));
    }
    tracing::debug!(
        name = %form.name,
        address = %form.address,
        beds_number = %form.beds_number,
        phone = %form.phone,
        "creating hospital"
    );

    let record = record_of(&[
        ("name", form.name.as_str()),
        ("address", form.address.as_str()),
        ("phone", form.phone.as_str()),
        ("beds_number", form.beds_number.as_str()),
    ]);
    let id = create_entity(store.as_ref(), EntityKind::Hospital, &record).await?;
    Ok(created_message(&id, &form.name))
}

/// Router serving `GET` and `POST /hospital`.
pub fn create_hospital_router(store: SharedStore) -> Router {
    Router::new()
        .route("/hospital", get(list_hospitals).post(create_hospital))
        .with_state(store)
}

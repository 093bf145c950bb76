use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use serde::{Deserialize, Serialize};

use crate::form::{FormArgs, created_message, record_of, trimmed};
use crate::records::{create_entity, fetch_entity, list_entities};
use crate::{ApiError, EntityKind, SharedStore, html};

/// Form fields accepted by `POST /diagnosis`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosisForm {
    /// Required; must name an existing patient.
    #[serde(rename = "patient_ID", default, deserialize_with = "trimmed")]
    pub patient_id: String,
    /// Required.
    #[serde(rename = "type", default, deserialize_with = "trimmed")]
    pub diagnosis_type: String,
    /// Optional free text.
    #[serde(default, deserialize_with = "trimmed")]
    pub information: String,
}

async fn list_diagnoses(State(store): State<SharedStore>) -> Result<Html<String>, ApiError> {
    let diagnoses = list_entities(store.as_ref(), EntityKind::Diagnosis).await?;
    Ok(Html(html::render_listing(EntityKind::Diagnosis, &diagnoses)))
}

async fn create_diagnosis(
    State(store): State<SharedStore>,
    FormArgs(form): FormArgs<DiagnosisForm>,
) -> Result<String, ApiError> {
    if form.patient_id.is_empty() || form.diagnosis_type.is_empty() {
        // Misspelling is part of the published response text.
        return Err(ApiError::Validation("Patiend ID and diagnosis type required"));
    }
    tracing::debug!(
        patient_id = %form.patient_id,
        diagnosis_type = %form.diagnosis_type,
        information = %form.information,
        "creating diagnosis"
    );

    let Some(patient) = fetch_entity(store.as_ref(), EntityKind::Patient, &form.patient_id).await?
    else {
        return Err(ApiError::Reference("No patient with such ID"));
    };

    let record = record_of(&[
        ("patient_ID", form.patient_id.as_str()),
        ("type", form.diagnosis_type.as_str()),
        ("information", form.information.as_str()),
    ]);
    let id = create_entity(store.as_ref(), EntityKind::Diagnosis, &record).await?;
    let surname = patient.get("surname").map(String::as_str).unwrap_or("");
    Ok(created_message(&id, &format!("patient {}", surname)))
}

/// Router serving `GET` and `POST /diagnosis`.
pub fn create_diagnosis_router(store: SharedStore) -> Router {
    Router::new()
        .route("/diagnosis", get(list_diagnoses).post(create_diagnosis))
        .with_state(store)
}

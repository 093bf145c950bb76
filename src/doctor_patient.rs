use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use serde::{Deserialize, Serialize};

use crate::form::{FormArgs, trimmed};
use crate::relationship::{LinkOutcome, link, list_links};
use crate::{ApiError, SharedStore, html};

/// Form fields accepted by `POST /doctor-patient`. Both are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorPatientForm {
    /// Doctor to link.
    #[serde(rename = "doctor_ID", default, deserialize_with = "trimmed")]
    pub doctor_id: String,
    /// Patient to add to the doctor's set.
    #[serde(rename = "patient_ID", default, deserialize_with = "trimmed")]
    pub patient_id: String,
}

async fn list_doctor_patients(State(store): State<SharedStore>) -> Result<Html<String>, ApiError> {
    let links = list_links(store.as_ref()).await?;
    Ok(Html(html::render_links(&links)))
}

async fn create_doctor_patient(
    State(store): State<SharedStore>,
    FormArgs(form): FormArgs<DoctorPatientForm>,
) -> Result<String, ApiError> {
    if form.doctor_id.is_empty() || form.patient_id.is_empty() {
        return Err(ApiError::Validation("ID required"));
    }
    tracing::debug!(doctor_id = %form.doctor_id, patient_id = %form.patient_id, "linking");

    match link(store.as_ref(), &form.doctor_id, &form.patient_id).await? {
        LinkOutcome::Linked => Ok(format!(
            "OK: doctor ID: {}, patient ID: {}",
            form.doctor_id, form.patient_id
        )),
        LinkOutcome::MissingEntity => Err(ApiError::Reference("No such ID for doctor or patient")),
    }
}

/// Router serving `GET` and `POST /doctor-patient`.
pub fn create_doctor_patient_router(store: SharedStore) -> Router {
    Router::new()
        .route(
            "/doctor-patient",
            get(list_doctor_patients).post(create_doctor_patient),
        )
        .with_state(store)
}

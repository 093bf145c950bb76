use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use serde::{Deserialize, Serialize};

use crate::form::{FormArgs, created_message, record_of, trimmed};
use crate::records::{create_entity, fetch_entity, list_entities};
use crate::{ApiError, EntityKind, SharedStore, html};

/// Form fields accepted by `POST /doctor`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorForm {
    /// Required.
    #[serde(default, deserialize_with = "trimmed")]
    pub surname: String,
    /// Required.
    #[serde(default, deserialize_with = "trimmed")]
    pub profession: String,
    /// Optional; when given it must name an existing hospital.
    #[serde(rename = "hospital_ID", default, deserialize_with = "trimmed")]
    pub hospital_id: String,
}

async fn list_doctors(State(store): State<SharedStore>) -> Result<Html<String>, ApiError> {
    let doctors = list_entities(store.as_ref(), EntityKind::Doctor).await?;
    Ok(Html(html::render_listing(EntityKind::Doctor, &doctors)))
}

async fn create_doctor(
    State(store): State<SharedStore>,
    FormArgs(form): FormArgs<DoctorForm>,
) -> Result<String, ApiError> {
    if form.surname.is_empty() || form.profession.is_empty() {
        return Err(ApiError::Validation("Surname and profession required"));
    }
    tracing::debug!(surname = %form.surname, profession = %form.profession, "creating doctor");

    if !form.hospital_id.is_empty()
        && fetch_entity(store.as_ref(), EntityKind::Hospital, &form.hospital_id)
            .await?
            .is_none()
    {
        return Err(ApiError::Reference("No hospital with such ID"));
    }

    let record = record_of(&[
        ("surname", form.surname.as_str()),
        ("profession", form.profession.as_str()),
        ("hospital_ID", form.hospital_id.as_str()),
    ]);
    let id = create_entity(store.as_ref(), EntityKind::Doctor, &record).await?;
    Ok(created_message(&id, &form.surname))
}

/// Router serving `GET` and `POST /doctor`.
pub fn create_doctor_router(store: SharedStore) -> Router {
    Router::new()
        .route("/doctor", get(list_doctors).post(create_doctor))
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::KeyValueStore;
    use crate::test_utils::test_helpers::{seeded_store, serve};

    fn doctor(surname: &str, hospital_id: &str) -> DoctorForm {
        DoctorForm {
            surname: surname.into(),
            profession: "Therapist".into(),
            hospital_id: hospital_id.into(),
        }
    }

    #[tokio::test]
    async fn doctor_without_hospital() {
        let (store, shared) = seeded_store().await;
        let server = serve(create_doctor_router(shared));

        let response = server.post("/doctor").form(&doctor("Petrov", "")).await;
        response.assert_status_ok();
        response.assert_text("OK: ID 1 for Petrov");

        let stored = store.read_hash("doctor:1").await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored["hospital_ID"], "");
    }

    #[tokio::test]
    async fn unknown_hospital_is_rejected() {
        let (store, shared) = seeded_store().await;
        let server = serve(create_doctor_router(shared));

        let response = server.post("/doctor").form(&doctor("Ivanov", "999")).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("No hospital with such ID");
        assert!(store.read_hash("doctor:1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn surname_and_profession_required() {
        let (_store, shared) = seeded_store().await;
        let server = serve(create_doctor_router(shared));

        let response = server
            .post("/doctor")
            .form(&DoctorForm {
                surname: "Ivanov".into(),
                ..Default::default()
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Surname and profession required");
    }
}

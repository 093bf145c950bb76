use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use serde::{Deserialize, Serialize};

use crate::form::{FormArgs, created_message, record_of, trimmed};
use crate::records::{create_entity, list_entities};
use crate::{ApiError, EntityKind, SharedStore, html};

/// Form fields accepted by `POST /patient`. All are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientForm {
    /// Family name.
    #[serde(default, deserialize_with = "trimmed")]
    pub surname: String,
    /// Date of birth, kept as entered.
    #[serde(default, deserialize_with = "trimmed")]
    pub born_date: String,
    /// `M` or `F`.
    #[serde(default, deserialize_with = "trimmed")]
    pub sex: String,
    /// Medical policy number.
    #[serde(default, deserialize_with = "trimmed")]
    pub mpn: String,
}

impl PatientForm {
    fn validate(&self) -> Result<(), ApiError> {
        if self.surname.is_empty()
            || self.born_date.is_empty()
            || self.sex.is_empty()
            || self.mpn.is_empty()
        {
            return Err(ApiError::Validation("All fields required"));
        }
        if self.sex != "M" && self.sex != "F" {
            return Err(ApiError::Validation("Sex must be 'M' or 'F'"));
        }
        Ok(())
    }
}

async fn list_patients(State(store): State<SharedStore>) -> Result<Html<String>, ApiError> {
    let patients = list_entities(store.as_ref(), EntityKind::Patient).await?;
    Ok(Html(html::render_listing(EntityKind::Patient, &patients)))
}

async fn create_patient(
    State(store): State<SharedStore>,
    FormArgs(form): FormArgs<PatientForm>,
) -> Result<String, ApiError> {
    form.validate()?;
    tracing::debug!(
        surname = %form.surname,
        born_date = %form.born_date,
        sex = %form.sex,
        mpn = %form.mpn,
        "creating patient"
    );

    let record = record_of(&[
        ("surname", form.surname.as_str()),
        ("born_date", form.born_date.as_str()),
        ("sex", form.sex.as_str()),
        ("mpn", form.mpn.as_str()),
    ]);
    let id = create_entity(store.as_ref(), EntityKind::Patient, &record).await?;
    Ok(created_message(&id, &form.surname))
}

/// Router serving `GET` and `POST /patient`.
pub fn create_patient_router(store: SharedStore) -> Router {
    Router::new()
        .route("/patient", get(list_patients).post(create_patient))
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::test_utils::test_helpers::{seeded_store, serve};

    fn patient(sex: &str) -> PatientForm {
        PatientForm {
            surname: "Sidorov".into(),
            born_date: "2000-01-01".into(),
            sex: sex.into(),
            mpn: "abc".into(),
        }
    }

    #[test]
    fn validation_rules() {
        assert_eq!(patient("M").validate(), Ok(()));
        assert_eq!(patient("F").validate(), Ok(()));
        assert_eq!(
            patient("X").validate(),
            Err(ApiError::Validation("Sex must be 'M' or 'F'"))
        );
        assert_eq!(
            patient("m").validate(),
            Err(ApiError::Validation("Sex must be 'M' or 'F'"))
        );
        assert_eq!(
            patient("").validate(),
            Err(ApiError::Validation("All fields required"))
        );
    }

    #[tokio::test]
    async fn invalid_sex_is_rejected() {
        let (_store, shared) = seeded_store().await;
        let server = serve(create_patient_router(shared));

        let response = server.post("/patient").form(&patient("X")).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_text("Sex must be 'M' or 'F'");
    }

    #[tokio::test]
    async fn patients_get_sequential_ids() {
        let (_store, shared) = seeded_store().await;
        let server = serve(create_patient_router(shared));

        for expected in 1..=3 {
            let response = server.post("/patient").form(&patient("F")).await;
            response.assert_status_ok();
            response.assert_text(format!("OK: ID {} for Sidorov", expected));
        }
    }
}

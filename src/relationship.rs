//! Doctor to patient associations.
//!
//! Each doctor with at least one linked patient owns a set at
//! `doctor-patient:<doctor_id>` holding patient IDs. Sets are created on the
//! first link and only ever grow.

use serde::{Deserialize, Serialize};

use crate::entity::{DOCTOR_PATIENT_PREFIX, doctor_patient_key, sort_ids};
use crate::records::{fetch_entity, numeric_ids};
use crate::{EntityKind, KeyValueStore, StoreError};

/// Outcome of a link request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The patient is now in the doctor's set (it may already have been).
    Linked,
    /// The doctor or the patient record does not exist; nothing was written.
    MissingEntity,
}

/// The patients linked to one doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorPatients {
    /// The doctor's ID.
    pub doctor_id: String,
    /// Linked patient IDs, numerically ordered when they are all numeric.
    pub patient_ids: Vec<String>,
}

/// Links `patient_id` to `doctor_id` once both records are confirmed to exist.
///
/// Linking an existing pair again changes nothing.
pub async fn link(
    store: &dyn KeyValueStore,
    doctor_id: &str,
    patient_id: &str,
) -> Result<LinkOutcome, StoreError> {
    let patient = fetch_entity(store, EntityKind::Patient, patient_id).await?;
    let doctor = fetch_entity(store, EntityKind::Doctor, doctor_id).await?;
    if patient.is_none() || doctor.is_none() {
        return Ok(LinkOutcome::MissingEntity);
    }
    let added = store
        .add_to_set(&doctor_patient_key(doctor_id), patient_id)
        .await?;
    tracing::debug!(%doctor_id, %patient_id, added, "linked doctor and patient");
    Ok(LinkOutcome::Linked)
}

/// Lists every relationship set, ordered by doctor ID.
pub async fn list_links(store: &dyn KeyValueStore) -> Result<Vec<DoctorPatients>, StoreError> {
    let mut links = Vec::new();
    for doctor_id in numeric_ids(store, DOCTOR_PATIENT_PREFIX).await? {
        let mut patient_ids = store.set_members(&doctor_patient_key(&doctor_id)).await?;
        if patient_ids.is_empty() {
            continue;
        }
        sort_ids(&mut patient_ids);
        links.push(DoctorPatients {
            doctor_id,
            patient_ids,
        });
    }
    Ok(links)
}

/// Returns `(doctor_count, total_link_count)`: how many doctors have a
/// relationship set, and the sum of the sets' sizes.
pub async fn count_links(store: &dyn KeyValueStore) -> Result<(usize, usize), StoreError> {
    let doctor_ids = numeric_ids(store, DOCTOR_PATIENT_PREFIX).await?;
    let mut total = 0;
    for doctor_id in &doctor_ids {
        total += store.set_len(&doctor_patient_key(doctor_id)).await?;
    }
    Ok((doctor_ids.len(), total))
}

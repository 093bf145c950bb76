//! # Hospital Records
//!
//! A small hospital-records web application. HTTP forms create hospitals,
//! doctors, patients and diagnoses, link doctors to patients, and render
//! listings; an analytics surface reports record counts and request volume.
//! Everything is kept in a key-value store (Redis in production).
//!
//! ## Core Concepts
//!
//! ### Records
//! Each entity kind has a fixed field schema. A record is a hash stored under
//! `<kind>:<id>`, where the ID is a positive decimal integer. Records are
//! written once and never updated or deleted.
//!
//! ### IDs
//! Every kind has an auto-ID counter at `<kind>:autoID`. IDs are allocated
//! atomically inside the store, so they are dense and sequential per kind and
//! never handed out twice, however many requests race for them.
//!
//! ### Listings
//! Listings walk the key space with an incremental scan, keep only keys with
//! a numeric suffix, and fetch records in ascending ID order. Records that
//! vanish mid-listing are skipped.
//!
//! ### Relationships
//! A doctor's patients are kept in a set at `doctor-patient:<doctor_id>`.
//! Linking checks that both records exist and is idempotent.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ HTTP Layer (Axum routes, forms, HTML)   │
//! ├─────────────────────────────────────────┤
//! │ Request statistics middleware           │
//! ├─────────────────────────────────────────┤
//! │ Record protocol (IDs, writes, listings) │
//! ├─────────────────────────────────────────┤
//! │ KeyValueStore (Redis or in-memory)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Examples
//!
//! ```rust
//! # use hospital_records::{EntityKind, InMemoryStore, create_entity, init_db, list_entities};
//! # use std::collections::HashMap;
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let store = InMemoryStore::new();
//!     init_db(&store).await.unwrap();
//!
//!     let mut hospital = HashMap::new();
//!     hospital.insert("name".to_string(), "City".to_string());
//!     hospital.insert("address".to_string(), "Main 1".to_string());
//!     let id = create_entity(&store, EntityKind::Hospital, &hospital).await.unwrap();
//!     assert_eq!(id, "1");
//!
//!     let hospitals = list_entities(&store, EntityKind::Hospital).await.unwrap();
//!     assert_eq!(hospitals[0]["name"], "City");
//!     assert_eq!(hospitals[0]["phone"], "");
//! });
//! ```

#![deny(missing_docs)]
mod analytics;
mod diagnosis;
mod doctor;
mod doctor_patient;
mod entity;
mod errors;
mod form;
mod hospital;
mod html;
mod patient;
mod records;
mod redis_store;
mod relationship;
mod router;
mod store;
mod test_utils;

/// Server configuration from command-line options and the environment.
pub mod config;

pub use analytics::{
    EntityCounts, STATS_REQUESTS_KEY, STATS_START_TS_KEY, UsageReport, create_analytics_router,
    entity_counts, now_ts, record_request, track_requests, usage_report,
};
pub use diagnosis::{DiagnosisForm, create_diagnosis_router};
pub use doctor::{DoctorForm, create_doctor_router};
pub use doctor_patient::{DoctorPatientForm, create_doctor_patient_router};
pub use entity::{
    DB_INITIATED_KEY, DOCTOR_PATIENT_PREFIX, EntityKind, EntityKindParseError, Record,
};
pub use errors::{ApiError, INTEGRITY_MESSAGE, STORE_UNAVAILABLE_MESSAGE, StoreError};
pub use hospital::{HospitalForm, create_hospital_router};
pub use patient::{PatientForm, create_patient_router};
pub use records::{
    SCAN_COUNT, allocate_id, count_entities, create_entity, fetch_entity, init_db, list_entities,
    numeric_ids, scan_keys, write_entity,
};
pub use redis_store::RedisStore;
pub use relationship::{DoctorPatients, LinkOutcome, count_links, link, list_links};
pub use router::create_app;
pub use store::{InMemoryStore, KeyValueStore, SharedStore};

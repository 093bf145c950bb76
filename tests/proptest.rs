use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use proptest::prelude::*;

use hospital_records::{
    EntityCounts, InMemoryStore, SharedStore, create_app, entity_counts, init_db,
};

/// Test infrastructure for property testing the HTTP surface
pub struct ApiTestServer {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
}

impl ApiTestServer {
    /// Create a new test server over a fresh, seeded in-memory store
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        init_db(store.as_ref()).await.unwrap();
        let shared: SharedStore = store.clone();
        let server = TestServer::new(create_app(shared, Path::new("static"))).unwrap();
        Self { server, store }
    }
}

/// Property test strategies for generating form input
pub mod strategies {
    use super::*;
    use proptest::string::string_regex;

    /// Strategy for surnames and hospital names
    pub fn name_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[A-Z][a-z]{0,11}").unwrap()
    }

    /// Strategy for the `sex` form field, valid or not
    pub fn sex_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("M".to_string()),
            Just("F".to_string()),
            string_regex(r"[A-Za-z]{0,2}").unwrap(),
        ]
    }

    /// Strategy for the patient IDs linked to one doctor, duplicates included
    pub fn patient_links_strategy(patients: u32) -> impl Strategy<Value = Vec<u32>> {
        proptest::collection::vec(1..=patients, 1..8)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    #[test]
    fn hospital_ids_are_dense(
        names in proptest::collection::vec(strategies::name_strategy(), 1..12)
    ) {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let api = ApiTestServer::new().await;

            for (index, name) in names.iter().enumerate() {
                let response = api.server
                    .post("/hospital")
                    .form(&[("name", name.as_str()), ("address", "Main 1")])
                    .await;
                response.assert_status_ok();
                prop_assert_eq!(response.text(), format!("OK: ID {} for {}", index + 1, name));
            }

            let counts: EntityCounts = api.server.get("/analytics/entities").await.json();
            prop_assert_eq!(counts.hospitals, names.len());

            let page = api.server.get("/hospital").await.text();
            let mut position = 0;
            for name in &names {
                let cell = format!("<tr><td>{}</td>", name);
                let found = page[position..].find(&cell);
                prop_assert!(found.is_some(), "{} missing or out of order", name);
                position += found.unwrap_or(0) + cell.len();
            }
            Ok(())
        }).unwrap()
    }

    #[test]
    fn patient_sex_validation(sex in strategies::sex_strategy()) {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let api = ApiTestServer::new().await;

            let response = api.server
                .post("/patient")
                .form(&[
                    ("surname", "Doe"),
                    ("born_date", "1990-01-01"),
                    ("sex", sex.as_str()),
                    ("mpn", "42"),
                ])
                .await;

            if sex == "M" || sex == "F" {
                response.assert_status_ok();
                prop_assert_eq!(response.text(), "OK: ID 1 for Doe");
            } else if sex.is_empty() {
                response.assert_status(StatusCode::BAD_REQUEST);
                prop_assert_eq!(response.text(), "All fields required");
            } else {
                response.assert_status(StatusCode::BAD_REQUEST);
                prop_assert_eq!(response.text(), "Sex must be 'M' or 'F'");
            }

            let counts = entity_counts(api.store.as_ref()).await.unwrap();
            let expected = usize::from(sex == "M" || sex == "F");
            prop_assert_eq!(counts.patients, expected);
            Ok(())
        }).unwrap()
    }

    #[test]
    fn linking_is_idempotent_and_sorted(
        links in strategies::patient_links_strategy(12)
    ) {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let api = ApiTestServer::new().await;
            api.server
                .post("/doctor")
                .form(&[("surname", "Smith"), ("profession", "Surgeon")])
                .await
                .assert_status_ok();
            for _ in 0..12 {
                api.server
                    .post("/patient")
                    .form(&[("surname", "Doe"), ("born_date", "1990"), ("sex", "F"), ("mpn", "1")])
                    .await
                    .assert_status_ok();
            }

            for patient in &links {
                let patient = patient.to_string();
                api.server
                    .post("/doctor-patient")
                    .form(&[("doctor_ID", "1"), ("patient_ID", patient.as_str())])
                    .await
                    .assert_status_ok();
            }

            let unique: BTreeSet<u32> = links.iter().copied().collect();
            let expected: Vec<String> = unique.iter().map(u32::to_string).collect();
            let row = format!("<tr><td>1</td><td>{}</td></tr>", expected.join(", "));
            let page = api.server.get("/doctor-patient").await.text();
            prop_assert!(page.contains(&row), "expected row {}", row);

            let counts = entity_counts(api.store.as_ref()).await.unwrap();
            prop_assert_eq!(counts.doctor_patient_sets, 1);
            prop_assert_eq!(counts.doctor_patient_links, unique.len());
            Ok(())
        }).unwrap()
    }
}

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A stored hash record: field name to string value.
pub type Record = HashMap<String, String>;

/// Prefix of the per-doctor relationship sets.
pub const DOCTOR_PATIENT_PREFIX: &str = "doctor-patient";

/// Sentinel key guarding the one-time counter seeding.
pub const DB_INITIATED_KEY: &str = "db_initiated";

///////////////////////////////////////////// EntityKind ///////////////////////////////////////////////

/// The kinds of records the application persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A hospital.
    Hospital,
    /// A doctor, optionally attached to a hospital.
    Doctor,
    /// A patient.
    Patient,
    /// A diagnosis for a patient.
    Diagnosis,
}

impl EntityKind {
    /// Every kind, in the order they are seeded and reported.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Hospital,
        EntityKind::Doctor,
        EntityKind::Patient,
        EntityKind::Diagnosis,
    ];

    /// Key prefix shared by the records and the counter of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Hospital => "hospital",
            EntityKind::Doctor => "doctor",
            EntityKind::Patient => "patient",
            EntityKind::Diagnosis => "diagnosis",
        }
    }

    /// Field schema, in display order. Every record carries all of them.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::Hospital => &["name", "address", "phone", "beds_number"],
            EntityKind::Doctor => &["surname", "profession", "hospital_ID"],
            EntityKind::Patient => &["surname", "born_date", "sex", "mpn"],
            EntityKind::Diagnosis => &["patient_ID", "type", "information"],
        }
    }

    /// Key of the auto-ID counter, e.g. `hospital:autoID`.
    pub fn counter_key(self) -> String {
        format!("{}:autoID", self.prefix())
    }

    /// Key of the record with the given ID, e.g. `hospital:3`.
    pub fn record_key(self, id: &str) -> String {
        format!("{}:{}", self.prefix(), id)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.prefix())
    }
}

/// Returned when a string names no known entity kind.
#[derive(Debug, PartialEq, Eq)]
pub struct EntityKindParseError(String);

impl Display for EntityKindParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Unknown entity kind '{}'", self.0)
    }
}

impl std::error::Error for EntityKindParseError {}

impl FromStr for EntityKind {
    type Err = EntityKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.prefix() == s)
            .ok_or_else(|| EntityKindParseError(s.to_string()))
    }
}

/////////////////////////////////////////// Key conventions ////////////////////////////////////////////

/// Relationship set key for a doctor, e.g. `doctor-patient:7`.
pub fn doctor_patient_key(doctor_id: &str) -> String {
    format!("{}:{}", DOCTOR_PATIENT_PREFIX, doctor_id)
}

/// Scan pattern matching every key under `prefix`.
pub fn scan_pattern(prefix: &str) -> String {
    format!("{}:*", prefix)
}

/// True for a non-empty run of ASCII digits.
pub fn is_numeric_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Returns the numeric ID of `key` when it is exactly `<prefix>:<digits>`.
///
/// Keys such as `hospital:autoID` or `hospital:1:extra` share the scan
/// pattern but are not records, so they yield `None`.
pub fn numeric_suffix<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    let (head, tail) = key.split_once(':')?;
    if head != prefix || tail.contains(':') || !is_numeric_token(tail) {
        return None;
    }
    Some(tail)
}

/// Orders two numeric tokens by value without parsing them into a bounded integer.
pub fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sorts tokens numerically when all are numeric, otherwise lexicographically.
pub fn sort_ids(ids: &mut [String]) {
    if ids.iter().all(|id| is_numeric_token(id)) {
        ids.sort_by(|a, b| cmp_numeric(a, b).then_with(|| a.cmp(b)));
    } else {
        ids.sort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_naming_convention() {
        assert_eq!(EntityKind::Hospital.counter_key(), "hospital:autoID");
        assert_eq!(EntityKind::Diagnosis.record_key("12"), "diagnosis:12");
        assert_eq!(doctor_patient_key("3"), "doctor-patient:3");
        assert_eq!(scan_pattern("patient"), "patient:*");
    }

    #[test]
    fn field_counts_match_schema() {
        assert_eq!(EntityKind::Hospital.fields().len(), 4);
        assert_eq!(EntityKind::Doctor.fields().len(), 3);
        assert_eq!(EntityKind::Patient.fields().len(), 4);
        assert_eq!(EntityKind::Diagnosis.fields().len(), 3);
    }

    #[test]
    fn kind_parses_from_prefix() {
        assert_eq!("doctor".parse::<EntityKind>(), Ok(EntityKind::Doctor));
        assert!("nurse".parse::<EntityKind>().is_err());
    }

    #[test]
    fn numeric_suffix_filters_non_records() {
        assert_eq!(numeric_suffix("hospital:12", "hospital"), Some("12"));
        assert_eq!(numeric_suffix("hospital:0", "hospital"), Some("0"));
        assert_eq!(numeric_suffix("hospital:autoID", "hospital"), None);
        assert_eq!(numeric_suffix("hospital:", "hospital"), None);
        assert_eq!(numeric_suffix("hospital:1:x", "hospital"), None);
        assert_eq!(numeric_suffix("hospital:-1", "hospital"), None);
        assert_eq!(numeric_suffix("doctor:1", "hospital"), None);
        assert_eq!(numeric_suffix("hospital", "hospital"), None);
    }

    #[test]
    fn numeric_order_is_by_value() {
        assert_eq!(cmp_numeric("9", "10"), Ordering::Less);
        assert_eq!(cmp_numeric("010", "9"), Ordering::Greater);
        assert_eq!(cmp_numeric("007", "7"), Ordering::Equal);
        assert_eq!(
            cmp_numeric("99999999999999999999999", "100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn sort_ids_numeric_or_lexicographic() {
        let mut ids = vec!["10".to_string(), "2".to_string(), "1".to_string()];
        sort_ids(&mut ids);
        assert_eq!(ids, vec!["1", "2", "10"]);

        let mut mixed = vec!["10".to_string(), "b".to_string(), "2".to_string()];
        sort_ids(&mut mixed);
        assert_eq!(mixed, vec!["10", "2", "b"]);
    }
}

//! Helpers shared by the form-handling resources.

use async_trait::async_trait;
use axum::extract::{Form, FromRequest, Query, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::{ApiError, Record};

/// Form arguments gathered from the query string and the urlencoded body.
///
/// Body arguments follow query arguments and the last value of a repeated
/// name wins. A body that is missing or not urlencoded contributes nothing,
/// so required-field validation reports what is absent instead of the
/// request being rejected before the handler runs.
#[derive(Debug, Clone)]
pub struct FormArgs<T>(pub T);

/// Folds `(name, value)` pairs into `T`, keeping the last value per name.
pub fn from_arguments<T, I>(pairs: I) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (String, String)>,
{
    let mut args = Map::new();
    for (name, value) in pairs {
        args.insert(name, Value::String(value));
    }
    serde_json::from_value(Value::Object(args))
}

#[async_trait]
impl<T, S> FromRequest<S> for FormArgs<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = match Query::<Vec<(String, String)>>::try_from_uri(req.uri()) {
            Ok(Query(pairs)) => pairs,
            Err(rejection) => {
                tracing::debug!(error = %rejection, "ignoring unparseable query string");
                Vec::new()
            }
        };
        let body = match Form::<Vec<(String, String)>>::from_request(req, state).await {
            Ok(Form(pairs)) => pairs,
            Err(rejection) => {
                tracing::debug!(error = %rejection, "treating form body as empty");
                Vec::new()
            }
        };
        from_arguments(query.into_iter().chain(body))
            .map(FormArgs)
            .map_err(|e| {
                tracing::warn!(error = %e, "form arguments do not fit the form");
                ApiError::Internal
            })
    }
}

/// Deserializes a form value with surrounding whitespace removed, so a
/// blank-only value counts as missing.
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

/// Builds a record from `(field, value)` pairs.
pub fn record_of(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .collect()
}

/// Formats the success body shared by every create endpoint.
pub fn created_message(id: &str, label: &str) -> String {
    format!("OK: ID {} for {}", id, label)
}

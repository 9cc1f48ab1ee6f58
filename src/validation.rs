use rocket::serde::json::Json;
use serde::{Deserialize, Deserializer};
use tracing::instrument;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, FieldErrors};

/// Converts `validator` field errors into the `fields` map of an error body.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut error_map = FieldErrors::new();

    for (field, field_errors) in errors.field_errors() {
        let error_messages: Vec<String> = field_errors
            .iter()
            .map(|error| {
                error
                    .message
                    .clone()
                    .unwrap_or_else(|| "Invalid value".into())
                    .to_string()
            })
            .collect();

        error_map.insert(field.to_string(), error_messages);
    }

    error_map
}

pub trait JsonValidateExt<T> {
    fn validated(self) -> Result<T, AppError>;
}

impl<T: Validate + std::fmt::Debug> JsonValidateExt<T> for Json<T> {
    #[instrument(skip_all)]
    fn validated(self) -> Result<T, AppError> {
        let inner = self.into_inner();
        inner
            .validate()
            .map_err(|errors| AppError::InvalidFields(field_errors(&errors)))?;
        Ok(inner)
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies. Use with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Body {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[serde(default, deserialize_with = "double_option")]
        date: Option<Option<String>>,
    }

    #[test]
    fn field_errors_are_collected_per_field() {
        let body: Body = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        let err = Json(body).validated().unwrap_err();
        match err {
            AppError::InvalidFields(fields) => {
                assert_eq!(fields["name"], vec!["name is required".to_string()]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        let absent: Body = serde_json::from_str(r#"{"name": "a"}"#).unwrap();
        assert_eq!(absent.date, None);

        let null: Body = serde_json::from_str(r#"{"name": "a", "date": null}"#).unwrap();
        assert_eq!(null.date, Some(None));

        let set: Body = serde_json::from_str(r#"{"name": "a", "date": "2025-01-01"}"#).unwrap();
        assert_eq!(set.date, Some(Some("2025-01-01".to_string())));
    }
}

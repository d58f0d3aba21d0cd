use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_path_to_error::Segment;

use warden_core::validation::rules;
use warden_core::DomainError;

use crate::app::errors::ApiError;

/// JSON body extractor with API-shaped rejections.
///
/// Unparsable bodies are a 422 `{message}`. Well-formed JSON whose field has
/// the wrong type is a validation error on that field.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;

        serde_path_to_error::deserialize(value)
            .map(Self)
            .map_err(type_error)
    }
}

fn type_error(err: serde_path_to_error::Error<serde_json::Error>) -> ApiError {
    let detail = err.inner().to_string();
    let field = err.path().iter().find_map(|segment| match segment {
        Segment::Map { key } => Some(key.clone()),
        _ => None,
    });

    match field {
        Some(field) => {
            DomainError::field(&field, rules::wrong_type(&field, expected(&detail))).into()
        }
        None => ApiError::MalformedBody(format!(
            "Failed to deserialize the JSON body into the target type: {detail}"
        )),
    }
}

/// Human wording for the type serde expected, taken from its error text.
fn expected(detail: &str) -> &'static str {
    let wanted = detail.rsplit_once("expected ").map_or("", |(_, w)| w);
    if wanted.starts_with("a string") {
        "a string"
    } else if ["i64", "u64", "i32", "u32"].iter().any(|t| wanted.starts_with(t)) {
        "an integer"
    } else {
        "valid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_type_wording() {
        assert_eq!(expected("invalid type: integer `123`, expected a string"), "a string");
        assert_eq!(expected("invalid type: string \"abc\", expected i64"), "an integer");
        assert_eq!(expected("invalid type: map, expected a sequence"), "valid");
    }

    #[test]
    fn wrong_field_type_names_the_field() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Body {
            full_name: Option<String>,
        }

        let err = serde_path_to_error::deserialize::<_, Body>(serde_json::json!({ "full_name": 123 }))
            .unwrap_err();
        let ApiError::Domain(DomainError::Validation(errors)) = type_error(err) else {
            panic!("expected a field validation error");
        };
        assert_eq!(
            errors.get("full_name"),
            Some(&["The full name field must be a string.".to_string()][..])
        );
    }

    #[test]
    fn wrong_root_type_is_malformed() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Body {
            full_name: Option<String>,
        }

        let err = serde_path_to_error::deserialize::<_, Body>(serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(type_error(err), ApiError::MalformedBody(_)));
    }
}

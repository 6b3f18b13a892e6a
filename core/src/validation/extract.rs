//! Pulling raw values out of a request view.

use crate::error::{AppError, AppResult};
use crate::oas::models::ParamLocation;
use crate::request::RequestView;
use crate::validation::compiler::CompiledValidator;
use serde_json::{Map, Value};
use tracing::{debug, error};

impl CompiledValidator {
    /// Collects every declared parameter from its wire location.
    ///
    /// A required parameter that is absent and has no default fails here with
    /// `MissingParameter`, before any type coercion runs. Absent optional
    /// parameters are left out of the map for [`CompiledValidator::validate`]
    /// to default.
    pub fn extract(&self, request: &dyn RequestView) -> AppResult<Map<String, Value>> {
        let mut params = Map::new();

        for spec in self.fields() {
            let Some(location) = spec.location else {
                error!(validator = %self.label(), field = %spec.name, "field has no wire location");
                return Err(AppError::Internal(format!(
                    "'{}' of {} has no location",
                    spec.name,
                    self.label()
                )));
            };
            let raw = match location {
                ParamLocation::Query => request.query(&spec.name),
                ParamLocation::Header => request.header(&spec.name),
                ParamLocation::Path => request.path_param(&spec.name),
                ParamLocation::Cookie => request.cookie(&spec.name),
            };

            match raw {
                Some(value) => {
                    params.insert(spec.name.clone(), Value::String(value.to_string()));
                }
                None if spec.required && spec.default.is_none() => {
                    debug!(validator = %self.label(), field = %spec.name, location = location.as_str(), "required parameter absent");
                    return Err(AppError::MissingParameter(spec.name.clone()));
                }
                None => {}
            }
        }

        Ok(params)
    }
}

/// Decodes a raw request body into a field map.
///
/// A missing or blank body is the empty object. Anything that is not a JSON
/// object is rejected as an invalid `body`, quoting at most
/// [`BODY_PREVIEW_CHARS`] characters of it.
pub fn decode_body(raw: Option<&[u8]>) -> AppResult<Map<String, Value>> {
    let Some(bytes) = raw.filter(|b| !b.iter().all(u8::is_ascii_whitespace)) else {
        return Ok(Map::new());
    };

    let rejected = |shown: &str| AppError::InvalidParameter {
        name: "body".to_string(),
        value: preview(shown),
        expected: "object".to_string(),
    };

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(rejected(&other.to_string())),
        Err(_) => Err(rejected(&String::from_utf8_lossy(bytes))),
    }
}

/// Longest slice of a rejected body echoed back to the caller.
pub const BODY_PREVIEW_CHARS: usize = 64;

fn preview(text: &str) -> String {
    match text.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

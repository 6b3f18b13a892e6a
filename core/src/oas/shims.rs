//! # Operation Shims
//!
//! Deserialization layer between the normalized `serde_json::Value` document
//! and the typed models. Shims accept what OpenAPI allows; conversion into
//! models rejects what this crate cannot compile.

use crate::error::{AppError, AppResult};
use crate::oas::models::{
    BodyField, Operation, ParamLocation, Parameter, PrimitiveType, SecurityRequirement, Verb,
};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

const JSON_MEDIA_TYPE: &str = "application/json";

/// An Operation Object after normalization.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ShimOperation {
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ShimParameter>,
    #[serde(rename = "requestBody")]
    pub request_body: Option<ShimRequestBody>,
    #[serde(default)]
    pub security: Vec<IndexMap<String, Vec<String>>>,
    #[serde(rename = "x-route")]
    pub route: ShimRouteKey,
}

/// Route key injected by normalization.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ShimRouteKey {
    pub pattern: String,
    pub verb: Verb,
}

/// A Parameter Object.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ShimParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub in_loc: String,
    pub required: Option<bool>,
    pub default: Option<Value>,
    pub schema: Option<ShimFieldSchema>,
}

/// Schema of a single primitive field.
#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct ShimFieldSchema {
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub default: Option<Value>,
}

/// A Request Body Object.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ShimRequestBody {
    #[serde(default)]
    pub content: IndexMap<String, ShimMediaType>,
}

/// A Media Type Object.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ShimMediaType {
    pub schema: Option<ShimObjectSchema>,
}

/// The object schema of a request body.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ShimObjectSchema {
    #[serde(rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, ShimFieldSchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ShimOperation {
    /// Parses one normalized operation object.
    pub(crate) fn from_value(value: &Value, pattern: &str, verb: Verb) -> AppResult<Self> {
        serde_json::from_value(value.clone()).map_err(|e| {
            AppError::InvalidContract(format!(
                "Failed to parse operation {} {}: {}",
                verb.as_str().to_uppercase(),
                pattern,
                e
            ))
        })
    }

    /// Converts into the typed model.
    pub(crate) fn into_operation(self) -> AppResult<Operation> {
        let ShimRouteKey { pattern, verb } = self.route;
        let id = self.operation_id.ok_or_else(|| {
            AppError::InvalidContract(format!(
                "Operation {} {} is missing 'operationId'",
                verb.as_str().to_uppercase(),
                pattern
            ))
        })?;

        let parameters = self
            .parameters
            .into_iter()
            .map(|p| p.into_parameter(&id))
            .collect::<AppResult<Vec<_>>>()?;

        let request_body = match self.request_body {
            Some(body) => body.into_fields(&id)?,
            None => Vec::new(),
        };

        let security = self
            .security
            .into_iter()
            .map(|schemes| SecurityRequirement { schemes })
            .collect();

        Ok(Operation {
            id,
            verb,
            route_pattern: pattern,
            tags: self.tags,
            parameters,
            request_body,
            security,
        })
    }
}

impl ShimParameter {
    fn into_parameter(self, operation_id: &str) -> AppResult<Parameter> {
        let location = ParamLocation::parse(&self.in_loc).ok_or_else(|| {
            AppError::InvalidContract(format!(
                "Parameter '{}' of '{}' has unknown location '{}'",
                self.name, operation_id, self.in_loc
            ))
        })?;
        let schema = self.schema.unwrap_or_default();
        let ty = field_type(schema.ty.as_deref(), &self.name, operation_id)?;

        Ok(Parameter {
            name: self.name,
            location,
            ty,
            required: self.required.unwrap_or(true),
            default: self.default.or(schema.default),
        })
    }
}

impl ShimRequestBody {
    fn into_fields(self, operation_id: &str) -> AppResult<Vec<BodyField>> {
        let Some(schema) = self
            .content
            .get(JSON_MEDIA_TYPE)
            .and_then(|media| media.schema.clone())
        else {
            return Ok(Vec::new());
        };

        match schema.ty.as_deref() {
            None | Some("object") => {}
            Some(other) => {
                return Err(AppError::InvalidContract(format!(
                    "requestBody of '{}' must be an object or empty, found '{}'",
                    operation_id, other
                )))
            }
        }

        schema
            .properties
            .into_iter()
            .map(|(name, field)| {
                let ty = field_type(field.ty.as_deref(), &name, operation_id)?;
                Ok(BodyField {
                    required: schema.required.contains(&name),
                    name,
                    ty,
                    default: field.default,
                })
            })
            .collect()
    }
}

/// A missing `type` is treated as `string`.
fn field_type(ty: Option<&str>, field: &str, operation_id: &str) -> AppResult<PrimitiveType> {
    let Some(ty) = ty else {
        return Ok(PrimitiveType::String);
    };
    PrimitiveType::parse(ty).ok_or_else(|| {
        AppError::InvalidContract(format!(
            "Field '{}' of '{}' has unsupported type '{}'",
            field, operation_id, ty
        ))
    })
}

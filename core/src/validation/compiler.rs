//! Data-driven structural validators, compiled once per operation.

use crate::config::ValidationConfig;
use crate::error::{AppError, AppResult};
use crate::oas::models::{Operation, ParamLocation, PrimitiveType};
use crate::validation::coercion::{coerce, BooleanForms};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

/// One field a validator knows about.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Declared primitive type.
    pub ty: PrimitiveType,
    /// Whether absence (with no default) is an error.
    pub required: bool,
    /// Already coerced to `ty`.
    pub default: Option<Value>,
    /// Wire location, for parameter validators only.
    pub location: Option<ParamLocation>,
}

/// A structural validator over a flat field-name to value map.
#[derive(Debug, Clone)]
pub struct CompiledValidator {
    label: String,
    fields: IndexMap<String, FieldSpec>,
    booleans: BooleanForms,
    reject_unknown: bool,
}

impl CompiledValidator {
    /// Builds a validator, coercing every default to its field's type.
    ///
    /// Two fields with the same name are an `InvalidContract`, even when they
    /// come from different parameter locations.
    ///
    /// `label` identifies the validator in logs and errors
    /// (e.g. `getWidget#parameters`).
    pub fn new(
        label: impl Into<String>,
        fields: Vec<FieldSpec>,
        booleans: BooleanForms,
        reject_unknown: bool,
    ) -> AppResult<Self> {
        let label = label.into();
        let mut by_name = IndexMap::new();

        for mut field in fields {
            if let Some(default) = field.default.take() {
                let coerced = coerce(&default, field.ty, booleans).ok_or_else(|| {
                    AppError::InvalidContract(format!(
                        "{}: default {} of '{}' is not a {}",
                        label, default, field.name, field.ty
                    ))
                })?;
                field.default = Some(coerced);
            }
            // Output maps are keyed by name alone, so a name may appear once.
            if by_name.contains_key(&field.name) {
                return Err(AppError::InvalidContract(format!(
                    "{}: '{}' is declared more than once",
                    label, field.name
                )));
            }
            by_name.insert(field.name.clone(), field);
        }

        Ok(Self {
            label,
            fields: by_name,
            booleans,
            reject_unknown,
        })
    }

    /// Name used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Validates `blob` and, on success, replaces its contents with the coerced
    /// and defaulted values.
    ///
    /// Reports only the first failure, walking fields in declaration order.
    /// `null` counts as absent. On failure `blob` is left untouched.
    pub fn validate(&self, blob: &mut Map<String, Value>) -> AppResult<()> {
        debug!(validator = %self.label, "started validation");
        let mut loaded = Map::new();

        for spec in self.fields.values() {
            match blob.get(&spec.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    let coerced = coerce(value, spec.ty, self.booleans).ok_or_else(|| {
                        debug!(validator = %self.label, field = %spec.name, "failed validation");
                        AppError::invalid_parameter(&spec.name, value, spec.ty.as_str())
                    })?;
                    loaded.insert(spec.name.clone(), coerced);
                }
                None => match &spec.default {
                    Some(default) => {
                        loaded.insert(spec.name.clone(), default.clone());
                    }
                    None if spec.required => {
                        debug!(validator = %self.label, field = %spec.name, "failed validation");
                        return Err(AppError::MissingParameter(spec.name.clone()));
                    }
                    None => {}
                },
            }
        }

        if self.reject_unknown {
            if let Some(unknown) = blob.keys().find(|k| !self.fields.contains_key(*k)) {
                debug!(validator = %self.label, field = %unknown, "failed validation");
                return Err(AppError::UnknownParameter(unknown.clone()));
            }
        }

        debug!(validator = %self.label, "succeeded validation");
        *blob = loaded;
        Ok(())
    }
}

/// The two validators of one operation.
#[derive(Debug, Clone)]
pub struct OperationValidators {
    /// Over extracted parameters.
    pub params: CompiledValidator,
    /// Over the decoded request body.
    pub body: CompiledValidator,
}

impl OperationValidators {
    /// Compiles both validators for `operation`.
    pub fn compile(operation: &Operation, config: &ValidationConfig) -> AppResult<Self> {
        let param_fields = operation
            .parameters
            .iter()
            .map(|p| FieldSpec {
                name: p.name.clone(),
                ty: p.ty,
                required: p.required,
                default: p.default.clone(),
                location: Some(p.location),
            })
            .collect();
        let param_booleans = if config.lenient_booleans {
            BooleanForms::Lenient
        } else {
            BooleanForms::TrueFalse
        };
        let params = CompiledValidator::new(
            format!("{}#parameters", operation.id),
            param_fields,
            param_booleans,
            false,
        )?;

        let body_fields = operation
            .request_body
            .iter()
            .map(|f| FieldSpec {
                name: f.name.clone(),
                ty: f.ty,
                required: f.required,
                default: f.default.clone(),
                location: None,
            })
            .collect();
        let body = CompiledValidator::new(
            format!("{}#body", operation.id),
            body_fields,
            BooleanForms::JsonOnly,
            config.reject_unknown_body_fields,
        )?;

        debug!(operation = %operation.id, "compiled validators");
        Ok(Self { params, body })
    }
}

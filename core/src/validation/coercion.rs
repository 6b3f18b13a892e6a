//! Primitive type coercion.

use crate::oas::models::PrimitiveType;
use serde_json::{Number, Value};

/// Which spellings count as a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanForms {
    /// Only JSON `true` / `false` (request bodies).
    JsonOnly,
    /// JSON booleans plus the strings `true` / `false`.
    TrueFalse,
    /// Also `1/0`, `yes/no`, `on/off`, `t/f`, `y/n`, case-insensitive.
    Lenient,
}

/// Converts `value` to `ty`, or returns `None` if it does not fit.
///
/// `null` never coerces; callers treat it as absent before getting here.
pub(crate) fn coerce(value: &Value, ty: PrimitiveType, booleans: BooleanForms) -> Option<Value> {
    match ty {
        PrimitiveType::Boolean => coerce_bool(value, booleans).map(Value::Bool),
        PrimitiveType::Integer => coerce_integer(value).map(Value::from),
        PrimitiveType::Number => coerce_number(value).map(Value::Number),
        PrimitiveType::String => value.as_str().map(|s| Value::String(s.to_string())),
    }
}

fn coerce_bool(value: &Value, booleans: BooleanForms) -> Option<bool> {
    if let Value::Bool(b) = value {
        return Some(*b);
    }
    let text = value.as_str()?;
    match booleans {
        BooleanForms::JsonOnly => None,
        BooleanForms::TrueFalse => match text {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        BooleanForms::Lenient => match text.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
            "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
            _ => None,
        },
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
        }),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            if let Ok(i) = s.parse::<i64>() {
                return Some(Number::from(i));
            }
            s.parse::<f64>().ok().and_then(Number::from_f64)
        }
        _ => None,
    }
}

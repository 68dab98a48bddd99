//! Navigation helpers over decoded JSON bodies.

use limno_data::error::{LimnoError, Result};
use serde_json::Value;

/// Follow `path` through nested objects.
pub fn field<'a>(value: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().try_fold(value, |current, key| {
        current
            .get(key)
            .ok_or_else(|| LimnoError::MissingField(path.join(".")))
    })
}

fn number(value: &Value, path: &str) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| LimnoError::MissingField(format!("{} (not representable)", path))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| LimnoError::MissingField(format!("{} (not numeric: {})", path, s))),
        _ => Err(LimnoError::MissingField(format!("{} (expected a number)", path))),
    }
}

/// A flat numeric array; `null` entries become NaN.
pub fn numbers(value: &Value, path: &str) -> Result<Vec<f64>> {
    let items = value
        .as_array()
        .ok_or_else(|| LimnoError::MissingField(format!("{} (expected an array)", path)))?;
    items.iter().map(|v| number(v, path)).collect()
}

/// A numeric array that may be 1-D or 2-D; 1-D input becomes a single
/// column (`rows[i] == [v_i]`).
pub fn number_rows(value: &Value, path: &str) -> Result<Vec<Vec<f64>>> {
    let items = value
        .as_array()
        .ok_or_else(|| LimnoError::MissingField(format!("{} (expected an array)", path)))?;
    items
        .iter()
        .map(|row| match row {
            Value::Array(_) => numbers(row, path),
            scalar => Ok(vec![number(scalar, path)?]),
        })
        .collect()
}

pub fn strings(value: &Value, path: &str) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| LimnoError::MissingField(format!("{} (expected an array)", path)))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| LimnoError::MissingField(format!("{} (expected strings)", path)))
        })
        .collect()
}

//! JSON bridge between engine values and `serde_json`
//!
//! Conversion to JSON follows `JSON.stringify`: `undefined`, functions and
//! symbols are skipped as object properties and become `null` inside
//! arrays; non-finite numbers become `null`.

use otter_jsi_sys::{Engine, RawValue};
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::error::{JsiError, JsiResult};
use crate::kind::{ValueKind, classify};
use crate::runtime::fill_protected;
use crate::value::NativeValue;

/// Largest integer that round-trips through an `f64`
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl NativeValue {
    /// Convert to a JSON value
    pub fn to_json(&self) -> JsiResult<Value> {
        let runtime = self.runtime()?;
        let max_depth = runtime.config().max_json_depth;
        let kind = self.kind()?;
        runtime
            .write(|engine| to_json_value(engine, self.raw(), 0, max_depth))?
            .ok_or_else(|| JsiError::conversion(format!("{} has no JSON representation", kind)))
    }

    /// Deserialize from JSON to Rust type
    pub fn deserialize<T: DeserializeOwned>(&self) -> JsiResult<T> {
        let json = self.to_json()?;
        Ok(serde_json::from_value(json)?)
    }
}

fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Run `f` on a property value, keeping it protected meanwhile
fn with_property<T>(
    engine: &mut dyn Engine,
    object: RawValue,
    key: &str,
    f: impl FnOnce(&mut dyn Engine, RawValue) -> JsiResult<T>,
) -> JsiResult<T> {
    let value = engine.get_property(object, key)?;
    engine.protect(value)?;
    let result = f(engine, value);
    engine.unprotect(value)?;
    result
}

/// `None` means "no representation" (undefined, function, symbol)
fn to_json_value(
    engine: &mut dyn Engine,
    raw: RawValue,
    depth: usize,
    max_depth: usize,
) -> JsiResult<Option<Value>> {
    let json = match classify(engine, raw)? {
        ValueKind::Undefined | ValueKind::Symbol | ValueKind::Function => None,
        ValueKind::Null => Some(Value::Null),
        ValueKind::Bool => Some(Value::Bool(engine.get_bool(raw)?)),
        ValueKind::Number => Some(number_to_json(engine.get_number(raw)?)),
        ValueKind::String => Some(Value::String(engine.get_string(raw)?)),
        ValueKind::Object => {
            if depth >= max_depth {
                return Err(JsiError::conversion(format!(
                    "object nesting exceeds {} levels",
                    max_depth
                )));
            }
            if engine.is_array(raw)? {
                let length = with_property(engine, raw, "length", |engine, len| {
                    Ok(engine.get_number(len)? as u32)
                })?;
                let mut items = Vec::with_capacity(length as usize);
                for index in 0..length {
                    let item = with_property(engine, raw, &index.to_string(), |engine, item| {
                        to_json_value(engine, item, depth + 1, max_depth)
                    })?;
                    items.push(item.unwrap_or(Value::Null));
                }
                Some(Value::Array(items))
            } else {
                let mut map = Map::new();
                for key in engine.property_names(raw)? {
                    let item = with_property(engine, raw, &key, |engine, item| {
                        to_json_value(engine, item, depth + 1, max_depth)
                    })?;
                    if let Some(item) = item {
                        map.insert(key, item);
                    }
                }
                Some(Value::Object(map))
            }
        }
    };
    Ok(json)
}

/// Build an engine value from JSON, protected on behalf of the caller.
///
/// If construction fails partway, everything built so far is released.
pub(crate) fn from_json_value(engine: &mut dyn Engine, json: &Value) -> JsiResult<RawValue> {
    let raw = match json {
        Value::Null => engine.make_null()?,
        Value::Bool(b) => engine.make_bool(*b)?,
        Value::Number(n) => {
            let n = n
                .as_f64()
                .ok_or_else(|| JsiError::conversion(format!("number {} is out of range", n)))?;
            engine.make_number(n)?
        }
        Value::String(s) => engine.make_string(s)?,
        Value::Array(items) => {
            let array = engine.make_array()?;
            return fill_protected(engine, array, |engine| {
                for (index, item) in items.iter().enumerate() {
                    attach(engine, array, &index.to_string(), item)?;
                }
                Ok(())
            });
        }
        Value::Object(map) => {
            let object = engine.make_object()?;
            return fill_protected(engine, object, |engine| {
                for (key, item) in map {
                    attach(engine, object, key, item)?;
                }
                Ok(())
            });
        }
    };
    engine.protect(raw)?;
    Ok(raw)
}

/// Build `json` and store it under `key`; the container keeps the only protection
fn attach(engine: &mut dyn Engine, container: RawValue, key: &str, json: &Value) -> JsiResult<()> {
    let item = from_json_value(engine, json)?;
    let stored = engine.set_property(container, key, item);
    engine.unprotect(item)?;
    Ok(stored?)
}

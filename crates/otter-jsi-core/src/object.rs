//! Object view with property access

use crate::error::{JsiError, JsiResult};
use crate::kind::ValueKind;
use crate::value::NativeValue;

/// A value known to be an object (functions and arrays included)
///
/// Provides property access and array helpers. Values read out of the
/// object come back as new protected handles.
#[derive(Debug)]
pub struct JsObject {
    value: NativeValue,
}

impl JsObject {
    pub(crate) fn new(value: NativeValue) -> Self {
        Self { value }
    }

    pub fn as_value(&self) -> &NativeValue {
        &self.value
    }

    pub fn into_value(self) -> NativeValue {
        self.value
    }

    /// Check if the object is callable
    pub fn is_function(&self) -> JsiResult<bool> {
        self.value.is_function()
    }

    /// Check if the object is an array
    pub fn is_array(&self) -> JsiResult<bool> {
        self.value.is_array()
    }

    /// Get a property by name; missing properties read as `undefined`
    pub fn get(&self, key: &str) -> JsiResult<NativeValue> {
        self.value
            .derive(|engine, raw| Ok(engine.get_property(raw, key)?))
    }

    /// Set a property by name
    pub fn set(&self, key: &str, value: &NativeValue) -> JsiResult<()> {
        let item = value.raw_in(self.value.context_id())?;
        self.value
            .write(|engine, raw| Ok(engine.set_property(raw, key, item)?))
    }

    /// Check if a property exists
    pub fn has(&self, key: &str) -> JsiResult<bool> {
        self.value
            .read(|engine, raw| Ok(engine.has_property(raw, key)?))
    }

    /// Delete a property, returning whether it existed
    pub fn delete(&self, key: &str) -> JsiResult<bool> {
        self.value
            .write(|engine, raw| Ok(engine.delete_property(raw, key)?))
    }

    /// Own enumerable property names in insertion order
    pub fn keys(&self) -> JsiResult<Vec<String>> {
        self.value
            .read(|engine, raw| Ok(engine.property_names(raw)?))
    }

    /// Array length (the `length` property)
    pub fn length(&self) -> JsiResult<u32> {
        let length = self.get("length")?;
        match length.kind()? {
            ValueKind::Number => Ok(length.as_number()? as u32),
            actual => Err(JsiError::type_mismatch(ValueKind::Number, actual)),
        }
    }

    /// Get array element by index
    pub fn get_index(&self, index: u32) -> JsiResult<NativeValue> {
        self.get(&index.to_string())
    }

    /// Set array element by index
    pub fn set_index(&self, index: u32, value: &NativeValue) -> JsiResult<()> {
        self.set(&index.to_string(), value)
    }
}

//! Function view

use crate::error::{JsiError, JsiResult};
use crate::kind::ValueKind;
use crate::object::JsObject;
use crate::value::NativeValue;

/// A value known to be callable
#[derive(Debug)]
pub struct JsFunction {
    value: NativeValue,
}

impl JsFunction {
    pub(crate) fn new(value: NativeValue) -> Self {
        Self { value }
    }

    pub fn as_value(&self) -> &NativeValue {
        &self.value
    }

    pub fn into_value(self) -> NativeValue {
        self.value
    }

    /// Object view of the function (for its properties)
    pub fn as_object(&self) -> JsiResult<JsObject> {
        Ok(JsObject::new(self.value.try_clone()?))
    }

    /// The function's `name` property
    pub fn name(&self) -> JsiResult<String> {
        let name = self.as_object()?.get("name")?;
        match name.kind()? {
            ValueKind::String => name.as_string(),
            ValueKind::Undefined => Ok(String::new()),
            actual => Err(JsiError::type_mismatch(ValueKind::String, actual)),
        }
    }

    /// Call with an optional receiver (`undefined` when `None`)
    ///
    /// A JS exception thrown by the callee surfaces as `EngineFailure`.
    pub fn call(&self, this: Option<&NativeValue>, args: &[&NativeValue]) -> JsiResult<NativeValue> {
        let context = self.value.context_id();
        let this = this.map(|value| value.raw_in(context)).transpose()?;
        let args = args
            .iter()
            .map(|arg| arg.raw_in(context))
            .collect::<JsiResult<Vec<_>>>()?;

        self.value.derive(|engine, raw| {
            let this = match this {
                Some(this) => this,
                None => engine.make_undefined()?,
            };
            Ok(engine.call(raw, this, &args)?)
        })
    }
}

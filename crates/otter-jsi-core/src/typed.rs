//! Typed accessors and the classified value façade
//!
//! Accessors never coerce. Each checks the value's kind first and fails
//! with `TypeMismatch` when it does not match, so callers are expected to
//! branch on [`NativeValue::kind`] (or match on [`TypedValue`]) before
//! reading.

use otter_jsi_sys::{Engine, RawValue};

use crate::error::{JsiError, JsiResult};
use crate::function::JsFunction;
use crate::kind::{ValueKind, classify};
use crate::object::JsObject;
use crate::symbol::JsSymbol;
use crate::value::NativeValue;

/// A value resolved to exactly one kind together with its typed payload
#[derive(Debug)]
pub enum TypedValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Symbol(JsSymbol),
    String(String),
    Function(JsFunction),
    Object(JsObject),
}

impl TypedValue {
    /// Kind this value was classified as
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Undefined => ValueKind::Undefined,
            TypedValue::Null => ValueKind::Null,
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Number(_) => ValueKind::Number,
            TypedValue::Symbol(_) => ValueKind::Symbol,
            TypedValue::String(_) => ValueKind::String,
            TypedValue::Function(_) => ValueKind::Function,
            TypedValue::Object(_) => ValueKind::Object,
        }
    }
}

/// Read a primitive payload, leaving handle-backed kinds to the caller
fn read_primitive(
    engine: &dyn Engine,
    raw: RawValue,
) -> JsiResult<(ValueKind, Option<TypedValue>)> {
    let kind = classify(engine, raw)?;
    let primitive = match kind {
        ValueKind::Undefined => Some(TypedValue::Undefined),
        ValueKind::Null => Some(TypedValue::Null),
        ValueKind::Bool => Some(TypedValue::Bool(engine.get_bool(raw)?)),
        ValueKind::Number => Some(TypedValue::Number(engine.get_number(raw)?)),
        ValueKind::String => Some(TypedValue::String(engine.get_string(raw)?)),
        ValueKind::Symbol | ValueKind::Function | ValueKind::Object => None,
    };
    Ok((kind, primitive))
}

fn wrap_handle(kind: ValueKind, handle: NativeValue) -> TypedValue {
    match kind {
        ValueKind::Symbol => TypedValue::Symbol(JsSymbol::new(handle)),
        ValueKind::Function => TypedValue::Function(JsFunction::new(handle)),
        _ => TypedValue::Object(JsObject::new(handle)),
    }
}

impl NativeValue {
    /// Classify once and read through the matching accessor
    pub fn typed(&self) -> JsiResult<TypedValue> {
        let (kind, primitive) = self.read(read_primitive)?;
        match primitive {
            Some(value) => Ok(value),
            None => Ok(wrap_handle(kind, self.try_clone()?)),
        }
    }

    /// Like [`typed`](Self::typed), reusing this handle for object kinds
    pub fn into_typed(self) -> JsiResult<TypedValue> {
        let (kind, primitive) = self.read(read_primitive)?;
        match primitive {
            Some(value) => Ok(value),
            None => Ok(wrap_handle(kind, self)),
        }
    }

    /// Verify the value is `expected` and read it in the same engine borrow
    fn read_as<T>(
        &self,
        expected: ValueKind,
        f: impl FnOnce(&dyn Engine, RawValue) -> JsiResult<T>,
    ) -> JsiResult<T> {
        self.read(|engine, raw| {
            let actual = classify(engine, raw)?;
            if actual != expected {
                return Err(JsiError::type_mismatch(expected, actual));
            }
            f(engine, raw)
        })
    }

    fn expect_kind(&self, accepted: &[ValueKind], expected: ValueKind) -> JsiResult<()> {
        let actual = self.kind()?;
        if accepted.contains(&actual) {
            Ok(())
        } else {
            Err(JsiError::type_mismatch(expected, actual))
        }
    }

    pub fn as_bool(&self) -> JsiResult<bool> {
        self.read_as(ValueKind::Bool, |engine, raw| Ok(engine.get_bool(raw)?))
    }

    pub fn as_number(&self) -> JsiResult<f64> {
        self.read_as(ValueKind::Number, |engine, raw| Ok(engine.get_number(raw)?))
    }

    pub fn as_string(&self) -> JsiResult<String> {
        self.read_as(ValueKind::String, |engine, raw| Ok(engine.get_string(raw)?))
    }

    pub fn as_symbol(&self) -> JsiResult<JsSymbol> {
        self.expect_kind(&[ValueKind::Symbol], ValueKind::Symbol)?;
        Ok(JsSymbol::new(self.try_clone()?))
    }

    /// Object view of the value; functions are objects too
    pub fn as_object(&self) -> JsiResult<JsObject> {
        self.expect_kind(&[ValueKind::Object, ValueKind::Function], ValueKind::Object)?;
        Ok(JsObject::new(self.try_clone()?))
    }

    pub fn as_function(&self) -> JsiResult<JsFunction> {
        self.expect_kind(&[ValueKind::Function], ValueKind::Function)?;
        Ok(JsFunction::new(self.try_clone()?))
    }
}

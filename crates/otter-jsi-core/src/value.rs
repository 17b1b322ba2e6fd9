//! Native value handle bound to its owning runtime
//!
//! A [`NativeValue`] pairs a [`RawValue`] with a weak association to the
//! runtime that minted it. The value is protected for as long as the handle
//! exists and unprotected when it drops. Once the runtime is torn down every
//! operation reports `InvalidContext` rather than reaching into freed engine
//! state.

use std::fmt;
use std::rc::{Rc, Weak};

use otter_jsi_sys::{ContextId, Engine, RawValue};
use tracing::{trace, warn};

use crate::error::{JsiError, JsiResult};
use crate::runtime::{Runtime, RuntimeInner};

/// A JavaScript value with automatic GC protection
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync` because JavaScript values are tied to
/// their runtime's thread.
pub struct NativeValue {
    raw: RawValue,
    runtime: Weak<RuntimeInner>,
}

impl NativeValue {
    /// Bind a raw engine value to its runtime.
    ///
    /// This is the boundary constructor: a missing (`None`) context, or a
    /// raw value minted by a different context, fails with
    /// `InvalidContext`. The value is protected until the handle drops.
    pub fn from_raw(context: Option<&Runtime>, raw: RawValue) -> JsiResult<Self> {
        let runtime = context.ok_or_else(|| JsiError::invalid_context("null context"))?;
        let inner = runtime.inner();
        if raw.context() != inner.id() {
            return Err(JsiError::invalid_context(format!(
                "value from context {} cannot be bound to context {}",
                raw.context(),
                inner.id()
            )));
        }
        inner.write(|engine| Ok(engine.protect(raw)?))?;
        Ok(Self::adopt(inner, raw))
    }

    /// Wrap a raw value that has already been protected on our behalf
    pub(crate) fn adopt(runtime: &Rc<RuntimeInner>, raw: RawValue) -> Self {
        Self {
            raw,
            runtime: Rc::downgrade(runtime),
        }
    }

    /// Get the raw value reference
    pub fn raw(&self) -> RawValue {
        self.raw
    }

    /// Context the value belongs to
    pub fn context_id(&self) -> ContextId {
        self.raw.context()
    }

    /// Check whether the owning runtime still exists
    pub fn is_alive(&self) -> bool {
        self.runtime.strong_count() > 0
    }

    pub(crate) fn runtime(&self) -> JsiResult<Rc<RuntimeInner>> {
        self.runtime
            .upgrade()
            .ok_or_else(|| JsiError::invalid_context("runtime has been destroyed"))
    }

    /// Raw reference, checked to be usable inside `context`
    pub(crate) fn raw_in(&self, context: ContextId) -> JsiResult<RawValue> {
        self.runtime()?;
        if self.context_id() != context {
            return Err(JsiError::invalid_context(format!(
                "value from context {} used in context {}",
                self.context_id(),
                context
            )));
        }
        Ok(self.raw)
    }

    pub(crate) fn read<T>(
        &self,
        f: impl FnOnce(&dyn Engine, RawValue) -> JsiResult<T>,
    ) -> JsiResult<T> {
        let runtime = self.runtime()?;
        runtime.read(|engine| f(engine, self.raw))
    }

    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&mut dyn Engine, RawValue) -> JsiResult<T>,
    ) -> JsiResult<T> {
        let runtime = self.runtime()?;
        runtime.write(|engine| f(engine, self.raw))
    }

    /// Run `f` and wrap the value it produces in a new handle
    pub(crate) fn derive(
        &self,
        f: impl FnOnce(&mut dyn Engine, RawValue) -> JsiResult<RawValue>,
    ) -> JsiResult<NativeValue> {
        let runtime = self.runtime()?;
        let raw = runtime.write(|engine| {
            let raw = f(engine, self.raw)?;
            engine.protect(raw)?;
            Ok(raw)
        })?;
        Ok(Self::adopt(&runtime, raw))
    }

    pub fn is_undefined(&self) -> JsiResult<bool> {
        self.read(|engine, raw| Ok(engine.is_undefined(raw)?))
    }

    pub fn is_null(&self) -> JsiResult<bool> {
        self.read(|engine, raw| Ok(engine.is_null(raw)?))
    }

    pub fn is_bool(&self) -> JsiResult<bool> {
        self.read(|engine, raw| Ok(engine.is_bool(raw)?))
    }

    pub fn is_number(&self) -> JsiResult<bool> {
        self.read(|engine, raw| Ok(engine.is_number(raw)?))
    }

    pub fn is_symbol(&self) -> JsiResult<bool> {
        self.read(|engine, raw| Ok(engine.is_symbol(raw)?))
    }

    pub fn is_string(&self) -> JsiResult<bool> {
        self.read(|engine, raw| Ok(engine.is_string(raw)?))
    }

    pub fn is_function(&self) -> JsiResult<bool> {
        self.read(|engine, raw| Ok(engine.is_function(raw)?))
    }

    /// True for every object, functions and arrays included
    pub fn is_object(&self) -> JsiResult<bool> {
        self.read(|engine, raw| Ok(engine.is_object(raw)?))
    }

    pub fn is_array(&self) -> JsiResult<bool> {
        self.read(|engine, raw| Ok(engine.is_array(raw)?))
    }

    /// Take another protection on the same value
    pub fn try_clone(&self) -> JsiResult<Self> {
        let runtime = self.runtime()?;
        runtime.write(|engine| Ok(engine.protect(self.raw)?))?;
        Ok(Self::adopt(&runtime, self.raw))
    }

    /// JS strict equality (`===`)
    ///
    /// Values from different runtimes are never equal.
    pub fn strict_equals(&self, other: &NativeValue) -> JsiResult<bool> {
        other.runtime()?;
        if other.context_id() != self.context_id() {
            self.runtime()?;
            return Ok(false);
        }
        self.read(|engine, raw| Ok(engine.strict_equals(raw, other.raw)?))
    }

    /// Explicit `String(value)` coercion.
    ///
    /// Unlike [`as_string`](Self::as_string) this accepts every kind except
    /// symbols, which throw a `TypeError` as they do in JS.
    pub fn to_js_string(&self) -> JsiResult<String> {
        self.read(|engine, raw| Ok(engine.to_string_copy(raw)?))
    }
}

impl Drop for NativeValue {
    fn drop(&mut self) {
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };
        match runtime.write(|engine| Ok(engine.unprotect(self.raw)?)) {
            Ok(()) => {}
            Err(JsiError::RuntimeBusy) => {
                warn!(value = ?self.raw, "engine busy, value stays protected");
            }
            Err(err) => {
                trace!(value = ?self.raw, error = %err, "unprotect failed");
            }
        }
    }
}

impl fmt::Debug for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Ok(kind) => write!(f, "NativeValue({}, {:?})", kind, self.raw),
            Err(_) => write!(f, "NativeValue(<invalid>, {:?})", self.raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuntimeConfig;

    #[test]
    fn test_null_context_rejected() {
        let runtime = Runtime::default();
        let raw = runtime.enter().number(1.0).unwrap().raw();
        let err = NativeValue::from_raw(None, raw).unwrap_err();
        assert!(matches!(err, JsiError::InvalidContext { .. }));
    }

    #[test]
    fn test_foreign_raw_rejected() {
        let a = Runtime::default();
        let b = Runtime::default();
        let value = a.enter().number(1.0).unwrap();
        let err = b.enter().wrap(value.raw()).unwrap_err();
        assert!(err.to_string().contains("cannot be bound"));
    }

    #[test]
    fn test_predicates() {
        let runtime = Runtime::default();
        let scope = runtime.enter();
        let arr = scope.array(&[]).unwrap();
        assert!(arr.is_array().unwrap());
        assert!(arr.is_object().unwrap());
        assert!(!arr.is_function().unwrap());

        let n = scope.number(3.0).unwrap();
        assert!(n.is_number().unwrap());
        assert!(!n.is_object().unwrap());
    }

    #[test]
    fn test_try_clone_outlives_original() {
        let runtime = Runtime::default();
        let scope = runtime.enter();
        let original = scope.string("kept").unwrap();
        let copy = original.try_clone().unwrap();
        drop(original);
        assert_eq!(copy.as_string().unwrap(), "kept");
    }

    #[test]
    fn test_strict_equals_across_runtimes() {
        let a = Runtime::default();
        let b = Runtime::default();
        let x = a.enter().number(1.0).unwrap();
        let y = b.enter().number(1.0).unwrap();
        let z = a.enter().number(1.0).unwrap();
        assert!(!x.strict_equals(&y).unwrap());
        assert!(x.strict_equals(&z).unwrap());
    }

    #[test]
    fn test_to_js_string() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let scope = runtime.enter();
        assert_eq!(scope.number(42.0).unwrap().to_js_string().unwrap(), "42");
        assert_eq!(scope.number(1e21).unwrap().to_js_string().unwrap(), "1e+21");
        assert_eq!(scope.number(1e-7).unwrap().to_js_string().unwrap(), "1e-7");
        assert_eq!(scope.null().unwrap().to_js_string().unwrap(), "null");
        assert_eq!(scope.object().unwrap().to_js_string().unwrap(), "[object Object]");
        assert!(scope.symbol(Some("s")).unwrap().to_js_string().is_err());
    }

    #[test]
    fn test_debug_reports_kind() {
        let runtime = Runtime::default();
        let value = runtime.enter().boolean(true).unwrap();
        assert!(format!("{:?}", value).starts_with("NativeValue(bool"));
        drop(runtime);
        assert!(format!("{:?}", value).contains("<invalid>"));
    }
}

//! Runtime ownership and the scope token used to mint handles
//!
//! A [`Runtime`] is the only strong owner of its engine. Handles keep a weak
//! association, so tearing the runtime down invalidates every handle at
//! once without the caller tracking them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use otter_jsi_sys::{ContextId, Engine, EngineResult, HostFunction, RawValue, SlotEngine};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::RuntimeConfig;
use crate::error::{JsiError, JsiResult};
use crate::json::from_json_value;
use crate::value::NativeValue;

pub(crate) struct RuntimeInner {
    id: ContextId,
    config: RuntimeConfig,
    engine: RefCell<Box<dyn Engine>>,
}

impl RuntimeInner {
    pub(crate) fn id(&self) -> ContextId {
        self.id
    }

    pub(crate) fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run `f` with shared access to the engine
    pub(crate) fn read<T>(&self, f: impl FnOnce(&dyn Engine) -> JsiResult<T>) -> JsiResult<T> {
        let engine = self
            .engine
            .try_borrow()
            .map_err(|_| JsiError::RuntimeBusy)?;
        f(&**engine)
    }

    /// Run `f` with exclusive access to the engine
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&mut dyn Engine) -> JsiResult<T>,
    ) -> JsiResult<T> {
        let mut engine = self
            .engine
            .try_borrow_mut()
            .map_err(|_| JsiError::RuntimeBusy)?;
        f(&mut **engine)
    }
}

/// Protect a freshly made container and fill it.
///
/// On failure the container is unprotected again, which releases it along
/// with everything `fill` already stored in it. On success the caller owns
/// the protection.
pub(crate) fn fill_protected(
    engine: &mut dyn Engine,
    container: RawValue,
    fill: impl FnOnce(&mut dyn Engine) -> JsiResult<()>,
) -> JsiResult<RawValue> {
    engine.protect(container)?;
    if let Err(err) = fill(engine) {
        if let Err(cleanup) = engine.unprotect(container) {
            trace!(value = ?container, error = %cleanup, "partial value not released");
        }
        return Err(err);
    }
    Ok(container)
}

impl Drop for RuntimeInner {
    fn drop(&mut self) {
        debug!(context = %self.id, name = %self.config.name, "runtime torn down");
    }
}

/// Owner of one engine instance.
///
/// `Runtime` is `!Send` and `!Sync`: the engine may only be touched from the
/// thread that created it. All values minted through its [`Scope`] become
/// invalid when it is dropped.
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Create a runtime backed by a [`SlotEngine`]
    pub fn new(config: RuntimeConfig) -> Self {
        let engine = SlotEngine::with_capacity(config.max_values);
        Self::with_engine(Box::new(engine), config)
    }

    /// Create a runtime around an existing engine
    pub fn with_engine(engine: Box<dyn Engine>, config: RuntimeConfig) -> Self {
        let id = engine.context_id();
        debug!(context = %id, name = %config.name, "runtime created");
        Self {
            inner: Rc::new(RuntimeInner {
                id,
                config,
                engine: RefCell::new(engine),
            }),
        }
    }

    /// Identity of the owned engine context
    pub fn context_id(&self) -> ContextId {
        self.inner.id()
    }

    /// Get the configuration
    pub fn config(&self) -> &RuntimeConfig {
        self.inner.config()
    }

    /// Enter the runtime, obtaining the token that creates handles
    pub fn enter(&self) -> Scope<'_> {
        Scope { runtime: self }
    }

    /// Number of values the engine currently holds
    pub fn live_values(&self) -> JsiResult<usize> {
        self.inner.read(|engine| Ok(engine.live_values()))
    }

    pub(crate) fn inner(&self) -> &Rc<RuntimeInner> {
        &self.inner
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("context", &self.inner.id)
            .field("name", &self.inner.config.name)
            .finish()
    }
}

/// Capability to create handles bound to one [`Runtime`].
///
/// Obtained from [`Runtime::enter`]. Holding a `Scope` proves the runtime is
/// alive and that the caller is on the runtime's thread.
#[derive(Clone, Copy)]
pub struct Scope<'rt> {
    runtime: &'rt Runtime,
}

impl<'rt> Scope<'rt> {
    /// The runtime this scope belongs to
    pub fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }

    /// Wrap a raw value produced by the engine boundary
    pub fn wrap(&self, raw: RawValue) -> JsiResult<NativeValue> {
        NativeValue::from_raw(Some(self.runtime), raw)
    }

    /// Run `f` against the engine directly.
    ///
    /// This is the raw boundary: values it produces must be passed through
    /// [`wrap`](Self::wrap) before they are kept.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut dyn Engine) -> EngineResult<T>) -> JsiResult<T> {
        self.runtime.inner.write(|engine| Ok(f(engine)?))
    }

    fn make(
        &self,
        f: impl FnOnce(&mut dyn Engine) -> JsiResult<RawValue>,
    ) -> JsiResult<NativeValue> {
        let inner = &self.runtime.inner;
        let raw = inner.write(|engine| {
            let raw = f(engine)?;
            engine.protect(raw)?;
            Ok(raw)
        })?;
        Ok(NativeValue::adopt(inner, raw))
    }

    /// Like `make`, for builders that hand back an already protected value
    fn make_protected(
        &self,
        f: impl FnOnce(&mut dyn Engine) -> JsiResult<RawValue>,
    ) -> JsiResult<NativeValue> {
        let inner = &self.runtime.inner;
        let raw = inner.write(f)?;
        Ok(NativeValue::adopt(inner, raw))
    }

    pub fn undefined(&self) -> JsiResult<NativeValue> {
        self.make(|engine| Ok(engine.make_undefined()?))
    }

    pub fn null(&self) -> JsiResult<NativeValue> {
        self.make(|engine| Ok(engine.make_null()?))
    }

    pub fn boolean(&self, value: bool) -> JsiResult<NativeValue> {
        self.make(|engine| Ok(engine.make_bool(value)?))
    }

    pub fn number(&self, value: f64) -> JsiResult<NativeValue> {
        self.make(|engine| Ok(engine.make_number(value)?))
    }

    pub fn string(&self, value: &str) -> JsiResult<NativeValue> {
        self.make(|engine| Ok(engine.make_string(value)?))
    }

    /// Create a fresh, unique symbol
    pub fn symbol(&self, description: Option<&str>) -> JsiResult<NativeValue> {
        self.make(|engine| Ok(engine.make_symbol(description)?))
    }

    /// Create an empty plain object
    pub fn object(&self) -> JsiResult<NativeValue> {
        self.make(|engine| Ok(engine.make_object()?))
    }

    /// Create an array holding `items` in order
    pub fn array(&self, items: &[&NativeValue]) -> JsiResult<NativeValue> {
        let raws = items
            .iter()
            .map(|item| item.raw_in(self.runtime.context_id()))
            .collect::<JsiResult<Vec<_>>>()?;
        self.make_protected(|engine| {
            let array = engine.make_array()?;
            fill_protected(engine, array, |engine| {
                for (index, raw) in raws.into_iter().enumerate() {
                    engine.set_property(array, &index.to_string(), raw)?;
                }
                Ok(())
            })
        })
    }

    /// Create a function backed by a native callback
    pub fn function<F>(&self, name: &str, callback: F) -> JsiResult<NativeValue>
    where
        F: Fn(&mut dyn Engine, RawValue, &[RawValue]) -> EngineResult<RawValue> + 'static,
    {
        let callback: HostFunction = Rc::new(callback);
        self.make(|engine| Ok(engine.make_function(name, callback)?))
    }

    /// The global object
    pub fn global(&self) -> JsiResult<NativeValue> {
        self.make(|engine| Ok(engine.global_object()?))
    }

    /// Build a value from JSON
    pub fn from_json(&self, json: &serde_json::Value) -> JsiResult<NativeValue> {
        self.make_protected(|engine| from_json_value(engine, json))
    }

    /// Serialize a Rust value into a JS value
    pub fn serialize<T: Serialize>(&self, value: &T) -> JsiResult<NativeValue> {
        let json = serde_json::to_value(value)?;
        self.from_json(&json)
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({})", self.runtime.context_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ValueKind;
    use otter_jsi_sys::EngineError;

    #[test]
    fn test_runtime_creation() {
        let runtime = Runtime::new(RuntimeConfig::new().name("test"));
        assert_eq!(runtime.config().name, "test");
        assert!(runtime.live_values().unwrap() > 0);
    }

    #[test]
    fn test_runtimes_have_distinct_contexts() {
        let a = Runtime::default();
        let b = Runtime::default();
        assert_ne!(a.context_id(), b.context_id());
    }

    #[test]
    fn test_scope_constructors() {
        let runtime = Runtime::default();
        let scope = runtime.enter();

        assert_eq!(scope.undefined().unwrap().kind().unwrap(), ValueKind::Undefined);
        assert_eq!(scope.null().unwrap().kind().unwrap(), ValueKind::Null);
        assert_eq!(scope.boolean(true).unwrap().kind().unwrap(), ValueKind::Bool);
        assert_eq!(scope.number(1.0).unwrap().kind().unwrap(), ValueKind::Number);
        assert_eq!(scope.string("s").unwrap().kind().unwrap(), ValueKind::String);
        assert_eq!(scope.symbol(None).unwrap().kind().unwrap(), ValueKind::Symbol);
        assert_eq!(scope.object().unwrap().kind().unwrap(), ValueKind::Object);
        assert_eq!(scope.global().unwrap().kind().unwrap(), ValueKind::Object);
    }

    #[test]
    fn test_handles_release_on_drop() {
        let runtime = Runtime::default();
        let baseline = runtime.live_values().unwrap();
        {
            let scope = runtime.enter();
            let _a = scope.number(1.0).unwrap();
            let _b = scope.string("two").unwrap();
            assert_eq!(runtime.live_values().unwrap(), baseline + 2);
        }
        assert_eq!(runtime.live_values().unwrap(), baseline);
    }

    #[test]
    fn test_value_limit() {
        let runtime = Runtime::new(RuntimeConfig::new().max_values(1));
        let scope = runtime.enter();
        let _kept = scope.number(1.0).unwrap();
        let err = scope.number(2.0).unwrap_err();
        assert!(matches!(err, JsiError::EngineFailure(_)));
    }

    #[test]
    fn test_failed_from_json_releases_partial_values() {
        let runtime = Runtime::new(RuntimeConfig::new().max_values(3));
        let scope = runtime.enter();
        let baseline = runtime.live_values().unwrap();

        // The array and two elements fit, the third element does not
        let err = scope.from_json(&serde_json::json!([1, 2, 3, 4])).unwrap_err();
        assert!(matches!(
            err,
            JsiError::EngineFailure(EngineError::OutOfMemory { limit: 3 })
        ));
        assert_eq!(runtime.live_values().unwrap(), baseline);

        let err = scope
            .from_json(&serde_json::json!({"a": [1, 2], "b": 3}))
            .unwrap_err();
        assert!(err.engine_error().is_some());
        assert_eq!(runtime.live_values().unwrap(), baseline);

        // Capacity is still usable afterwards
        let value = scope.from_json(&serde_json::json!(["x"])).unwrap();
        assert_eq!(value.to_json().unwrap(), serde_json::json!(["x"]));
    }

    #[test]
    fn test_failed_function_releases_partial_values() {
        let runtime = Runtime::new(RuntimeConfig::new().max_values(1));
        let scope = runtime.enter();
        let baseline = runtime.live_values().unwrap();

        // The function object fits, its name string does not
        assert!(
            scope
                .function("f", |engine, _this, _args| engine.make_undefined())
                .is_err()
        );
        assert_eq!(runtime.live_values().unwrap(), baseline);
        assert!(scope.number(1.0).is_ok());
    }

    #[test]
    fn test_array_rejects_foreign_items() {
        let a = Runtime::default();
        let b = Runtime::default();
        let item = b.enter().number(1.0).unwrap();
        let err = a.enter().array(&[&item]).unwrap_err();
        assert!(matches!(err, JsiError::InvalidContext { .. }));
    }
}

//! The engine capability consumed by the value bridge

use std::rc::Rc;

use thiserror::Error;

use crate::raw::{ContextId, RawValue};

/// Result type alias for raw engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Native callback backing a JS function.
///
/// Receives the engine it runs in, the `this` value and the arguments, the
/// same shape as a C "call as function" callback.
pub type HostFunction = Rc<dyn Fn(&mut dyn Engine, RawValue, &[RawValue]) -> EngineResult<RawValue>>;

/// Failures reported by the engine itself
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Value minted by another context
    #[error("Foreign value: {value:?} used with context {context}")]
    ForeignValue { context: ContextId, value: RawValue },

    /// Value whose slot has been released
    #[error("Stale value: slot {index} generation {generation} is no longer live")]
    StaleValue { index: u32, generation: u32 },

    /// Value storage exhausted
    #[error("Out of memory: value limit of {limit} reached")]
    OutOfMemory { limit: usize },

    /// A JavaScript exception was thrown
    #[error("{error_type}: {message}")]
    Exception { error_type: String, message: String },

    /// Engine-internal fault
    #[error("Engine fault: {0}")]
    Fault(String),
}

impl EngineError {
    /// Create a thrown-exception error
    pub fn exception(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Exception {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Create a `TypeError` exception
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::exception("TypeError", message)
    }

    /// Check if this is a thrown JS exception
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Exception { .. })
    }
}

/// Capability surface of an embedded JavaScript engine.
///
/// Every method validates the [`RawValue`] it receives against the engine's
/// own context. Predicates and raw reads take `&self` and must not mutate
/// the value or run user code. Raw reads never coerce: asking for the
/// number of a string is a `TypeError` exception.
///
/// Values returned by the `make_*` constructors and by property reads are
/// unprotected; callers that keep them must [`protect`](Engine::protect)
/// them and balance it with [`unprotect`](Engine::unprotect).
pub trait Engine {
    /// Identity of the context this engine serves
    fn context_id(&self) -> ContextId;

    fn is_undefined(&self, value: RawValue) -> EngineResult<bool>;
    fn is_null(&self, value: RawValue) -> EngineResult<bool>;
    fn is_bool(&self, value: RawValue) -> EngineResult<bool>;
    fn is_number(&self, value: RawValue) -> EngineResult<bool>;
    fn is_symbol(&self, value: RawValue) -> EngineResult<bool>;
    fn is_string(&self, value: RawValue) -> EngineResult<bool>;
    fn is_function(&self, value: RawValue) -> EngineResult<bool>;
    fn is_object(&self, value: RawValue) -> EngineResult<bool>;
    fn is_array(&self, value: RawValue) -> EngineResult<bool>;

    fn get_bool(&self, value: RawValue) -> EngineResult<bool>;
    fn get_number(&self, value: RawValue) -> EngineResult<f64>;
    fn get_string(&self, value: RawValue) -> EngineResult<String>;
    fn symbol_description(&self, value: RawValue) -> EngineResult<Option<String>>;

    /// `String(value)` coercion
    fn to_string_copy(&self, value: RawValue) -> EngineResult<String>;

    /// `a === b`
    fn strict_equals(&self, a: RawValue, b: RawValue) -> EngineResult<bool>;

    fn make_undefined(&mut self) -> EngineResult<RawValue>;
    fn make_null(&mut self) -> EngineResult<RawValue>;
    fn make_bool(&mut self, value: bool) -> EngineResult<RawValue>;
    fn make_number(&mut self, value: f64) -> EngineResult<RawValue>;
    fn make_string(&mut self, value: &str) -> EngineResult<RawValue>;
    fn make_symbol(&mut self, description: Option<&str>) -> EngineResult<RawValue>;
    fn make_object(&mut self) -> EngineResult<RawValue>;
    fn make_array(&mut self) -> EngineResult<RawValue>;
    fn make_function(&mut self, name: &str, function: HostFunction) -> EngineResult<RawValue>;

    /// The context's global object
    fn global_object(&self) -> EngineResult<RawValue>;

    /// Read a property; missing properties read as `undefined`
    fn get_property(&mut self, object: RawValue, key: &str) -> EngineResult<RawValue>;
    fn set_property(&mut self, object: RawValue, key: &str, value: RawValue) -> EngineResult<()>;
    fn has_property(&self, object: RawValue, key: &str) -> EngineResult<bool>;
    fn delete_property(&mut self, object: RawValue, key: &str) -> EngineResult<bool>;

    /// Own enumerable property names in insertion order
    fn property_names(&self, object: RawValue) -> EngineResult<Vec<String>>;

    /// Call `function` with the given receiver and arguments
    fn call(
        &mut self,
        function: RawValue,
        this: RawValue,
        args: &[RawValue],
    ) -> EngineResult<RawValue>;

    /// Keep `value` alive until a matching [`unprotect`](Engine::unprotect)
    fn protect(&mut self, value: RawValue) -> EngineResult<()>;
    fn unprotect(&mut self, value: RawValue) -> EngineResult<()>;

    /// Number of values currently held by the engine
    fn live_values(&self) -> usize;
}

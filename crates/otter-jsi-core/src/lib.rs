//! Typed, lifetime-safe view of JavaScript engine values.
//!
//! This crate wraps the raw [`Engine`](otter_jsi_sys::Engine) capability in
//! handles that know which runtime they belong to, classifies every value
//! into exactly one [`ValueKind`], and exposes accessors that refuse to
//! coerce.
//!
//! # Example
//!
//! ```
//! use otter_jsi_core::{Runtime, RuntimeConfig, TypedValue, ValueKind};
//!
//! let runtime = Runtime::new(RuntimeConfig::default());
//! let scope = runtime.enter();
//!
//! let value = scope.number(42.0).unwrap();
//! assert_eq!(value.kind().unwrap(), ValueKind::Number);
//! assert_eq!(value.as_number().unwrap(), 42.0);
//! assert!(value.as_string().is_err());
//!
//! match scope.string("hi").unwrap().typed().unwrap() {
//!     TypedValue::String(s) => assert_eq!(s, "hi"),
//!     other => panic!("unexpected {:?}", other.kind()),
//! }
//! ```
//!
//! # Lifetimes
//!
//! A [`Runtime`] is the sole owner of its engine. [`NativeValue`] handles
//! hold only a weak association plus a GC protection that is released when
//! the handle drops. Once the runtime is gone every operation on a
//! surviving handle fails with [`JsiError::InvalidContext`].
//!
//! ```
//! use otter_jsi_core::{JsiError, Runtime};
//!
//! let runtime = Runtime::default();
//! let value = runtime.enter().boolean(true).unwrap();
//! drop(runtime);
//! assert!(matches!(value.kind(), Err(JsiError::InvalidContext { .. })));
//! ```
//!
//! # Thread Safety
//!
//! All types in this crate are `!Send` and `!Sync` because engine contexts
//! and their values are confined to one thread.
//!
//! ## Example: Wrong (won't compile)
//!
//! ```compile_fail
//! use otter_jsi_core::Runtime;
//! use std::thread;
//!
//! let runtime = Runtime::default();
//! thread::spawn(move || {
//!     let _ = runtime.enter(); // Error: Runtime is !Send
//! });
//! ```
//!
//! ```compile_fail
//! use otter_jsi_core::Runtime;
//! use std::thread;
//!
//! let runtime = Runtime::default();
//! let value = runtime.enter().number(1.0).unwrap();
//! thread::spawn(move || {
//!     let _ = value.kind(); // Error: NativeValue is !Send
//! });
//! ```

mod config;
mod error;
mod function;
mod json;
mod kind;
mod object;
mod runtime;
mod symbol;
mod typed;
mod value;

pub use config::RuntimeConfig;
pub use error::{JsiError, JsiResult};
pub use function::JsFunction;
pub use kind::ValueKind;
pub use object::JsObject;
pub use runtime::{Runtime, Scope};
pub use symbol::JsSymbol;
pub use typed::TypedValue;
pub use value::NativeValue;

// Re-export the engine layer for embedders that supply their own engine
pub use otter_jsi_sys;

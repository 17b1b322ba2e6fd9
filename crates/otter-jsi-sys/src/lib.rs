//! Engine capability layer for the Otter JS value bridge.
//!
//! This crate describes what the bridge needs from an embedded JavaScript
//! engine: type predicates, raw reads, value construction, property access,
//! calls and GC protection. It is the counterpart of a raw FFI crate, but
//! expressed as the object-safe [`Engine`] trait so that any engine (or a
//! test double) can sit behind it.
//!
//! [`SlotEngine`] is a reference implementation backed by a
//! generation-indexed slot arena. It stores values; it does not parse or
//! evaluate JavaScript.
//!
//! Use the safe wrappers in `otter-jsi-core` for typed access.

mod engine;
mod raw;
mod slot;

pub use engine::{Engine, EngineError, EngineResult, HostFunction};
pub use raw::{ContextId, RawValue};
pub use slot::{DEFAULT_CAPACITY, SlotEngine};

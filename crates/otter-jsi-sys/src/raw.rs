//! Opaque engine references

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one engine context.
///
/// Ids are never reused, so a value minted by a torn-down context can never
/// be mistaken for a value of a newer one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(NonZeroU64);

impl ContextId {
    /// Allocate a fresh context id
    pub fn next() -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        // Starts at 1; exhausting 2^64 ids is not reachable in practice
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MAX))
    }

    /// Numeric form, for diagnostics
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.0)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque reference to a single value inside an engine.
///
/// A `RawValue` is plain data: it does not keep the value alive and does not
/// borrow the engine. Engines validate it on every use, so a reference whose
/// slot was released reports [`EngineError::StaleValue`](crate::EngineError::StaleValue)
/// instead of reading someone else's value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawValue {
    context: ContextId,
    index: u32,
    generation: u32,
}

impl RawValue {
    /// Assemble a raw reference. Only engines should call this.
    pub fn from_parts(context: ContextId, index: u32, generation: u32) -> Self {
        Self {
            context,
            index,
            generation,
        }
    }

    /// Context that minted this value
    pub fn context(self) -> ContextId {
        self.context
    }

    /// Slot index inside the owning engine
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the value was minted
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RawValue({}:{}@{})",
            self.context, self.index, self.generation
        )
    }
}

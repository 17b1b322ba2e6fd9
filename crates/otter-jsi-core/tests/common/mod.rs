//! Shared helpers for integration tests
#![allow(dead_code)]

use otter_jsi_sys::{ContextId, Engine, EngineError, EngineResult, HostFunction, RawValue};

/// Install a test-writer subscriber once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Predicate answers reported for one value
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags {
    pub undefined: bool,
    pub null: bool,
    pub bool: bool,
    pub number: bool,
    pub symbol: bool,
    pub string: bool,
    pub function: bool,
}

impl Flags {
    pub fn from_bits(bits: [bool; 7]) -> Self {
        Self {
            undefined: bits[0],
            null: bits[1],
            bool: bits[2],
            number: bits[3],
            symbol: bits[4],
            string: bits[5],
            function: bits[6],
        }
    }
}

/// Engine whose predicates answer from a fixed table.
///
/// Lets tests build values that satisfy several predicates at once, and
/// make a chosen predicate fail, which no well-behaved engine would do.
pub struct FlagEngine {
    id: ContextId,
    values: Vec<Flags>,
    failing: Option<&'static str>,
}

impl FlagEngine {
    pub fn new() -> Self {
        Self {
            id: ContextId::next(),
            values: Vec::new(),
            failing: None,
        }
    }

    /// Make every call to `predicate` fail with a fault
    pub fn fail_on(mut self, predicate: &'static str) -> Self {
        self.failing = Some(predicate);
        self
    }

    pub fn add(&mut self, flags: Flags) -> RawValue {
        self.values.push(flags);
        RawValue::from_parts(self.id, (self.values.len() - 1) as u32, 0)
    }

    fn flags(&self, value: RawValue, predicate: &'static str) -> EngineResult<Flags> {
        if value.context() != self.id {
            return Err(EngineError::ForeignValue {
                context: self.id,
                value,
            });
        }
        if self.failing == Some(predicate) {
            return Err(EngineError::Fault(format!("{} failed", predicate)));
        }
        self.values
            .get(value.index() as usize)
            .copied()
            .ok_or(EngineError::StaleValue {
                index: value.index(),
                generation: value.generation(),
            })
    }
}

fn unsupported<T>() -> EngineResult<T> {
    Err(EngineError::Fault("unsupported by FlagEngine".into()))
}

impl Engine for FlagEngine {
    fn context_id(&self) -> ContextId {
        self.id
    }

    fn is_undefined(&self, value: RawValue) -> EngineResult<bool> {
        Ok(self.flags(value, "is_undefined")?.undefined)
    }

    fn is_null(&self, value: RawValue) -> EngineResult<bool> {
        Ok(self.flags(value, "is_null")?.null)
    }

    fn is_bool(&self, value: RawValue) -> EngineResult<bool> {
        Ok(self.flags(value, "is_bool")?.bool)
    }

    fn is_number(&self, value: RawValue) -> EngineResult<bool> {
        Ok(self.flags(value, "is_number")?.number)
    }

    fn is_symbol(&self, value: RawValue) -> EngineResult<bool> {
        Ok(self.flags(value, "is_symbol")?.symbol)
    }

    fn is_string(&self, value: RawValue) -> EngineResult<bool> {
        Ok(self.flags(value, "is_string")?.string)
    }

    fn is_function(&self, value: RawValue) -> EngineResult<bool> {
        Ok(self.flags(value, "is_function")?.function)
    }

    fn is_object(&self, value: RawValue) -> EngineResult<bool> {
        let f = self.flags(value, "is_object")?;
        Ok(f.function || !(f.undefined || f.null || f.bool || f.number || f.symbol || f.string))
    }

    fn is_array(&self, value: RawValue) -> EngineResult<bool> {
        self.flags(value, "is_array")?;
        Ok(false)
    }

    fn get_bool(&self, _value: RawValue) -> EngineResult<bool> {
        unsupported()
    }

    fn get_number(&self, value: RawValue) -> EngineResult<f64> {
        self.flags(value, "get_number")?;
        Ok(7.0)
    }

    fn get_string(&self, _value: RawValue) -> EngineResult<String> {
        unsupported()
    }

    fn symbol_description(&self, _value: RawValue) -> EngineResult<Option<String>> {
        unsupported()
    }

    fn to_string_copy(&self, _value: RawValue) -> EngineResult<String> {
        unsupported()
    }

    fn strict_equals(&self, a: RawValue, b: RawValue) -> EngineResult<bool> {
        Ok(a == b)
    }

    fn make_undefined(&mut self) -> EngineResult<RawValue> {
        Ok(self.add(Flags {
            undefined: true,
            ..Flags::default()
        }))
    }

    fn make_null(&mut self) -> EngineResult<RawValue> {
        Ok(self.add(Flags {
            null: true,
            ..Flags::default()
        }))
    }

    fn make_bool(&mut self, _value: bool) -> EngineResult<RawValue> {
        unsupported()
    }

    fn make_number(&mut self, _value: f64) -> EngineResult<RawValue> {
        Ok(self.add(Flags {
            number: true,
            ..Flags::default()
        }))
    }

    fn make_string(&mut self, _value: &str) -> EngineResult<RawValue> {
        unsupported()
    }

    fn make_symbol(&mut self, _description: Option<&str>) -> EngineResult<RawValue> {
        unsupported()
    }

    fn make_object(&mut self) -> EngineResult<RawValue> {
        Ok(self.add(Flags::default()))
    }

    fn make_array(&mut self) -> EngineResult<RawValue> {
        unsupported()
    }

    fn make_function(&mut self, _name: &str, _function: HostFunction) -> EngineResult<RawValue> {
        unsupported()
    }

    fn global_object(&self) -> EngineResult<RawValue> {
        unsupported()
    }

    fn get_property(&mut self, _object: RawValue, _key: &str) -> EngineResult<RawValue> {
        unsupported()
    }

    fn set_property(&mut self, _object: RawValue, _key: &str, _value: RawValue) -> EngineResult<()> {
        unsupported()
    }

    fn has_property(&self, _object: RawValue, _key: &str) -> EngineResult<bool> {
        unsupported()
    }

    fn delete_property(&mut self, _object: RawValue, _key: &str) -> EngineResult<bool> {
        unsupported()
    }

    fn property_names(&self, _object: RawValue) -> EngineResult<Vec<String>> {
        unsupported()
    }

    fn call(
        &mut self,
        _function: RawValue,
        _this: RawValue,
        _args: &[RawValue],
    ) -> EngineResult<RawValue> {
        unsupported()
    }

    fn protect(&mut self, value: RawValue) -> EngineResult<()> {
        self.flags(value, "protect").map(|_| ())
    }

    fn unprotect(&mut self, value: RawValue) -> EngineResult<()> {
        self.flags(value, "unprotect").map(|_| ())
    }

    fn live_values(&self) -> usize {
        self.values.len()
    }
}

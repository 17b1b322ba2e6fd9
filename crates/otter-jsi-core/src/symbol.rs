//! Symbol view

use crate::error::JsiResult;
use crate::value::NativeValue;

/// A value known to be a symbol
#[derive(Debug)]
pub struct JsSymbol {
    value: NativeValue,
}

impl JsSymbol {
    pub(crate) fn new(value: NativeValue) -> Self {
        Self { value }
    }

    /// Description given at creation, if any
    pub fn description(&self) -> JsiResult<Option<String>> {
        self.value
            .read(|engine, raw| Ok(engine.symbol_description(raw)?))
    }

    pub fn as_value(&self) -> &NativeValue {
        &self.value
    }

    pub fn into_value(self) -> NativeValue {
        self.value
    }
}

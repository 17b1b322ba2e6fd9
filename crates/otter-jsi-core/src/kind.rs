//! Closed classification of JS values

use std::fmt;
use std::str::FromStr;

use otter_jsi_sys::{Engine, EngineResult, RawValue};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{JsiError, JsiResult};
use crate::value::NativeValue;

/// Dynamic type of a JS value as seen from native code.
///
/// Serializes to the lowercase names `undefined`, `null`, `bool`, `number`,
/// `symbol`, `string`, `function`, `object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Undefined,
    Null,
    Bool,
    Number,
    Symbol,
    String,
    Function,
    Object,
}

impl ValueKind {
    /// Every kind, in classification order
    pub const ALL: [ValueKind; 8] = [
        ValueKind::Undefined,
        ValueKind::Null,
        ValueKind::Bool,
        ValueKind::Number,
        ValueKind::Symbol,
        ValueKind::String,
        ValueKind::Function,
        ValueKind::Object,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Symbol => "symbol",
            ValueKind::String => "string",
            ValueKind::Function => "function",
            ValueKind::Object => "object",
        }
    }

    /// Everything except functions and objects
    pub fn is_primitive(self) -> bool {
        !matches!(self, ValueKind::Function | ValueKind::Object)
    }

    /// `undefined` or `null`
    pub fn is_nullish(self) -> bool {
        matches!(self, ValueKind::Undefined | ValueKind::Null)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = JsiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| JsiError::conversion(format!("unknown value kind '{}'", s)))
    }
}

/// Classify `value`, first matching predicate wins.
///
/// Engine predicates may overlap (every function is also an object), so the
/// order is fixed and `object` is only reached after the seven explicit
/// checks fail. Predicate errors propagate; no kind is guessed.
pub(crate) fn classify(engine: &dyn Engine, value: RawValue) -> EngineResult<ValueKind> {
    let kind = if engine.is_undefined(value)? {
        ValueKind::Undefined
    } else if engine.is_null(value)? {
        ValueKind::Null
    } else if engine.is_bool(value)? {
        ValueKind::Bool
    } else if engine.is_number(value)? {
        ValueKind::Number
    } else if engine.is_symbol(value)? {
        ValueKind::Symbol
    } else if engine.is_string(value)? {
        ValueKind::String
    } else if engine.is_function(value)? {
        ValueKind::Function
    } else {
        ValueKind::Object
    };
    Ok(kind)
}

impl NativeValue {
    /// Classify the value.
    ///
    /// Purely observational: no coercion, no mutation. Fails if the runtime
    /// is gone or the engine reports an error.
    pub fn kind(&self) -> JsiResult<ValueKind> {
        let kind = self.read(|engine, raw| Ok(classify(engine, raw)?))?;
        trace!(value = ?self.raw(), %kind, "classified value");
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in ValueKind::ALL {
            assert_eq!(kind.as_str().parse::<ValueKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.as_str());
        }
        assert!("array".parse::<ValueKind>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ValueKind::Function).unwrap();
        assert_eq!(json, "\"function\"");
        let kind: ValueKind = serde_json::from_str("\"bool\"").unwrap();
        assert_eq!(kind, ValueKind::Bool);
    }

    #[test]
    fn test_undefined_and_null_are_distinct() {
        assert_ne!(ValueKind::Undefined, ValueKind::Null);
        assert!(ValueKind::Undefined.is_nullish());
        assert!(ValueKind::Null.is_nullish());
        assert!(!ValueKind::Bool.is_nullish());
    }

    #[test]
    fn test_primitive() {
        assert!(ValueKind::Symbol.is_primitive());
        assert!(!ValueKind::Function.is_primitive());
        assert!(!ValueKind::Object.is_primitive());
    }
}

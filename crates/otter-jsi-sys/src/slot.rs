//! Reference engine backed by a generation-indexed slot arena

use std::fmt;

use indexmap::IndexMap;

use crate::engine::{Engine, EngineError, EngineResult, HostFunction};
use crate::raw::{ContextId, RawValue};

/// Default number of values a [`SlotEngine`] may hold at once
pub const DEFAULT_CAPACITY: usize = 1 << 20;

/// `undefined`, `null`, `true`, `false` and the global object
const PINNED_SLOTS: usize = 5;

#[derive(Clone, Copy, PartialEq, Eq)]
enum ObjectClass {
    Plain,
    Array,
    Function,
}

struct ObjectData {
    class: ObjectClass,
    properties: IndexMap<String, RawValue>,
    /// One past the highest index written (arrays only)
    length: u32,
    function: Option<HostFunction>,
}

impl ObjectData {
    fn new(class: ObjectClass) -> Self {
        Self {
            class,
            properties: IndexMap::new(),
            length: 0,
            function: None,
        }
    }
}

enum SlotData {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(Option<String>),
    Object(ObjectData),
}

impl SlotData {
    fn type_name(&self) -> &'static str {
        match self {
            SlotData::Undefined => "undefined",
            SlotData::Null => "null",
            SlotData::Bool(_) => "boolean",
            SlotData::Number(_) => "number",
            SlotData::String(_) => "string",
            SlotData::Symbol(_) => "symbol",
            SlotData::Object(obj) if obj.class == ObjectClass::Function => "function",
            SlotData::Object(_) => "object",
        }
    }
}

struct Slot {
    generation: u32,
    protect_count: u32,
    /// Canonical values that live as long as the engine
    pinned: bool,
    data: Option<SlotData>,
}

/// In-memory engine implementing [`Engine`].
///
/// Values live in a `Vec` of slots addressed by `(index, generation)`. A
/// slot is released when its protect count drops back to zero; the
/// generation is bumped on release so that old [`RawValue`]s are reported as
/// stale instead of aliasing the slot's next occupant.
///
/// `undefined`, `null`, `true`, `false` and the global object are pinned.
/// Object properties hold a protection on their values.
pub struct SlotEngine {
    id: ContextId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    capacity: usize,
    undefined: RawValue,
    null: RawValue,
    true_value: RawValue,
    false_value: RawValue,
    global: RawValue,
}

impl SlotEngine {
    /// Create an engine with [`DEFAULT_CAPACITY`]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an engine that holds at most `capacity` non-pinned values
    pub fn with_capacity(capacity: usize) -> Self {
        let id = ContextId::next();
        let placeholder = RawValue::from_parts(id, 0, 0);
        let mut engine = Self {
            id,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            capacity,
            undefined: placeholder,
            null: placeholder,
            true_value: placeholder,
            false_value: placeholder,
            global: placeholder,
        };
        engine.undefined = engine.insert(SlotData::Undefined, true);
        engine.null = engine.insert(SlotData::Null, true);
        engine.true_value = engine.insert(SlotData::Bool(true), true);
        engine.false_value = engine.insert(SlotData::Bool(false), true);
        engine.global = engine.insert(SlotData::Object(ObjectData::new(ObjectClass::Plain)), true);
        engine
    }

    /// Maximum number of non-pinned values
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn insert(&mut self, data: SlotData, pinned: bool) -> RawValue {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.protect_count = 0;
            slot.pinned = pinned;
            slot.data = Some(data);
            return RawValue::from_parts(self.id, index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            protect_count: 0,
            pinned,
            data: Some(data),
        });
        RawValue::from_parts(self.id, index, 0)
    }

    fn alloc(&mut self, data: SlotData) -> EngineResult<RawValue> {
        if self.live >= self.capacity.saturating_add(PINNED_SLOTS) {
            return Err(EngineError::OutOfMemory {
                limit: self.capacity,
            });
        }
        Ok(self.insert(data, false))
    }

    fn slot(&self, value: RawValue) -> EngineResult<&Slot> {
        if value.context() != self.id {
            return Err(EngineError::ForeignValue {
                context: self.id,
                value,
            });
        }
        match self.slots.get(value.index() as usize) {
            Some(slot) if slot.generation == value.generation() && slot.data.is_some() => Ok(slot),
            _ => Err(EngineError::StaleValue {
                index: value.index(),
                generation: value.generation(),
            }),
        }
    }

    fn slot_mut(&mut self, value: RawValue) -> EngineResult<&mut Slot> {
        self.slot(value)?;
        Ok(&mut self.slots[value.index() as usize])
    }

    fn data(&self, value: RawValue) -> EngineResult<&SlotData> {
        self.slot(value)?
            .data
            .as_ref()
            .ok_or(EngineError::StaleValue {
                index: value.index(),
                generation: value.generation(),
            })
    }

    fn object(&self, value: RawValue) -> EngineResult<&ObjectData> {
        match self.data(value)? {
            SlotData::Object(obj) => Ok(obj),
            other => Err(EngineError::type_error(format!(
                "{} is not an object",
                other.type_name()
            ))),
        }
    }

    fn object_mut(&mut self, value: RawValue) -> EngineResult<&mut ObjectData> {
        self.object(value)?;
        match self.slots[value.index() as usize].data.as_mut() {
            Some(SlotData::Object(obj)) => Ok(obj),
            _ => Err(EngineError::Fault("object slot changed during access".into())),
        }
    }

    /// Release `value` and everything only it kept alive
    fn release(&mut self, value: RawValue) {
        let mut pending = vec![value];
        while let Some(raw) = pending.pop() {
            let Ok(slot) = self.slot_mut(raw) else {
                continue;
            };
            if slot.pinned {
                continue;
            }
            let data = slot.data.take();
            slot.generation = slot.generation.wrapping_add(1);
            slot.protect_count = 0;
            self.free.push(raw.index());
            self.live -= 1;

            if let Some(SlotData::Object(obj)) = data {
                for child in obj.properties.into_values() {
                    if let Ok(slot) = self.slot_mut(child) {
                        if slot.pinned {
                            continue;
                        }
                        slot.protect_count = slot.protect_count.saturating_sub(1);
                        if slot.protect_count == 0 {
                            pending.push(child);
                        }
                    }
                }
            }
        }
    }

    fn stringify(&self, value: RawValue, visiting: &mut Vec<RawValue>) -> EngineResult<String> {
        match self.data(value)? {
            SlotData::Undefined => Ok("undefined".into()),
            SlotData::Null => Ok("null".into()),
            SlotData::Bool(b) => Ok(b.to_string()),
            SlotData::Number(n) => Ok(format_number(*n)),
            SlotData::String(s) => Ok(s.clone()),
            SlotData::Symbol(_) => Err(EngineError::type_error(
                "Cannot convert a Symbol value to a string",
            )),
            SlotData::Object(obj) => match obj.class {
                ObjectClass::Plain => Ok("[object Object]".into()),
                ObjectClass::Function => {
                    // A redefined non-string `name` is valid JS; a stale one is not
                    let name = match obj.properties.get("name") {
                        Some(name) => match self.data(*name)? {
                            SlotData::String(s) => s.clone(),
                            _ => String::new(),
                        },
                        None => String::new(),
                    };
                    Ok(format!("function {}() {{ [native code] }}", name))
                }
                ObjectClass::Array => {
                    // Cyclic arrays join to an empty string, like Array.prototype.join
                    if visiting.contains(&value) {
                        return Ok(String::new());
                    }
                    visiting.push(value);
                    let mut parts = Vec::with_capacity(obj.length as usize);
                    for i in 0..obj.length {
                        let part = match obj.properties.get(i.to_string().as_str()) {
                            Some(element) => match self.data(*element)? {
                                SlotData::Undefined | SlotData::Null => String::new(),
                                _ => self.stringify(*element, visiting)?,
                            },
                            None => String::new(),
                        };
                        parts.push(part);
                    }
                    visiting.pop();
                    Ok(parts.join(","))
                }
            },
        }
    }
}

impl Default for SlotEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SlotEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotEngine")
            .field("id", &self.id)
            .field("live", &self.live)
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Format a number the way `Number.prototype.toString` does
///
/// Decimal notation for magnitudes in `[1e-6, 1e21)`, exponent notation
/// (`1e+21`, `1.5e-7`) outside it, shortest round-trip digits in both.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.into()
    } else if n == 0.0 {
        "0".into()
    } else if (1e-6..1e21).contains(&n.abs()) {
        format!("{}", n)
    } else {
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    }
}

fn array_index(key: &str) -> Option<u32> {
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<u32>().ok().filter(|i| *i != u32::MAX)
}

impl Engine for SlotEngine {
    fn context_id(&self) -> ContextId {
        self.id
    }

    fn is_undefined(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(self.data(value)?, SlotData::Undefined))
    }

    fn is_null(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(self.data(value)?, SlotData::Null))
    }

    fn is_bool(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(self.data(value)?, SlotData::Bool(_)))
    }

    fn is_number(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(self.data(value)?, SlotData::Number(_)))
    }

    fn is_symbol(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(self.data(value)?, SlotData::Symbol(_)))
    }

    fn is_string(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(self.data(value)?, SlotData::String(_)))
    }

    fn is_function(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(
            self.data(value)?,
            SlotData::Object(ObjectData {
                function: Some(_),
                ..
            })
        ))
    }

    fn is_object(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(self.data(value)?, SlotData::Object(_)))
    }

    fn is_array(&self, value: RawValue) -> EngineResult<bool> {
        Ok(matches!(
            self.data(value)?,
            SlotData::Object(ObjectData {
                class: ObjectClass::Array,
                ..
            })
        ))
    }

    fn get_bool(&self, value: RawValue) -> EngineResult<bool> {
        match self.data(value)? {
            SlotData::Bool(b) => Ok(*b),
            other => Err(EngineError::type_error(format!(
                "{} is not a boolean",
                other.type_name()
            ))),
        }
    }

    fn get_number(&self, value: RawValue) -> EngineResult<f64> {
        match self.data(value)? {
            SlotData::Number(n) => Ok(*n),
            other => Err(EngineError::type_error(format!(
                "{} is not a number",
                other.type_name()
            ))),
        }
    }

    fn get_string(&self, value: RawValue) -> EngineResult<String> {
        match self.data(value)? {
            SlotData::String(s) => Ok(s.clone()),
            other => Err(EngineError::type_error(format!(
                "{} is not a string",
                other.type_name()
            ))),
        }
    }

    fn symbol_description(&self, value: RawValue) -> EngineResult<Option<String>> {
        match self.data(value)? {
            SlotData::Symbol(description) => Ok(description.clone()),
            other => Err(EngineError::type_error(format!(
                "{} is not a symbol",
                other.type_name()
            ))),
        }
    }

    fn to_string_copy(&self, value: RawValue) -> EngineResult<String> {
        self.stringify(value, &mut Vec::new())
    }

    fn strict_equals(&self, a: RawValue, b: RawValue) -> EngineResult<bool> {
        let equal = match (self.data(a)?, self.data(b)?) {
            (SlotData::Undefined, SlotData::Undefined) | (SlotData::Null, SlotData::Null) => true,
            (SlotData::Bool(x), SlotData::Bool(y)) => x == y,
            // IEEE comparison: NaN !== NaN and +0 === -0
            (SlotData::Number(x), SlotData::Number(y)) => x == y,
            (SlotData::String(x), SlotData::String(y)) => x == y,
            (SlotData::Symbol(_), SlotData::Symbol(_))
            | (SlotData::Object(_), SlotData::Object(_)) => a == b,
            _ => false,
        };
        Ok(equal)
    }

    fn make_undefined(&mut self) -> EngineResult<RawValue> {
        Ok(self.undefined)
    }

    fn make_null(&mut self) -> EngineResult<RawValue> {
        Ok(self.null)
    }

    fn make_bool(&mut self, value: bool) -> EngineResult<RawValue> {
        Ok(if value {
            self.true_value
        } else {
            self.false_value
        })
    }

    fn make_number(&mut self, value: f64) -> EngineResult<RawValue> {
        self.alloc(SlotData::Number(value))
    }

    fn make_string(&mut self, value: &str) -> EngineResult<RawValue> {
        self.alloc(SlotData::String(value.to_owned()))
    }

    fn make_symbol(&mut self, description: Option<&str>) -> EngineResult<RawValue> {
        self.alloc(SlotData::Symbol(description.map(str::to_owned)))
    }

    fn make_object(&mut self) -> EngineResult<RawValue> {
        self.alloc(SlotData::Object(ObjectData::new(ObjectClass::Plain)))
    }

    fn make_array(&mut self) -> EngineResult<RawValue> {
        self.alloc(SlotData::Object(ObjectData::new(ObjectClass::Array)))
    }

    fn make_function(&mut self, name: &str, function: HostFunction) -> EngineResult<RawValue> {
        let mut data = ObjectData::new(ObjectClass::Function);
        data.function = Some(function);
        let raw = self.alloc(SlotData::Object(data))?;

        let name = match self.make_string(name) {
            Ok(name) => name,
            Err(err) => {
                self.release(raw);
                return Err(err);
            }
        };
        if let Err(err) = self.set_property(raw, "name", name) {
            self.release(name);
            self.release(raw);
            return Err(err);
        }
        Ok(raw)
    }

    fn global_object(&self) -> EngineResult<RawValue> {
        Ok(self.global)
    }

    fn get_property(&mut self, object: RawValue, key: &str) -> EngineResult<RawValue> {
        let obj = self.object(object)?;
        if obj.class == ObjectClass::Array && key == "length" {
            let length = obj.length;
            return self.make_number(length as f64);
        }
        Ok(obj.properties.get(key).copied().unwrap_or(self.undefined))
    }

    fn set_property(&mut self, object: RawValue, key: &str, value: RawValue) -> EngineResult<()> {
        let class = self.object(object)?.class;
        if class == ObjectClass::Array && key == "length" {
            return Err(EngineError::type_error(
                "Cannot assign to read only property 'length' of array",
            ));
        }

        self.protect(value)?;
        let obj = self.object_mut(object)?;
        let previous = obj.properties.insert(key.to_owned(), value);
        if obj.class == ObjectClass::Array {
            if let Some(index) = array_index(key) {
                obj.length = obj.length.max(index + 1);
            }
        }

        if let Some(previous) = previous {
            self.unprotect(previous)?;
        }
        Ok(())
    }

    fn has_property(&self, object: RawValue, key: &str) -> EngineResult<bool> {
        let obj = self.object(object)?;
        Ok(obj.properties.contains_key(key) || (obj.class == ObjectClass::Array && key == "length"))
    }

    fn delete_property(&mut self, object: RawValue, key: &str) -> EngineResult<bool> {
        let obj = self.object_mut(object)?;
        if obj.class == ObjectClass::Array && key == "length" {
            return Ok(false);
        }
        match obj.properties.shift_remove(key) {
            Some(previous) => {
                self.unprotect(previous)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn property_names(&self, object: RawValue) -> EngineResult<Vec<String>> {
        Ok(self.object(object)?.properties.keys().cloned().collect())
    }

    fn call(
        &mut self,
        function: RawValue,
        this: RawValue,
        args: &[RawValue],
    ) -> EngineResult<RawValue> {
        let callee = match self.data(function)? {
            SlotData::Object(ObjectData {
                function: Some(callee),
                ..
            }) => callee.clone(),
            other => {
                return Err(EngineError::type_error(format!(
                    "{} is not a function",
                    other.type_name()
                )));
            }
        };
        self.slot(this)?;
        for arg in args {
            self.slot(*arg)?;
        }
        callee(self, this, args)
    }

    fn protect(&mut self, value: RawValue) -> EngineResult<()> {
        let slot = self.slot_mut(value)?;
        if !slot.pinned {
            slot.protect_count = slot.protect_count.saturating_add(1);
        }
        Ok(())
    }

    fn unprotect(&mut self, value: RawValue) -> EngineResult<()> {
        let slot = self.slot_mut(value)?;
        if slot.pinned {
            return Ok(());
        }
        if slot.protect_count == 0 {
            return Err(EngineError::Fault(format!(
                "unbalanced unprotect of {:?}",
                value
            )));
        }
        slot.protect_count -= 1;
        if slot.protect_count == 0 {
            self.release(value);
        }
        Ok(())
    }

    fn live_values(&self) -> usize {
        self.live
    }
}

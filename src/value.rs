use crate::map::Map;
use num_cmp::NumCmp;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A parsed JSON value.
///
/// Strings, arrays and objects are shared by non-atomic reference counting,
/// so cloning a `Value` is cheap at any depth. Numbers keep the int/double
/// distinction made by the scanner: a token without fraction or exponent
/// that fits `i64` becomes `Int`, everything else becomes `Double`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Object(Rc<Map>),
}

impl Value {
    /// Build a string value from anything string-like.
    pub fn string<S: AsRef<str>>(s: S) -> Value {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Descend into an object member.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Value {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Value {
        Value::Object(Rc::new(map))
    }
}

/// Value equality as used by `enum` and `uniqueItems`: numbers compare
/// across the int/double divide (`1 == 1.0`), arrays element-wise in
/// order, objects order-independently.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Int(a), Value::Double(b)) => NumCmp::num_eq(*a, *b),
            (Value::Double(a), Value::Int(b)) => NumCmp::num_eq(*b, *a),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

/// Content hash consistent with the equality above. An integral double
/// hashes like the integer it equals, so `1` and `1.0` land in the same
/// bucket; non-integral doubles hash their bit pattern. Object member
/// hashes are combined with XOR to stay independent of insertion order.
pub(crate) fn value_hash(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_value(value, &mut hasher);
    hasher.finish()
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => state.write_u32(0xABD8_5493),
        Value::Bool(b) => b.hash(state),
        Value::Int(i) => i.hash(state),
        Value::Double(d) => {
            if d.fract() == 0.0 && *d >= i64::min_value() as f64 && *d <= i64::max_value() as f64 {
                (*d as i64).hash(state)
            } else {
                d.to_bits().hash(state)
            }
        }
        Value::String(s) => s.hash(state),
        Value::Array(items) => {
            for item in items.iter() {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            let mut combined = 0u64;
            for (key, member) in map.iter() {
                let mut entry_hasher = DefaultHasher::new();
                key.hash(&mut entry_hasher);
                hash_value(member, &mut entry_hasher);
                combined ^= entry_hasher.finish();
            }
            state.write_u64(combined);
        }
    }
}

impl fmt::Display for Value {
    /// Compact JSON rendition; the full encoder lives in `crate::encoder`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::encoder::encode_compact(self))
    }
}

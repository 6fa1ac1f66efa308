use serde::{Deserialize, Serialize};

/// Kind of payload a signal carries, fixed at declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Single logic bit
    Bit,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point value
    Real,
    /// Bit vector of the given width (1..=64)
    Vector(u8),
    /// Text
    Str,
}

impl ValueKind {
    /// Whether values of this kind have a boolean interpretation and can
    /// therefore be waited on for rising/falling edges.
    pub fn supports_edges(&self) -> bool {
        matches!(self, ValueKind::Bit | ValueKind::Int | ValueKind::Vector(_))
    }

    /// Bit width as declared in waveform dumps.
    pub fn width(&self) -> u32 {
        match self {
            ValueKind::Bit => 1,
            ValueKind::Int | ValueKind::Real => 64,
            ValueKind::Vector(width) => u32::from(*width),
            ValueKind::Str => 0,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Bit => write!(f, "bit"),
            ValueKind::Int => write!(f, "int"),
            ValueKind::Real => write!(f, "real"),
            ValueKind::Vector(width) => write!(f, "vector[{}]", width),
            ValueKind::Str => write!(f, "str"),
        }
    }
}

/// Payload carried by a signal.
///
/// The kernel only compares values for equality and, for edge-capable
/// kinds, interprets them as booleans. Equality is reflexive: a NaN real
/// equals another NaN, so rewriting NaN is not a change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Bit(bool),
    Int(i64),
    Real(f64),
    Vector { width: u8, bits: u64 },
    Str(String),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bit(a), Value::Bit(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b || (a.is_nan() && b.is_nan()),
            (
                Value::Vector { width: wa, bits: ba },
                Value::Vector { width: wb, bits: bb },
            ) => wa == wb && ba == bb,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Create a bit vector, masking `bits` to `width`.
    pub fn vector(width: u8, bits: u64) -> Self {
        let width = width.clamp(1, 64);
        let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
        Value::Vector { width, bits: bits & mask }
    }

    /// The default (reset) value for a kind.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bit => Value::Bit(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Real => Value::Real(0.0),
            ValueKind::Vector(width) => Value::vector(width, 0),
            ValueKind::Str => Value::Str(String::new()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bit(_) => ValueKind::Bit,
            Value::Int(_) => ValueKind::Int,
            Value::Real(_) => ValueKind::Real,
            Value::Vector { width, .. } => ValueKind::Vector(*width),
            Value::Str(_) => ValueKind::Str,
        }
    }

    /// Boolean interpretation used for edge detection; `None` for kinds
    /// without one.
    pub fn truthy(&self) -> Option<bool> {
        match self {
            Value::Bit(bit) => Some(*bit),
            Value::Int(value) => Some(*value != 0),
            Value::Vector { bits, .. } => Some(*bits != 0),
            Value::Real(_) | Value::Str(_) => None,
        }
    }

    pub fn as_bit(&self) -> Option<bool> {
        match self {
            Value::Bit(bit) => Some(*bit),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bits(&self) -> Option<u64> {
        match self {
            Value::Vector { bits, .. } => Some(*bits),
            Value::Bit(bit) => Some(u64::from(*bit)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bit(bit) => write!(f, "{}", u8::from(*bit)),
            Value::Int(value) => write!(f, "{}", value),
            Value::Real(value) => write!(f, "{}", value),
            Value::Vector { width, bits } => {
                write!(f, "{}'b{:0w$b}", width, bits, w = usize::from(*width))
            }
            Value::Str(text) => write!(f, "\"{}\"", text),
        }
    }
}

impl From<bool> for Value {
    fn from(bit: bool) -> Self {
        Value::Bit(bit)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Str(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Str(text)
    }
}

use std::{borrow::Cow, fmt, sync::Arc};

/// The storage type of a field.
///
/// Booleans are carried as `Long` fields: zero is false, anything else is true.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Long,
    Double,
}

/// A single numeric field value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Long(i64),
    Double(f64),
}

impl Value {
    pub fn field_type(self) -> FieldType {
        match self {
            Value::Long(_) => FieldType::Long,
            Value::Double(_) => FieldType::Double,
        }
    }

    /// Narrows the value to an integer, truncating doubles.
    pub fn as_long(self) -> i64 {
        match self {
            Value::Long(v) => v,
            Value::Double(v) => v as i64,
        }
    }

    pub fn as_double(self) -> f64 {
        match self {
            Value::Long(v) => v as f64,
            Value::Double(v) => v,
        }
    }

    pub fn as_bool(self) -> bool {
        match self {
            Value::Long(v) => v != 0,
            Value::Double(v) => v != 0.0,
        }
    }

    /// Converts the value to the given storage type.
    pub fn coerce(self, field_type: FieldType) -> Value {
        match field_type {
            FieldType::Long => Value::Long(self.as_long()),
            FieldType::Double => Value::Double(self.as_double()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self { Value::Long(v) }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self { Value::Long(v as i64) }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Double(v) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Long(v as i64) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Long(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
        }
    }
}

/// A named, typed numeric slot in a fixed schema.
///
/// Most fields are `StandardField` constants, but any type can act as a field so long as its
/// default value matches its declared type.
pub trait Field: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn field_type(&self) -> FieldType;

    fn default_value(&self) -> Value;
}

/// A shared handle to a field.
pub type FieldRef = Arc<dyn Field>;

/// Whether two fields describe the same slot.
pub fn same_field(a: &dyn Field, b: &dyn Field) -> bool { a.name() == b.name() && a.field_type() == b.field_type() }

/// Compares two values, doubles by bit pattern so that `NaN` equals itself.
pub fn same_value(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
        (a, b) => a == b,
    }
}

/// The stock `Field` implementation.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardField {
    name: Cow<'static, str>,
    default: Value,
}

impl StandardField {
    pub const fn long(name: &'static str, default: i64) -> StandardField {
        StandardField {
            name: Cow::Borrowed(name),
            default: Value::Long(default),
        }
    }

    pub const fn double(name: &'static str, default: f64) -> StandardField {
        StandardField {
            name: Cow::Borrowed(name),
            default: Value::Double(default),
        }
    }

    pub const fn boolean(name: &'static str, default: bool) -> StandardField {
        StandardField {
            name: Cow::Borrowed(name),
            default: Value::Long(default as i64),
        }
    }

    /// Creates a field whose name is only known at runtime.
    pub fn new<N: Into<String>>(name: N, default: Value) -> StandardField {
        StandardField {
            name: Cow::Owned(name.into()),
            default,
        }
    }

    pub fn into_ref(self) -> FieldRef { Arc::new(self) }
}

impl Field for StandardField {
    fn name(&self) -> &str { &self.name }

    fn field_type(&self) -> FieldType { self.default.field_type() }

    fn default_value(&self) -> Value { self.default }
}

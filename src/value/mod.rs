//! Typed extraction from `sea_query::Value` and JSON-to-value conversion.
//!
//! Records carry raw `sea_query::Value`s exactly as the repository produced
//! them. [`TryGetable`] turns one of those into a Rust type, widening integer
//! and float variants where that cannot lose information.

use sea_query::Value;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null (None variant)
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch { expected: String, actual: String },
    /// Value conversion failed (e.g., overflow)
    ConversionError(String),
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {expected}, got {actual}")
            }
            ValueExtractionError::ConversionError(msg) => write!(f, "Conversion error: {msg}"),
        }
    }
}

impl std::error::Error for ValueExtractionError {}

impl From<ValueExtractionError> for crate::error::FinderError {
    fn from(err: ValueExtractionError) -> Self {
        crate::error::FinderError::ParseError(err.to_string())
    }
}

fn mismatch(expected: &str, actual: &Value) -> ValueExtractionError {
    ValueExtractionError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{actual:?}"),
    }
}

/// Error-aware extraction of a Rust value from a `sea_query::Value`
///
/// ```rust
/// use lifeguard_finders::{TryGetable, ValueExtractionError};
/// use sea_query::Value;
///
/// assert_eq!(i64::try_get(&Value::Int(Some(42))), Ok(42));
/// assert_eq!(i64::try_get(&Value::Int(None)), Err(ValueExtractionError::NullValue));
/// assert_eq!(Option::<i64>::try_get(&Value::Int(None)), Ok(None));
/// ```
pub trait TryGetable: Sized {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError>;
}

impl TryGetable for bool {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bool(Some(v)) => Ok(*v),
            Value::Bool(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Bool", value)),
        }
    }
}

impl TryGetable for i64 {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::TinyInt(Some(v)) => Ok(i64::from(*v)),
            Value::SmallInt(Some(v)) => Ok(i64::from(*v)),
            Value::Int(Some(v)) => Ok(i64::from(*v)),
            Value::BigInt(Some(v)) => Ok(*v),
            Value::TinyUnsigned(Some(v)) => Ok(i64::from(*v)),
            Value::SmallUnsigned(Some(v)) => Ok(i64::from(*v)),
            Value::Unsigned(Some(v)) => Ok(i64::from(*v)),
            Value::BigUnsigned(Some(v)) => i64::try_from(*v).map_err(|_| {
                ValueExtractionError::ConversionError(format!("{v} exceeds i64::MAX"))
            }),
            Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("integer", value)),
        }
    }
}

impl TryGetable for i32 {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        let wide = i64::try_get(value)?;
        i32::try_from(wide).map_err(|_| {
            ValueExtractionError::ConversionError(format!("{wide} does not fit in i32"))
        })
    }
}

impl TryGetable for i16 {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        let wide = i64::try_get(value)?;
        i16::try_from(wide).map_err(|_| {
            ValueExtractionError::ConversionError(format!("{wide} does not fit in i16"))
        })
    }
}

impl TryGetable for f64 {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Double(Some(v)) => Ok(*v),
            Value::Float(Some(v)) => Ok(f64::from(*v)),
            Value::Double(None) | Value::Float(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Double or Float", value)),
        }
    }
}

impl TryGetable for String {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::String(Some(v)) => Ok(v.to_string()),
            Value::Char(Some(c)) => Ok(c.to_string()),
            Value::String(None) | Value::Char(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl TryGetable for Vec<u8> {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bytes(Some(v)) => Ok(v.to_vec()),
            Value::Bytes(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Bytes", value)),
        }
    }
}

impl TryGetable for serde_json::Value {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Json(Some(v)) => Ok(serde_json::Value::clone(v)),
            Value::Json(None) => Err(ValueExtractionError::NullValue),
            _ => Err(mismatch("Json", value)),
        }
    }
}

impl<T: TryGetable> TryGetable for Option<T> {
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        match T::try_get(value) {
            Ok(v) => Ok(Some(v)),
            Err(ValueExtractionError::NullValue) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Convert a loosely-typed JSON scalar or document into a bind value.
///
/// Integers become `BigInt` (or `BigUnsigned` above `i64::MAX`), other numbers
/// `Double`, `null` a null `String`, arrays and objects a `Json` document.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::String(None),
        serde_json::Value::Bool(b) => Value::from(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::from(s),
        doc @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => Value::from(doc),
    }
}

/// Whether the value is a SQL `NULL` of any type
pub fn is_null(value: &Value) -> bool {
    match value {
        Value::Bool(v) => v.is_none(),
        Value::TinyInt(v) => v.is_none(),
        Value::SmallInt(v) => v.is_none(),
        Value::Int(v) => v.is_none(),
        Value::BigInt(v) => v.is_none(),
        Value::TinyUnsigned(v) => v.is_none(),
        Value::SmallUnsigned(v) => v.is_none(),
        Value::Unsigned(v) => v.is_none(),
        Value::BigUnsigned(v) => v.is_none(),
        Value::Float(v) => v.is_none(),
        Value::Double(v) => v.is_none(),
        Value::String(v) => v.is_none(),
        Value::Char(v) => v.is_none(),
        Value::Bytes(v) => v.is_none(),
        Value::Json(v) => v.is_none(),
        Value::ChronoDate(v) => v.is_none(),
        Value::ChronoDateTime(v) => v.is_none(),
        Value::ChronoDateTimeUtc(v) => v.is_none(),
        Value::Uuid(v) => v.is_none(),
        Value::Decimal(v) => v.is_none(),
        _ => false,
    }
}

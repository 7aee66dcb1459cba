use serde::Serialize;

use crate::error::{CODE_INVALID_ARGUMENT, StmtMiddlewareError};

/// Default long-data threshold in bytes (512 KiB).
pub const DEFAULT_MAX_ALLOWED_PACKET: usize = 512 * 1024;

/// Values that can be stored in a database row or used as query parameters.
///
/// The same enum is used for bind parameters and for materialized cells:
/// ```rust
/// use stmt_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
///
/// `Null` only appears in rows; passing it as a parameter is a binding error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value, bound as an integer
    Bool(bool),
    /// Binary data
    Blob(Vec<u8>),
    /// NULL value
    Null,
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Raw bytes of a text or binary value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RowValues::Text(s) => Some(s.as_bytes()),
            RowValues::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

/// How a parameter is bound on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `i`: integers and booleans
    Integer,
    /// `d`: floating point
    Double,
    /// `s`: text or binary shorter than the packet threshold
    String,
    /// `b`: long data, streamed in chunks after binding
    Blob,
}

impl TypeTag {
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            TypeTag::Integer => 'i',
            TypeTag::Double => 'd',
            TypeTag::String => 's',
            TypeTag::Blob => 'b',
        }
    }

    #[must_use]
    pub fn is_long_data(self) -> bool {
        self == TypeTag::Blob
    }
}

/// Render a tag sequence as its compact signature, e.g. `"isdb"`.
#[must_use]
pub fn tag_signature(tags: &[TypeTag]) -> String {
    tags.iter().map(|t| t.as_char()).collect()
}

/// Classify one parameter against the long-data threshold.
///
/// # Errors
/// Returns `StmtMiddlewareError::ExecutionError` for `Null`, which has no bind type.
pub fn classify(
    index: usize,
    value: &RowValues,
    max_allowed_packet: usize,
) -> Result<TypeTag, StmtMiddlewareError> {
    match value {
        RowValues::Int(_) | RowValues::Bool(_) => Ok(TypeTag::Integer),
        RowValues::Float(_) => Ok(TypeTag::Double),
        RowValues::Text(s) if s.len() >= max_allowed_packet => Ok(TypeTag::Blob),
        RowValues::Blob(b) if b.len() >= max_allowed_packet => Ok(TypeTag::Blob),
        RowValues::Text(_) | RowValues::Blob(_) => Ok(TypeTag::String),
        RowValues::Null => Err(StmtMiddlewareError::execution(
            format!("invalid param type at index {index}"),
            CODE_INVALID_ARGUMENT,
        )),
    }
}

/// Classify a whole parameter slice in positional order.
///
/// # Errors
/// Fails on the first parameter that [`classify`] rejects.
pub fn classify_params(
    params: &[RowValues],
    max_allowed_packet: usize,
) -> Result<Vec<TypeTag>, StmtMiddlewareError> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| classify(i, p, max_allowed_packet))
        .collect()
}

/// Number of chunks needed to stream `len` bytes with the given threshold.
#[must_use]
pub fn chunk_count(len: usize, max_allowed_packet: usize) -> usize {
    len.div_ceil(max_allowed_packet)
}

use rusqlite::types::Value;

use crate::error::{CODE_INVALID_ARGUMENT, StmtMiddlewareError};
use crate::types::{RowValues, TypeTag};

/// Where a long-data parameter's chunks accumulate until execute.
#[derive(Debug)]
pub(crate) struct LongData {
    pub(crate) as_text: bool,
    pub(crate) buf: Vec<u8>,
}

impl LongData {
    pub(crate) fn into_value(self, index: usize) -> Result<Value, StmtMiddlewareError> {
        if self.as_text {
            let text = String::from_utf8(self.buf).map_err(|e| {
                StmtMiddlewareError::execution(
                    format!("long data parameter {index} is not valid UTF-8: {e}"),
                    CODE_INVALID_ARGUMENT,
                )
            })?;
            Ok(Value::Text(text))
        } else {
            Ok(Value::Blob(self.buf))
        }
    }
}

/// What a single parameter turns into at bind time.
pub(crate) enum Bound {
    Now(Value),
    Later(LongData),
}

/// Convert one tagged parameter to its `SQLite` binding.
///
/// # Errors
/// Returns `StmtMiddlewareError::ExecutionError` when the tag does not fit the value.
pub(crate) fn bind_value(
    index: usize,
    tag: TypeTag,
    value: &RowValues,
) -> Result<Bound, StmtMiddlewareError> {
    let bound = match (tag, value) {
        (TypeTag::Integer, RowValues::Int(i)) => Bound::Now(Value::Integer(*i)),
        (TypeTag::Integer, RowValues::Bool(b)) => Bound::Now(Value::Integer(i64::from(*b))),
        (TypeTag::Double, RowValues::Float(f)) => Bound::Now(Value::Real(*f)),
        (TypeTag::String, RowValues::Text(s)) => Bound::Now(Value::Text(s.clone())),
        (TypeTag::String, RowValues::Blob(b)) => Bound::Now(Value::Blob(b.clone())),
        (TypeTag::Blob, RowValues::Text(_)) => Bound::Later(LongData {
            as_text: true,
            buf: Vec::new(),
        }),
        (TypeTag::Blob, RowValues::Blob(_)) => Bound::Later(LongData {
            as_text: false,
            buf: Vec::new(),
        }),
        (tag, value) => {
            return Err(StmtMiddlewareError::execution(
                format!(
                    "parameter {index} tagged '{}' cannot bind {value:?}",
                    tag.as_char()
                ),
                CODE_INVALID_ARGUMENT,
            ));
        }
    };
    Ok(bound)
}

/// Convert a `SQLite` cell back to a middleware value.
#[must_use]
pub fn sqlite_value_to_row_value(value: Value) -> RowValues {
    match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_bind_as_integers() {
        match bind_value(0, TypeTag::Integer, &RowValues::Bool(true)).unwrap() {
            Bound::Now(Value::Integer(1)) => {}
            _ => panic!("expected integer 1"),
        }
    }

    #[test]
    fn long_text_waits_for_chunks() {
        let bound = bind_value(2, TypeTag::Blob, &RowValues::Text("x".into())).unwrap();
        let Bound::Later(mut long) = bound else {
            panic!("expected deferred binding");
        };
        long.buf.extend_from_slice("héllo".as_bytes());
        assert_eq!(long.into_value(2).unwrap(), Value::Text("héllo".into()));
    }

    #[test]
    fn mismatched_tag_is_rejected() {
        let err = bind_value(1, TypeTag::Double, &RowValues::Int(3)).err().unwrap();
        assert!(err.message().contains("parameter 1"));
    }
}

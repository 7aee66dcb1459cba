use thiserror::Error;

/// Code used for failures detected on the client side before the driver is involved.
pub const CODE_INVALID_ARGUMENT: i32 = -1;
/// Code used for driver failures that carry no code of their own.
pub const CODE_DRIVER_FAILURE: i32 = -2;

#[derive(Debug, Error)]
pub enum StmtMiddlewareError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error ({code}): {message}")]
    ConnectionError { message: String, code: i32 },

    #[error("SQL execution error ({code}): {message}")]
    ExecutionError { message: String, code: i32 },
}

impl StmtMiddlewareError {
    /// Connection failure detected while validating options.
    pub fn invalid_connect_param(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
            code: CODE_INVALID_ARGUMENT,
        }
    }

    /// Statement-level failure reported by a driver.
    pub fn execution(message: impl Into<String>, code: i32) -> Self {
        Self::ExecutionError {
            message: message.into(),
            code,
        }
    }

    pub(crate) fn closed() -> Self {
        Self::ConnectionError {
            message: "connection is closed".into(),
            code: CODE_DRIVER_FAILURE,
        }
    }

    /// Integer code carried by the error; configuration errors report [`CODE_INVALID_ARGUMENT`].
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::ConfigError(_) => CODE_INVALID_ARGUMENT,
            Self::ConnectionError { code, .. } | Self::ExecutionError { code, .. } => *code,
        }
    }

    /// Diagnostic text without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ConfigError(message)
            | Self::ConnectionError { message, .. }
            | Self::ExecutionError { message, .. } => message,
        }
    }
}

#[cfg(feature = "sqlite")]
pub(crate) fn sqlite_code(err: &rusqlite::Error) -> i32 {
    match err {
        rusqlite::Error::SqliteFailure(ffi_err, _) => ffi_err.extended_code,
        _ => CODE_DRIVER_FAILURE,
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StmtMiddlewareError {
    fn from(err: rusqlite::Error) -> Self {
        let code = sqlite_code(&err);
        StmtMiddlewareError::ExecutionError {
            message: err.to_string(),
            code,
        }
    }
}

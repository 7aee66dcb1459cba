use std::fmt;

use tracing::{debug, warn};

use crate::config::ConnectOptions;
use crate::driver::Driver;
use crate::error::StmtMiddlewareError;
use crate::types::DEFAULT_MAX_ALLOWED_PACKET;

/// A single live database link plus the metadata of the last executed statement.
///
/// Every method takes `&mut self`; share a connection across threads only
/// behind your own lock, or give each worker its own.
pub struct Connection<D: Driver> {
    pub(crate) link: Option<D>,
    pub(crate) max_allowed_packet: usize,
    pub(crate) last_affected_rows: Option<u64>,
    pub(crate) last_insert_id: Option<u64>,
}

impl<D: Driver> Connection<D> {
    /// Validate `opts` and open a link through the driver.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConnectionError` if validation fails or the driver refuses.
    pub fn connect(opts: &ConnectOptions) -> Result<Self, StmtMiddlewareError> {
        opts.validate()?;
        debug!(host = %opts.host, user = %opts.user, port = opts.port, "connecting");
        let link = D::connect(opts)?;
        Ok(Self {
            link: Some(link),
            max_allowed_packet: opts.max_allowed_packet,
            last_affected_rows: None,
            last_insert_id: None,
        })
    }

    /// Wrap an already-open driver link.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConfigError` if `max_allowed_packet` is zero.
    pub fn from_driver(link: D, max_allowed_packet: usize) -> Result<Self, StmtMiddlewareError> {
        if max_allowed_packet == 0 {
            return Err(StmtMiddlewareError::ConfigError(
                "max_allowed_packet must be at least 1 byte".into(),
            ));
        }
        Ok(Self {
            link: Some(link),
            max_allowed_packet,
            last_affected_rows: None,
            last_insert_id: None,
        })
    }

    /// Wrap a driver link with the default 512 KiB threshold.
    #[must_use]
    pub fn with_default_packet(link: D) -> Self {
        Self {
            link: Some(link),
            max_allowed_packet: DEFAULT_MAX_ALLOWED_PACKET,
            last_affected_rows: None,
            last_insert_id: None,
        }
    }

    /// Release the link. Calling this again is a no-op.
    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            if let Err(e) = link.close() {
                warn!(error = %e, "error while closing connection");
            }
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.link.is_none()
    }

    /// Affected-row count of the most recent successful statement.
    #[must_use]
    pub fn last_affected_rows(&self) -> Option<u64> {
        self.last_affected_rows
    }

    /// Generated id of the most recent successful statement (0 if none was generated).
    #[must_use]
    pub fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }

    #[must_use]
    pub fn max_allowed_packet(&self) -> usize {
        self.max_allowed_packet
    }

    /// Change the long-data threshold for subsequent statements.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConfigError` if `bytes` is zero.
    pub fn set_max_allowed_packet(&mut self, bytes: usize) -> Result<(), StmtMiddlewareError> {
        if bytes == 0 {
            return Err(StmtMiddlewareError::ConfigError(
                "max_allowed_packet must be at least 1 byte".into(),
            ));
        }
        self.max_allowed_packet = bytes;
        Ok(())
    }

    /// Borrow the driver link, e.g. to reach backend-specific functionality.
    #[must_use]
    pub fn driver(&self) -> Option<&D> {
        self.link.as_ref()
    }

    pub(crate) fn link_mut(&mut self) -> Result<&mut D, StmtMiddlewareError> {
        self.link.as_mut().ok_or_else(StmtMiddlewareError::closed)
    }
}

impl<D: Driver> fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("open", &self.link.is_some())
            .field("max_allowed_packet", &self.max_allowed_packet)
            .field("last_affected_rows", &self.last_affected_rows)
            .field("last_insert_id", &self.last_insert_id)
            .finish()
    }
}

//! Connection options: parsing, building, and validation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::StmtMiddlewareError;
use crate::types::DEFAULT_MAX_ALLOWED_PACKET;

pub const DEFAULT_PORT: u16 = 3306;

/// Options for opening a [`crate::Connection`].
///
/// Build them fluently, parse a delimited string, or deserialize a string map:
/// ```rust
/// use stmt_middleware::prelude::*;
///
/// let opts: ConnectOptions = "host=localhost; user=app; db=sessions; port=3307"
///     .parse()
///     .unwrap();
/// assert_eq!(opts.port, 3307);
///
/// let same = ConnectOptions::new("localhost", "app").database("sessions").port(3307);
/// assert_eq!(same.database, opts.database);
/// ```
#[derive(Clone, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>")]
pub struct ConnectOptions {
    pub host: String,
    pub user: String,
    password: String,
    pub database: String,
    pub port: u16,
    /// Client flags handed to the driver as-is.
    pub flags: i32,
    /// Driver-specific options, applied in key order.
    pub options: BTreeMap<String, String>,
    /// Long-data threshold in bytes.
    pub max_allowed_packet: usize,
}

impl ConnectOptions {
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: String::new(),
            database: String::new(),
            port: DEFAULT_PORT,
            flags: 0,
            options: BTreeMap::new(),
            max_allowed_packet: DEFAULT_MAX_ALLOWED_PACKET,
        }
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn max_allowed_packet(mut self, bytes: usize) -> Self {
        self.max_allowed_packet = bytes;
        self
    }

    /// Password for drivers that authenticate; never shown by `Debug`.
    #[must_use]
    pub fn password_str(&self) -> &str {
        &self.password
    }

    /// Build options from key/value pairs. Values are trimmed and empty values
    /// count as absent.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConnectionError` if the result fails [`Self::validate`].
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, StmtMiddlewareError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value = value.as_ref().trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            map.insert(key.to_owned(), value.to_owned());
        }
        Self::from_map(map)
    }

    fn from_map(mut map: BTreeMap<String, String>) -> Result<Self, StmtMiddlewareError> {
        let host = map.remove("host").unwrap_or_default();
        let user = take_first(&mut map, &["user", "username"]).unwrap_or_default();
        let password = take_first(&mut map, &["pass", "password"]).unwrap_or_default();
        let database = take_first(&mut map, &["db", "dbname"]).unwrap_or_default();

        let port = match map.remove("port") {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };
        let flags = match map.remove("flags") {
            Some(raw) => raw.parse::<i32>().map_err(|_| {
                StmtMiddlewareError::invalid_connect_param("flags must be an integer")
            })?,
            None => 0,
        };
        let max_allowed_packet = match map.remove("max_allowed_packet") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                StmtMiddlewareError::invalid_connect_param(
                    "max_allowed_packet must be a positive integer",
                )
            })?,
            None => DEFAULT_MAX_ALLOWED_PACKET,
        };

        let opts = Self {
            host,
            user,
            password,
            database,
            port,
            flags,
            options: map,
            max_allowed_packet,
        };
        opts.validate()?;
        Ok(opts)
    }

    /// Check the options before any link is attempted.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConnectionError` for a missing host or user, a zero
    /// port, or a zero `max_allowed_packet`.
    pub fn validate(&self) -> Result<(), StmtMiddlewareError> {
        if self.host.trim().is_empty() {
            return Err(StmtMiddlewareError::invalid_connect_param(
                "params.host is required",
            ));
        }
        if self.user.trim().is_empty() {
            return Err(StmtMiddlewareError::invalid_connect_param(
                "params.user is required",
            ));
        }
        if self.port == 0 {
            return Err(StmtMiddlewareError::invalid_connect_param(
                "params.port out of range",
            ));
        }
        if self.max_allowed_packet == 0 {
            return Err(StmtMiddlewareError::invalid_connect_param(
                "max_allowed_packet must be at least 1 byte",
            ));
        }
        Ok(())
    }
}

fn take_first(map: &mut BTreeMap<String, String>, keys: &[&str]) -> Option<String> {
    let mut found = None;
    for key in keys {
        if let Some(value) = map.remove(*key) {
            found.get_or_insert(value);
        }
    }
    found
}

fn parse_port(raw: &str) -> Result<u16, StmtMiddlewareError> {
    let out_of_range = || StmtMiddlewareError::invalid_connect_param("params.port out of range");
    let port: i64 = raw.parse().map_err(|_| out_of_range())?;
    if !(1..=65535).contains(&port) {
        return Err(out_of_range());
    }
    u16::try_from(port).map_err(|_| out_of_range())
}

impl FromStr for ConnectOptions {
    type Err = StmtMiddlewareError;

    /// Parse `key=value` pairs separated by `,`, `;` or `|`.
    ///
    /// Pairs that do not split into exactly one key and one non-empty value are skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pairs = s
            .split([',', ';', '|'])
            .filter_map(|part| {
                let mut split = part.split('=');
                match (split.next(), split.next(), split.next()) {
                    (Some(key), Some(value), None) => Some((key, value)),
                    _ => None,
                }
            });
        Self::from_pairs(pairs)
    }
}

impl TryFrom<BTreeMap<String, String>> for ConnectOptions {
    type Error = StmtMiddlewareError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

// Prevent password from being displayed in debug output
impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("flags", &self.flags)
            .field("options", &self.options)
            .field("max_allowed_packet", &self.max_allowed_packet)
            .finish()
    }
}

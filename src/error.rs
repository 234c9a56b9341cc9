//! Unified error types for the scoreboard controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! bring-up path and the control loop's error handling uniform.  Runtime
//! failures (a rejected `save`, a dropped client) are handled where they
//! occur and never reach this type; what does reach it is fatal.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fatal operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Schema or configuration document is unusable.
    Config(ConfigError),
    /// Network link or control server failed.
    Comms(CommsError),
    /// Config file could not be read or written.
    Storage(StorageError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Schema text is malformed (wrong line count, bad kind, bad number).
    Schema(String),
    /// The document failed validation; carries the number of issues found.
    Invalid(usize),
    /// A validated attribute could not be converted to its typed field.
    Field(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(msg) => write!(f, "schema: {msg}"),
            Self::Invalid(n) => write!(f, "document invalid ({n} issue(s))"),
            Self::Field(name) => write!(f, "field {name} missing or malformed"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Communication errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The listen socket could not be bound, even after a retry.
    BindFailed(u16),
    /// Accepting a client failed.
    AcceptFailed,
    /// Writing to the connected client failed.
    SendFailed,
    /// No network association could be established.
    NetworkUnavailable,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BindFailed(port) => write!(f, "could not bind port {port}"),
            Self::AcceptFailed => write!(f, "accept failed"),
            Self::SendFailed => write!(f, "send failed"),
            Self::NetworkUnavailable => write!(f, "network unavailable"),
        }
    }
}

impl std::error::Error for CommsError {}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The file does not exist.
    NotFound,
    /// Reading the file failed.
    ReadFailed,
    /// Writing the file failed.
    WriteFailed,
    /// Copying the current file to its backup name failed.
    BackupFailed,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::BackupFailed => write!(f, "backup failed"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

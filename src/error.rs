//! Unified error types for the WristLink host library.
//!
//! A single top-level `Error` enum that every subsystem converts into, so the
//! binary and the canvas service handle failures uniformly.  All leaf
//! variants are `Copy` so they can be recorded on resource nodes and carried
//! in events without allocation.

use core::fmt;

use crate::rpc::protocol::{ErrorCode, Key, Status};
use crate::rpc::registry::TransactionId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Sending or resending through the gateway failed.
    Gateway(GatewayError),
    /// An inbound frame violated the reply protocol.
    Protocol(ProtocolError),
    /// A device-side resource could not be allocated or updated.
    Resource(ResourceError),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gateway(e) => write!(f, "gateway: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Resource(e) => write!(f, "resource: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No device is connected.
    Disconnected,
    /// The underlying byte channel reported an I/O failure.
    Io,
    /// The frame could not be serialised.
    Encode,
    /// The encoded frame exceeds the configured frame size.
    FrameTooLarge,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "device disconnected"),
            Self::Io => write!(f, "transport I/O failed"),
            Self::Encode => write!(f, "frame encoding failed"),
            Self::FrameTooLarge => write!(f, "frame too large"),
        }
    }
}

impl core::error::Error for LinkError {}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Idle-only registration refused because a transaction is in flight.
    Busy,
    /// The counter wrapped onto an id that is still in flight.  The record
    /// is refused rather than overwriting the live one.
    IdInUse(TransactionId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "link busy"),
            Self::IdInUse(id) => write!(f, "transaction id {id} still in flight"),
        }
    }
}

impl core::error::Error for RegistryError {}

// ---------------------------------------------------------------------------
// Gateway errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayError {
    Registry(RegistryError),
    /// `resend` was asked for an id that is not in flight.
    UnknownTransaction(TransactionId),
    Link(LinkError),
}

impl GatewayError {
    /// True when the failure only means "try again once the link is free".
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::Busy))
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::UnknownTransaction(id) => write!(f, "transaction {id} not in flight"),
            Self::Link(e) => write!(f, "link: {e}"),
        }
    }
}

impl core::error::Error for GatewayError {}

impl From<RegistryError> for GatewayError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<LinkError> for GatewayError {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<GatewayError> for Error {
    fn from(e: GatewayError) -> Self {
        Self::Gateway(e)
    }
}

// ---------------------------------------------------------------------------
// Reply protocol errors
// ---------------------------------------------------------------------------

/// Inbound frames that are negative-acknowledged and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame carries no (unsigned) status field.
    MissingStatus,
    /// An OK/ERR reply without a transaction id.
    MalformedReply { status: Status },
    /// A status value outside the known set.
    UnknownStatus(u32),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStatus => write!(f, "frame without status"),
            Self::MalformedReply { status } => {
                write!(f, "{status:?} reply without transaction id")
            }
            Self::UnknownStatus(s) => write!(f, "unknown status {s}"),
        }
    }
}

impl core::error::Error for ProtocolError {}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Resource errors
// ---------------------------------------------------------------------------

/// Failure recorded by a window's error hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    /// The device answered with status ERR.
    Device(ErrorCode),
    /// A successful allocation reply did not carry the expected id field.
    MissingHandle(Key),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(code) => write!(f, "device error: {code}"),
            Self::MissingHandle(key) => write!(f, "reply missing {key:?}"),
        }
    }
}

impl core::error::Error for ResourceError {}

impl From<ResourceError> for Error {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_frame_size` outside `1..=MAX_FRAME_SIZE`.
    FrameSizeOutOfRange(u32),
    /// The default font name is empty.
    EmptyFont,
    /// The configuration document could not be parsed.
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameSizeOutOfRange(n) => write!(f, "max_frame_size {n} out of range"),
            Self::EmptyFont => write!(f, "default_font must not be empty"),
            Self::Parse => write!(f, "config parse failed"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

//! Wire constants shared with the device application.
//!
//! Every frame is a flat dictionary keyed by the small integers of [`Key`].
//! Requests carry a [`Method`]; replies carry a [`Status`] and, on failure,
//! an [`ErrorCode`].

use core::fmt;

/// Dictionary field identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Key {
    Status = 0,
    ApiVersion = 1,
    ErrorCode = 2,
    ReturnValue = 3,
    TransactionId = 4,
    WindowId = 5,
    TextLayerId = 6,
    MethodId = 7,
    Font = 8,
    BackgroundColor = 9,
    ForegroundColor = 10,
    Text = 11,
    Alignment = 12,
    Rect = 13,
}

impl From<Key> for u32 {
    fn from(key: Key) -> Self {
        key as u32
    }
}

/// Remote operations understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Method {
    NoFunc = 0,
    NewWindow = 1,
    NewTextLayer = 2,
    ApplyAttributes = 3,
    PushWindow = 4,
}

impl Method {
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::NoFunc),
            1 => Some(Self::NewWindow),
            2 => Some(Self::NewTextLayer),
            3 => Some(Self::ApplyAttributes),
            4 => Some(Self::PushWindow),
            _ => None,
        }
    }
}

/// Reply / notification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Status {
    Ok = 0,
    Err = 1,
    Started = 2,
    Stopped = 3,
}

impl Status {
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Ok),
            1 => Some(Self::Err),
            2 => Some(Self::Started),
            3 => Some(Self::Stopped),
            _ => None,
        }
    }
}

/// Device error codes carried in [`Key::ErrorCode`] when status is ERR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NoMemory,
    NoWindow,
    NoLayer,
    InvalidOperation,
    InvalidTransaction,
    /// A code this host does not know, or an ERR reply with no code at all (0).
    Other(u32),
}

impl ErrorCode {
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            1 => Self::NoMemory,
            2 => Self::NoWindow,
            3 => Self::NoLayer,
            4 => Self::InvalidOperation,
            5 => Self::InvalidTransaction,
            other => Self::Other(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::NoMemory => 1,
            Self::NoWindow => 2,
            Self::NoLayer => 3,
            Self::InvalidOperation => 4,
            Self::InvalidTransaction => 5,
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMemory => write!(f, "out of memory"),
            Self::NoWindow => write!(f, "no such window"),
            Self::NoLayer => write!(f, "no such layer"),
            Self::InvalidOperation => write!(f, "invalid operation"),
            Self::InvalidTransaction => write!(f, "invalid transaction"),
            Self::Other(raw) => write!(f, "error code {raw}"),
        }
    }
}

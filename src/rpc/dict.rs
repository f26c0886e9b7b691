//! Flat key → value payload exchanged with the device.
//!
//! Values are one of unsigned integer, byte sequence or string.  Unknown keys
//! survive decoding untouched so replies can carry fields this host does not
//! interpret.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::protocol::Key;

/// A single dictionary value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Uint(u32),
    Bytes(Vec<u8>),
    Str(String),
}

/// Ordered payload dictionary keyed by raw field id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    entries: BTreeMap<u32, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_uint(&mut self, key: Key, value: u32) {
        self.entries.insert(key.into(), Value::Uint(value));
    }

    pub fn insert_bytes(&mut self, key: Key, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), Value::Bytes(value.into()));
    }

    pub fn insert_str(&mut self, key: Key, value: impl Into<String>) {
        self.entries.insert(key.into(), Value::Str(value.into()));
    }

    /// Insert under a raw field id (fields outside [`Key`]).
    pub fn insert_raw(&mut self, key: u32, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn contains(&self, key: Key) -> bool {
        self.entries.contains_key(&u32::from(key))
    }

    pub fn get(&self, key: Key) -> Option<&Value> {
        self.entries.get(&u32::from(key))
    }

    /// The field as an unsigned integer; `None` if absent or differently typed.
    pub fn uint(&self, key: Key) -> Option<u32> {
        match self.get(key) {
            Some(Value::Uint(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn bytes(&self, key: Key) -> Option<&[u8]> {
        match self.get(key) {
            Some(Value::Bytes(v)) => Some(v),
            _ => None,
        }
    }

    pub fn str(&self, key: Key) -> Option<&str> {
        match self.get(key) {
            Some(Value::Str(v)) => Some(v),
            _ => None,
        }
    }

    /// Text carried either as a string or as UTF-8 bytes.
    pub fn text(&self, key: Key) -> Option<String> {
        match self.get(key) {
            Some(Value::Str(s)) => Some(s.clone()),
            Some(Value::Bytes(b)) => core::str::from_utf8(b).ok().map(String::from),
            _ => None,
        }
    }

    pub fn remove(&mut self, key: Key) -> Option<Value> {
        self.entries.remove(&u32::from(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

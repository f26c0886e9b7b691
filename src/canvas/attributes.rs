//! Attribute diffing.
//!
//! Each attribute keeps the locally desired value and a `changed` flag
//! relative to what the device last confirmed.  Setters raise the flag only
//! when the value actually differs; a sync round-trip lowers it by comparing
//! against the values the device echoes back, so the device's answer (not
//! the host's write) decides whether a field is still dirty.

use alloc::string::String;

use crate::rpc::dict::Dictionary;
use crate::rpc::protocol::Key;

// ── Tracked value ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked<T> {
    value: T,
    changed: bool,
}

impl<T: PartialEq> Tracked<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value,
            changed: false,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Replace the value and raise the flag iff it differs from the current
    /// one.  Returns whether the value changed.
    pub fn mark_if_changed(&mut self, value: T) -> bool {
        if value == self.value {
            return false;
        }
        self.value = value;
        self.changed = true;
        true
    }

    /// Settle the flag after a round-trip: clean iff the device agrees.
    pub fn confirm(&mut self, device_agrees: bool) {
        self.changed = !device_agrees;
    }
}

// ── Enumerations ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    White,
    Clear,
}

impl Color {
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Black => 0,
            Self::White => 1,
            Self::Clear => u32::MAX,
        }
    }

    pub const fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Black),
            1 => Some(Self::White),
            u32::MAX => Some(Self::Clear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Alignment {
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Alignment {
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    pub const fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Left),
            1 => Some(Self::Center),
            2 => Some(Self::Right),
            _ => None,
        }
    }
}

// ── Text attributes ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAttributes {
    pub text: Tracked<String>,
    pub font: Tracked<String>,
    pub foreground: Tracked<Color>,
    pub background: Tracked<Color>,
    pub alignment: Tracked<Alignment>,
}

impl TextAttributes {
    /// Black on white, left aligned, empty text; nothing pending.
    pub fn new(font: impl Into<String>) -> Self {
        Self {
            text: Tracked::new(String::new()),
            font: Tracked::new(font.into()),
            foreground: Tracked::new(Color::Black),
            background: Tracked::new(Color::White),
            alignment: Tracked::new(Alignment::Left),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.text.is_changed()
            || self.font.is_changed()
            || self.foreground.is_changed()
            || self.background.is_changed()
            || self.alignment.is_changed()
    }

    /// Write only the changed fields into `payload`.
    pub fn write_diff(&self, payload: &mut Dictionary) {
        if self.foreground.is_changed() {
            payload.insert_uint(Key::ForegroundColor, self.foreground.get().as_u32());
        }
        if self.background.is_changed() {
            payload.insert_uint(Key::BackgroundColor, self.background.get().as_u32());
        }
        if self.font.is_changed() {
            payload.insert_str(Key::Font, self.font.get().as_str());
        }
        if self.alignment.is_changed() {
            payload.insert_uint(Key::Alignment, self.alignment.get().as_u32());
        }
        if self.text.is_changed() {
            payload.insert_bytes(Key::Text, self.text.get().as_bytes());
        }
    }

    /// Recompute each flag from the device's reply.  Fields the reply does
    /// not echo are judged against the request that was sent; fields in
    /// neither are left alone.
    pub fn confirm(&mut self, echo: &Dictionary, request: &Dictionary) {
        let source = |key: Key| {
            if echo.contains(key) {
                Some(echo)
            } else if request.contains(key) {
                Some(request)
            } else {
                None
            }
        };

        if let Some(d) = source(Key::ForegroundColor) {
            let agrees = d.uint(Key::ForegroundColor) == Some(self.foreground.get().as_u32());
            self.foreground.confirm(agrees);
        }
        if let Some(d) = source(Key::BackgroundColor) {
            let agrees = d.uint(Key::BackgroundColor) == Some(self.background.get().as_u32());
            self.background.confirm(agrees);
        }
        if let Some(d) = source(Key::Alignment) {
            let agrees = d.uint(Key::Alignment) == Some(self.alignment.get().as_u32());
            self.alignment.confirm(agrees);
        }
        if let Some(d) = source(Key::Font) {
            let agrees = d.text(Key::Font).as_deref() == Some(self.font.get().as_str());
            self.font.confirm(agrees);
        }
        if let Some(d) = source(Key::Text) {
            let agrees = d.text(Key::Text).as_deref() == Some(self.text.get().as_str());
            self.text.confirm(agrees);
        }
    }
}

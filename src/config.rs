//! Link configuration
//!
//! Every tunable of the host side.  Loaded from a JSON document; missing
//! fields take their defaults.

use alloc::string::String;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::rpc::codec::MAX_FRAME_SIZE;
use crate::rpc::registry::TransactionIds;

/// UUID of the canvas application on the device.
pub const CANVAS_APP_UUID: Uuid = Uuid::from_u128(0x9312_d524_6e77_47e4_96ed_e67b_d11c_e1d5);

/// Font given to new text layers unless configured otherwise.
pub const DEFAULT_FONT: &str = "Raster Gothic 14-point Boldface";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Device application every frame is addressed to
    pub app_uuid: Uuid,
    /// First transaction id issued; `None` seeds from process entropy
    pub transaction_id_seed: Option<u32>,
    /// Font for new text layers
    pub default_font: String,
    /// Largest framed payload accepted or produced (bytes)
    pub max_frame_size: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            app_uuid: CANVAS_APP_UUID,
            transaction_id_seed: None,
            default_font: DEFAULT_FONT.into(),
            max_frame_size: 1024,
        }
    }
}

impl LinkConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_size == 0 || self.max_frame_size as usize > MAX_FRAME_SIZE {
            return Err(ConfigError::FrameSizeOutOfRange(self.max_frame_size));
        }
        if self.default_font.is_empty() {
            return Err(ConfigError::EmptyFont);
        }
        Ok(())
    }

    /// Transaction id counter for a new gateway.
    pub fn ids(&self) -> TransactionIds {
        match self.transaction_id_seed {
            Some(seed) => TransactionIds::starting_at(seed),
            None => TransactionIds::from_entropy(),
        }
    }

    pub fn frame_limit(&self) -> usize {
        self.max_frame_size as usize
    }
}

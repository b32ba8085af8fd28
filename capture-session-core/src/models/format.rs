use serde::{Deserialize, Serialize};

use super::audio_models::{channel_mask, Encoding};

/// Bits of [`CaptureFormat::property_set_mask`].
pub const PROPERTY_ENCODING: u8 = 0x1;
pub const PROPERTY_SAMPLE_RATE: u8 = 0x2;
pub const PROPERTY_CHANNEL_MASK: u8 = 0x4;
pub const PROPERTY_CHANNEL_INDEX_MASK: u8 = 0x8;

/// Requested sample format.
///
/// Fields left unset keep their zero value; `property_set_mask` records which
/// ones the caller chose explicitly so defaults can be applied later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptureFormat {
    pub encoding: Encoding,
    pub sample_rate: i32,
    pub channel_mask: i32,
    pub channel_index_mask: i32,
    pub property_set_mask: u8,
}

impl CaptureFormat {
    pub fn builder() -> CaptureFormatBuilder {
        CaptureFormatBuilder::default()
    }

    pub fn has(&self, property: u8) -> bool {
        self.property_set_mask & property != 0
    }

    /// Channel count implied by the mask (or, failing that, the index mask).
    pub fn channel_count(&self) -> usize {
        if self.channel_mask != channel_mask::INVALID {
            channel_mask::channel_count(self.channel_mask)
        } else {
            channel_mask::channel_count(self.channel_index_mask)
        }
    }

    /// Copy into a builder for modification.
    pub fn to_builder(&self) -> CaptureFormatBuilder {
        CaptureFormatBuilder { format: *self }
    }
}

/// Fluent builder for [`CaptureFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureFormatBuilder {
    format: CaptureFormat,
}

impl CaptureFormatBuilder {
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.format.encoding = encoding;
        self.format.property_set_mask |= PROPERTY_ENCODING;
        self
    }

    pub fn sample_rate(mut self, rate: i32) -> Self {
        self.format.sample_rate = rate;
        self.format.property_set_mask |= PROPERTY_SAMPLE_RATE;
        self
    }

    pub fn channel_mask(mut self, mask: i32) -> Self {
        self.format.channel_mask = mask;
        self.format.property_set_mask |= PROPERTY_CHANNEL_MASK;
        self
    }

    pub fn channel_index_mask(mut self, mask: i32) -> Self {
        self.format.channel_index_mask = mask;
        self.format.property_set_mask |= PROPERTY_CHANNEL_INDEX_MASK;
        self
    }

    pub fn build(self) -> CaptureFormat {
        self.format
    }
}

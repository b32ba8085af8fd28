use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Capture source (preset) requested by the application.
///
/// Kept as an open integer newtype: the native layer and vendor extensions
/// use codes outside the enumerated range, and validation has to see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioSource(pub i32);

impl AudioSource {
    pub const DEFAULT: Self = Self(0);
    pub const MIC: Self = Self(1);
    pub const VOICE_UPLINK: Self = Self(2);
    pub const VOICE_DOWNLINK: Self = Self(3);
    pub const VOICE_CALL: Self = Self(4);
    pub const CAMCORDER: Self = Self(5);
    pub const VOICE_RECOGNITION: Self = Self(6);
    pub const VOICE_COMMUNICATION: Self = Self(7);
    pub const REMOTE_SUBMIX: Self = Self(8);
    pub const UNPROCESSED: Self = Self(9);
    pub const VOICE_PERFORMANCE: Self = Self(10);
    pub const VENDOR_CAPTURE: Self = Self(1001);
    pub const RADIO_TUNER: Self = Self(1998);
    pub const HOTWORD: Self = Self(1999);

    /// Highest source in the contiguous enumerated range.
    pub const MAX: Self = Self::VOICE_PERFORMANCE;

    /// Sources outside `0..=MAX` that are still accepted.
    pub const EXTENDED: [Self; 3] = [Self::VENDOR_CAPTURE, Self::RADIO_TUNER, Self::HOTWORD];

    pub fn code(&self) -> i32 {
        self.0
    }

    /// Sources whose reads are additionally gated by the audio-record
    /// restriction.
    pub fn is_record_restricted(&self) -> bool {
        matches!(
            *self,
            Self::MIC | Self::CAMCORDER | Self::UNPROCESSED | Self::VOICE_PERFORMANCE
        )
    }

    /// Sources whose policy denial escalates to a fatal outcome for
    /// application callers.
    pub fn is_privileged(&self) -> bool {
        self.is_record_restricted() || *self == Self::HOTWORD
    }
}

/// Sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encoding(pub i32);

impl Encoding {
    pub const INVALID: Self = Self(0);
    pub const DEFAULT: Self = Self(1);
    pub const PCM_16BIT: Self = Self(2);
    pub const PCM_8BIT: Self = Self(3);
    pub const PCM_FLOAT: Self = Self(4);
    pub const COMPRESSED_FIRST: Self = Self(100);
    pub const COMPRESSED_LAST: Self = Self(105);

    pub fn code(&self) -> i32 {
        self.0
    }

    pub fn is_compressed(&self) -> bool {
        (Self::COMPRESSED_FIRST.0..=Self::COMPRESSED_LAST.0).contains(&self.0)
    }

    /// Bytes per sample for linear PCM encodings, `None` otherwise.
    pub fn bytes_per_sample(&self) -> Option<usize> {
        match *self {
            Self::PCM_8BIT => Some(1),
            Self::DEFAULT | Self::PCM_16BIT => Some(2),
            Self::PCM_FLOAT => Some(4),
            _ => None,
        }
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::INVALID
    }
}

/// Input channel mask constants, including the legacy configuration aliases.
pub mod channel_mask {
    pub const INVALID: i32 = 0;
    pub const IN_DEFAULT: i32 = 1;
    /// Deprecated alias for mono.
    pub const CONFIGURATION_MONO: i32 = 2;
    /// Deprecated alias for stereo.
    pub const CONFIGURATION_STEREO: i32 = 3;
    pub const IN_LEFT: i32 = 0x4;
    pub const IN_RIGHT: i32 = 0x8;
    pub const IN_FRONT: i32 = 0x10;
    pub const IN_BACK: i32 = 0x20;
    pub const IN_MONO: i32 = IN_FRONT;
    pub const IN_STEREO: i32 = IN_LEFT | IN_RIGHT;
    pub const IN_FRONT_BACK: i32 = IN_FRONT | IN_BACK;
    pub const IN_SIX: i32 = 0xFC;

    /// Number of channels described by a positional or index mask.
    pub fn channel_count(mask: i32) -> usize {
        (mask as u32).count_ones() as usize
    }
}

/// Read behaviour for the read family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadMode {
    Blocking,
    NonBlocking,
}

impl ReadMode {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Blocking)
    }
}

impl TryFrom<i32> for ReadMode {
    type Error = CaptureError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Blocking),
            1 => Ok(Self::NonBlocking),
            other => Err(CaptureError::BadValue(format!("invalid read mode {}", other))),
        }
    }
}

/// Synchronisation event for a deferred start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SyncEvent {
    /// Native sync type, 0 = start immediately.
    pub sync_type: i32,
    /// Session whose event triggers the start.
    pub session_id: i32,
}

impl SyncEvent {
    pub const NONE: Self = Self {
        sync_type: 0,
        session_id: 0,
    };
}

/// Transport type for an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioTransportType {
    BuiltIn,
    Bluetooth,
    BluetoothLE,
    Usb,
    Virtual,
    Unknown,
}

/// An audio device known to the device enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDeviceInfo {
    /// Native device id. Zero never names a device.
    pub id: i32,
    pub name: String,
    /// Whether the device can act as a capture source.
    pub is_source: bool,
    pub transport_type: AudioTransportType,
}

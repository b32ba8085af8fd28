//! Pure validation and derivation of capture parameters.
//!
//! Every check returns [`CaptureError::BadValue`] on failure; nothing here
//! touches the native layer or any shared state.

use crate::models::audio_models::{channel_mask, AudioSource, Encoding};
use crate::models::error::CaptureError;
use crate::models::format::{CaptureFormat, PROPERTY_SAMPLE_RATE};

pub const SAMPLE_RATE_HZ_MIN: i32 = 4000;
pub const SAMPLE_RATE_HZ_MAX: i32 = 192_000;

/// Fallback when neither the caller nor the engine provides a rate.
pub const FALLBACK_SAMPLE_RATE_HZ: i32 = 44_100;

pub fn validate_source(source: AudioSource) -> Result<AudioSource, CaptureError> {
    let in_range = source.0 >= 0 && source <= AudioSource::MAX;
    if in_range || AudioSource::EXTENDED.contains(&source) {
        Ok(source)
    } else {
        Err(CaptureError::BadValue(format!("invalid audio source {}", source.0)))
    }
}

pub fn validate_sample_rate(rate: i32) -> Result<i32, CaptureError> {
    if (SAMPLE_RATE_HZ_MIN..=SAMPLE_RATE_HZ_MAX).contains(&rate) {
        Ok(rate)
    } else {
        Err(CaptureError::BadValue(format!("{}Hz is not a supported sample rate", rate)))
    }
}

/// Canonicalize and check the encoding. `DEFAULT` becomes PCM16.
pub fn validate_encoding(encoding: Encoding) -> Result<Encoding, CaptureError> {
    match encoding {
        Encoding::DEFAULT => Ok(Encoding::PCM_16BIT),
        Encoding::PCM_8BIT | Encoding::PCM_16BIT | Encoding::PCM_FLOAT => Ok(encoding),
        e if e.is_compressed() => Ok(e),
        e => Err(CaptureError::BadValue(format!(
            "unsupported sample encoding {}, expected PCM 8-bit, PCM 16-bit or PCM float",
            e.0
        ))),
    }
}

/// Map a legacy channel configuration onto its canonical input mask.
///
/// The deprecated `CONFIGURATION_MONO` / `CONFIGURATION_STEREO` aliases are
/// only honoured when `allow_legacy` is set.
pub fn resolve_channel_mask(config: i32, allow_legacy: bool) -> Result<i32, CaptureError> {
    let mask = match config {
        channel_mask::IN_DEFAULT | channel_mask::CONFIGURATION_MONO | channel_mask::IN_MONO => {
            channel_mask::IN_MONO
        }
        channel_mask::CONFIGURATION_STEREO | channel_mask::IN_STEREO => channel_mask::IN_STEREO,
        channel_mask::IN_FRONT_BACK => channel_mask::IN_FRONT_BACK,
        other => {
            return Err(CaptureError::BadValue(format!(
                "unsupported channel configuration {}",
                other
            )))
        }
    };
    let deprecated = config == channel_mask::CONFIGURATION_MONO
        || config == channel_mask::CONFIGURATION_STEREO;
    if deprecated && !allow_legacy {
        return Err(CaptureError::BadValue(format!(
            "unsupported deprecated channel configuration {}",
            config
        )));
    }
    Ok(mask)
}

/// Channel count for a legacy configuration, as used by the minimum
/// buffer size query.
pub fn channel_count_for_legacy_config(config: i32) -> Result<usize, CaptureError> {
    match config {
        channel_mask::IN_DEFAULT | channel_mask::CONFIGURATION_MONO | channel_mask::IN_MONO => {
            Ok(1)
        }
        channel_mask::CONFIGURATION_STEREO
        | channel_mask::IN_STEREO
        | channel_mask::IN_FRONT_BACK => Ok(2),
        channel_mask::IN_SIX => Ok(6),
        other => Err(CaptureError::BadValue(format!(
            "invalid channel configuration {}",
            other
        ))),
    }
}

/// Frame size in bytes for the given layout.
///
/// Voice-communication captures in anything but PCM16 count one byte per
/// channel, since the native layer frames compressed voice data that way.
pub fn frame_size(
    channel_count: usize,
    encoding: Encoding,
    source: AudioSource,
) -> Result<usize, CaptureError> {
    if source == AudioSource::VOICE_COMMUNICATION && encoding != Encoding::PCM_16BIT {
        return Ok(channel_count);
    }
    let bytes = encoding.bytes_per_sample().ok_or_else(|| {
        CaptureError::BadValue(format!("no frame size for encoding {}", encoding.0))
    })?;
    Ok(channel_count * bytes)
}

pub fn validate_buffer_size(
    size_bytes: i32,
    channel_count: usize,
    encoding: Encoding,
    source: AudioSource,
) -> Result<usize, CaptureError> {
    let frame = frame_size(channel_count, encoding, source)?;
    if size_bytes < 1 || frame == 0 || size_bytes as usize % frame != 0 {
        return Err(CaptureError::BadValue(format!(
            "invalid audio buffer size {} for frame size {}",
            size_bytes, frame
        )));
    }
    Ok(size_bytes as usize)
}

/// One frame of the given format, in bytes.
///
/// The engine may still raise this through its own minimum-size query.
pub fn derive_default_buffer_size(format: &CaptureFormat) -> Result<i32, CaptureError> {
    let encoding = validate_encoding(format.encoding)?;
    let bytes = encoding.bytes_per_sample().ok_or_else(|| {
        CaptureError::BadValue(format!("no default buffer size for encoding {}", encoding.0))
    })?;
    Ok((format.channel_count() * bytes) as i32)
}

/// Explicit rate if the caller set one, else the engine's primary output
/// rate, else 44.1 kHz.
pub fn resolve_sample_rate(format: &CaptureFormat, primary_output_rate: i32) -> i32 {
    if format.has(PROPERTY_SAMPLE_RATE) {
        format.sample_rate
    } else if primary_output_rate > 0 {
        primary_output_rate
    } else {
        FALLBACK_SAMPLE_RATE_HZ
    }
}

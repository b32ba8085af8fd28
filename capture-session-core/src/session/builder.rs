use crate::models::attributes::CaptureAttributes;
use crate::models::audio_models::{channel_mask, AudioSource, Encoding};
use crate::models::config::SessionConfig;
use crate::models::error::{CaptureError, Result};
use crate::models::format::{CaptureFormat, PROPERTY_ENCODING};
use crate::session::capture_session::CaptureSession;
use crate::session::collaborators::Collaborators;
use crate::traits::native_engine::NativeCaptureEngine;
use crate::validation::params;

/// Fluent construction of a [`CaptureSession`].
///
/// Unset format fields default to PCM 16-bit mono, unset attributes to the
/// default capture preset, and an unset buffer size to a single frame. Any
/// failure in [`build`](Self::build) is reported as
/// `UnsupportedConfiguration`.
#[derive(Clone, Default)]
pub struct SessionBuilder {
    attributes: Option<CaptureAttributes>,
    format: Option<CaptureFormat>,
    buffer_size_bytes: i32,
    session_id: i32,
    collaborators: Collaborators,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_audio_source(mut self, source: AudioSource) -> Result<Self> {
        if source.0 < 0 || source > AudioSource::MAX {
            return Err(CaptureError::BadValue(format!("invalid audio source {}", source.0)));
        }
        self.attributes = Some(CaptureAttributes::with_preset(source));
        Ok(self)
    }

    pub fn set_audio_attributes(mut self, attributes: CaptureAttributes) -> Result<Self> {
        if attributes.capture_preset.is_none() {
            return Err(CaptureError::BadValue(
                "no valid capture preset in attributes".into(),
            ));
        }
        self.attributes = Some(attributes);
        Ok(self)
    }

    pub fn set_audio_format(mut self, format: CaptureFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn set_buffer_size_in_bytes(mut self, size: i32) -> Result<Self> {
        if size <= 0 {
            return Err(CaptureError::BadValue(format!("invalid buffer size {}", size)));
        }
        self.buffer_size_bytes = size;
        Ok(self)
    }

    pub fn set_session_id(mut self, session_id: i32) -> Result<Self> {
        if session_id < 0 {
            return Err(CaptureError::BadValue(format!("invalid session id {}", session_id)));
        }
        self.session_id = session_id;
        Ok(self)
    }

    pub fn set_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// The configuration `build` would construct with.
    pub fn config(&self) -> Result<SessionConfig> {
        let format = match self.format {
            None => CaptureFormat::builder()
                .encoding(Encoding::PCM_16BIT)
                .channel_mask(channel_mask::IN_MONO)
                .build(),
            Some(format) => {
                let mut builder = format.to_builder();
                if !format.has(PROPERTY_ENCODING) || format.encoding == Encoding::INVALID {
                    builder = builder.encoding(Encoding::PCM_16BIT);
                }
                if format.channel_mask == channel_mask::INVALID
                    && format.channel_index_mask == channel_mask::INVALID
                {
                    builder = builder.channel_mask(channel_mask::IN_MONO);
                }
                builder.build()
            }
        };
        let attributes = self
            .attributes
            .clone()
            .unwrap_or_else(|| CaptureAttributes::with_preset(AudioSource::DEFAULT));
        let buffer_size_bytes = if self.buffer_size_bytes == 0 {
            params::derive_default_buffer_size(&format)?
        } else {
            self.buffer_size_bytes
        };
        Ok(SessionConfig {
            attributes,
            format,
            buffer_size_bytes,
            session_id: self.session_id,
        })
    }

    pub fn build(self, engine: Box<dyn NativeCaptureEngine>) -> Result<CaptureSession> {
        let unsupported = |e: CaptureError| CaptureError::UnsupportedConfiguration(e.to_string());
        let config = self.config().map_err(unsupported)?;
        let session = CaptureSession::new(config, engine, self.collaborators).map_err(unsupported)?;
        if !session.state().is_initialized() {
            return Err(CaptureError::UnsupportedConfiguration(
                "cannot create capture session".into(),
            ));
        }
        Ok(session)
    }
}

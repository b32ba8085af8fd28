//! # capture-session-loopback
//!
//! Software backend for capture-session-core.
//!
//! Provides:
//! - `LoopbackEngine`: native engine fed by the host through a ring buffer
//! - `StaticPolicy`: policy backend with host-controlled toggles
//! - `StaticDeviceList`: in-memory input device enumeration
//!
//! ## Usage
//! ```ignore
//! use capture_session_core::{AudioSource, Collaborators, ReadMode, SessionBuilder};
//! use capture_session_loopback::LoopbackEngine;
//!
//! let engine = LoopbackEngine::new();
//! let session = SessionBuilder::new()
//!     .set_audio_source(AudioSource::MIC)?
//!     .set_buffer_size_in_bytes(3840)?
//!     .build(Box::new(engine.clone()))?;
//! session.start()?;
//! engine.feed_pcm16(&samples);
//! let read = session.read_shorts(&mut out, 0, out.len(), ReadMode::Blocking)?;
//! ```

pub mod devices;
pub mod engine;
pub mod policy;
pub mod ring_buffer;

pub use devices::StaticDeviceList;
pub use engine::LoopbackEngine;
pub use policy::StaticPolicy;
pub use ring_buffer::RingBuffer;

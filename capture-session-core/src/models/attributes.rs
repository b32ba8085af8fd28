use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::audio_models::AudioSource;

/// Reserved tag that requests remote-submix capture at fixed full volume.
pub const SUBMIX_FIXED_VOLUME: &str = "fixedVolume";

/// Capture attributes: the capture preset plus free-form tags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptureAttributes {
    /// `None` means no capture preset was set.
    pub capture_preset: Option<AudioSource>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl CaptureAttributes {
    pub fn with_preset(source: AudioSource) -> Self {
        Self {
            capture_preset: Some(source),
            tags: BTreeSet::new(),
        }
    }

    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Strip the reserved full-volume tag for remote-submix captures.
    ///
    /// Returns the attributes to hand to the native layer and whether full
    /// volume was requested. Other presets pass through untouched.
    pub fn extract_submix_full_volume(&self) -> (CaptureAttributes, bool) {
        if self.capture_preset != Some(AudioSource::REMOTE_SUBMIX) {
            return (self.clone(), false);
        }
        let mut full_volume = false;
        let mut filtered = CaptureAttributes::with_preset(AudioSource::REMOTE_SUBMIX);
        for tag in &self.tags {
            if tag.eq_ignore_ascii_case(SUBMIX_FIXED_VOLUME) {
                full_volume = true;
            } else {
                filtered.tags.insert(tag.clone());
            }
        }
        (filtered, full_volume)
    }
}

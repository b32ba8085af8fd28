use crate::models::audio_models::AudioDeviceInfo;

/// Resolves native device ids into device descriptors.
pub trait DeviceEnumerator: Send + Sync {
    /// Currently attached input devices.
    fn input_devices(&self) -> Vec<AudioDeviceInfo>;

    fn find_input_device(&self, id: i32) -> Option<AudioDeviceInfo> {
        if id == 0 {
            return None;
        }
        self.input_devices().into_iter().find(|d| d.id == id)
    }
}

/// Enumerator that knows no devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevices;

impl DeviceEnumerator for NoDevices {
    fn input_devices(&self) -> Vec<AudioDeviceInfo> {
        Vec::new()
    }
}

//! In-memory input device list.

use parking_lot::RwLock;

use capture_session_core::{AudioDeviceInfo, AudioTransportType, DeviceEnumerator};

/// Device enumerator over a host-maintained list.
#[derive(Debug, Default)]
pub struct StaticDeviceList {
    devices: RwLock<Vec<AudioDeviceInfo>>,
}

impl StaticDeviceList {
    pub fn new(devices: Vec<AudioDeviceInfo>) -> Self {
        Self {
            devices: RwLock::new(devices),
        }
    }

    /// A single built-in microphone with the given id.
    pub fn built_in(id: i32) -> Self {
        Self::new(vec![AudioDeviceInfo {
            id,
            name: "Built-in Microphone".into(),
            is_source: true,
            transport_type: AudioTransportType::BuiltIn,
        }])
    }

    /// Add or replace the device with the same id.
    pub fn attach(&self, device: AudioDeviceInfo) {
        let mut devices = self.devices.write();
        devices.retain(|d| d.id != device.id);
        devices.push(device);
    }

    pub fn detach(&self, id: i32) -> Option<AudioDeviceInfo> {
        let mut devices = self.devices.write();
        let index = devices.iter().position(|d| d.id == id)?;
        Some(devices.remove(index))
    }
}

impl DeviceEnumerator for StaticDeviceList {
    fn input_devices(&self) -> Vec<AudioDeviceInfo> {
        self.devices
            .read()
            .iter()
            .filter(|d| d.is_source)
            .cloned()
            .collect()
    }
}

use std::sync::Arc;

use crate::models::config::PolicyConfig;
use crate::session::policy_gate::{CallerIdentity, PolicyGate};
use crate::traits::device_enumerator::{DeviceEnumerator, NoDevices};
use crate::traits::dispatch_context::DispatchContext;
use crate::traits::notifier::{LoggingSubmixNotifier, SubmixVolumeNotifier};
use crate::traits::policy::{AllowAllPolicy, PolicyBackend};

/// External services a session talks to, besides its native engine.
#[derive(Clone)]
pub struct Collaborators {
    pub policy: Arc<dyn PolicyBackend>,
    pub policy_config: PolicyConfig,
    pub caller: CallerIdentity,

    /// Package name passed to the native permission check. `None` skips it.
    pub op_package_name: Option<String>,

    pub submix_notifier: Arc<dyn SubmixVolumeNotifier>,
    pub devices: Arc<dyn DeviceEnumerator>,

    /// Context used when a listener is registered without one.
    pub default_context: Option<Arc<dyn DispatchContext>>,
}

impl Collaborators {
    pub fn with_policy(mut self, policy: Arc<dyn PolicyBackend>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_policy_config(mut self, config: PolicyConfig) -> Self {
        self.policy_config = config;
        self
    }

    pub fn with_caller(mut self, caller: CallerIdentity) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.op_package_name = Some(name.into());
        self
    }

    pub fn with_submix_notifier(mut self, notifier: Arc<dyn SubmixVolumeNotifier>) -> Self {
        self.submix_notifier = notifier;
        self
    }

    pub fn with_devices(mut self, devices: Arc<dyn DeviceEnumerator>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_default_context(mut self, context: Arc<dyn DispatchContext>) -> Self {
        self.default_context = Some(context);
        self
    }

    pub(crate) fn policy_gate(&self) -> PolicyGate {
        PolicyGate::new(Arc::clone(&self.policy), self.policy_config, self.caller)
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            policy: Arc::new(AllowAllPolicy),
            policy_config: PolicyConfig::default(),
            caller: CallerIdentity::default(),
            op_package_name: None,
            submix_notifier: Arc::new(LoggingSubmixNotifier),
            devices: Arc::new(NoDevices),
            default_context: None,
        }
    }
}

pub mod device_enumerator;
pub mod dispatch_context;
pub mod listeners;
pub mod native_engine;
pub mod notifier;
pub mod policy;

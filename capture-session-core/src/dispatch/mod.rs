//! Bridges native callback threads to listener dispatch contexts.

pub mod event_loop;
pub mod native_event;
pub mod position;
pub mod routing;

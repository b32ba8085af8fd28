pub mod builder;
pub mod capture_session;
pub mod collaborators;
pub mod policy_gate;

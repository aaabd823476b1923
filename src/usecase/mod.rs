pub mod confirmation_usecase;
pub mod registration_flow;
pub mod registration_sessions;

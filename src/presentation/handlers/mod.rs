pub mod event_handler;
pub mod registration_handler;

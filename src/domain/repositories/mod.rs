pub mod handoff_store;
pub mod registration_repository;

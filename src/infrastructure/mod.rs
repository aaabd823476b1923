pub mod entity;
pub mod file_handoff_store;
pub mod hosted_checkout_gateway;
#[cfg(test)]
pub mod in_memory;
pub mod registration_repository;

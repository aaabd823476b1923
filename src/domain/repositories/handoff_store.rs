use async_trait::async_trait;

use crate::domain::error::RepositoryError;

/// Key under which the latest registration is handed to the confirmation page.
pub const HANDOFF_KEY: &str = "registrationData";

/// Local key-value slot shared between the registration flow and the confirmation view
#[async_trait]
pub trait HandoffStore: Send + Sync {
    /// Overwrites any previous value.
    async fn put(&self, key: &str, value: String) -> Result<(), RepositoryError>;

    /// Reading does not consume the value.
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;
}

/// Per-session key, so two browsers never see each other's confirmation.
pub fn session_key(session: &str) -> String {
    format!("{HANDOFF_KEY}.{session}")
}

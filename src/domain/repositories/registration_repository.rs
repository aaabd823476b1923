use async_trait::async_trait;

use crate::domain::{error::RepositoryError, models::registration::RegistrationRecord};

/// Durable store for completed registrations. Append only.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn append(&self, record: &RegistrationRecord) -> Result<(), RepositoryError>;
}

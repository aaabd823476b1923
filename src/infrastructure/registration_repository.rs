use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseConnection, EntityTrait, Schema};
use tracing::info;

use crate::{
    domain::{
        error::RepositoryError, models::registration::RegistrationRecord,
        repositories::registration_repository::RegistrationRepository,
    },
    infrastructure::entity::registrations,
};

#[derive(Clone)]
pub struct SqlRegistrationRepository {
    db: Arc<DatabaseConnection>,
}

impl SqlRegistrationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Creates the `registrations` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        let backend = self.db.get_database_backend();
        let mut statement = Schema::new(backend).create_table_from_entity(registrations::Entity);
        statement.if_not_exists();

        self.db
            .execute(backend.build(&statement))
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl RegistrationRepository for SqlRegistrationRepository {
    async fn append(&self, record: &RegistrationRecord) -> Result<(), RepositoryError> {
        let model = registrations::ActiveModel {
            registration_id: Set(record.registration_id.as_str().to_string()),
            name: Set(record.name.clone()),
            email: Set(record.email.clone()),
            phone: Set(record.phone.clone()),
            registration_number: Set(record.registration_number.clone()),
            id_proof_file_name: Set(record.id_proof_file_name.clone()),
            payment_id: Set(record.payment_id.clone()),
            payment_status: Set(record.payment_status.as_str().to_string()),
            payment_amount: Set(i64::from(record.payment_amount)),
            coupon_applied: Set(record.coupon_applied.clone()),
            registration_date: Set(record.registration_date),
        };

        registrations::Entity::insert(model)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        info!(
            registration_id = %record.registration_id,
            payment_id = %record.payment_id,
            "registration stored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    use super::*;
    use crate::{
        domain::models::registration::{IdProof, RegistrationInput},
        infrastructure::in_memory::InMemoryRegistrationRepository,
    };

    fn record() -> RegistrationRecord {
        record_at("pay_123", Utc::now())
    }

    fn record_at(payment_id: &str, at: chrono::DateTime<Utc>) -> RegistrationRecord {
        let mut input = RegistrationInput::new();
        input.set_name("Asha Verma");
        input.set_email("asha@example.com");
        input.set_phone("9876543210");
        input.set_registration_number("12345678");
        input.attach_id_proof(IdProof {
            file_name: "id.pdf".to_string(),
            content_type: None,
            size: None,
        });
        RegistrationRecord::completed(
            &input,
            payment_id.to_string(),
            999,
            "LPUUPGRAD".to_string(),
            at,
        )
    }

    #[tokio::test]
    async fn append_inserts_one_row() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let repository = SqlRegistrationRepository::new(db);

        assert!(repository.append(&record()).await.is_ok());
    }

    #[tokio::test]
    async fn database_failure_is_reported() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let repository = SqlRegistrationRepository::new(db);

        let err = repository.append(&record()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseError(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn same_millisecond_registrations_both_append() {
        let at = Utc::now();
        let first = record_at("pay_A", at);
        let second = record_at("pay_B", at);
        assert_ne!(first.registration_id, second.registration_id);

        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();
        let repository = SqlRegistrationRepository::new(db);
        assert!(repository.append(&first).await.is_ok());
        assert!(repository.append(&second).await.is_ok());

        let memory = InMemoryRegistrationRepository::new();
        memory.append(&first).await.unwrap();
        memory.append(&second).await.unwrap();
        assert!(memory.append(&first).await.is_err());
        assert_eq!(memory.records().await.len(), 2);
    }
}

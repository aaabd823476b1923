//! In-memory adapters used by the test suites.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    error::{PaymentError, RepositoryError},
    models::registration::RegistrationRecord,
    repositories::{handoff_store::HandoffStore, registration_repository::RegistrationRepository},
    services::payment_service::{CheckoutSession, PaymentGateway, PaymentRequest, Prefill},
};

#[derive(Default, Clone)]
pub struct InMemoryRegistrationRepository {
    records: Arc<RwLock<Vec<RegistrationRecord>>>,
    failures_left: Arc<AtomicUsize>,
}

impl InMemoryRegistrationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` appends fail with a database error.
    pub fn fail_next_appends(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<RegistrationRecord> {
        self.records.read().await.clone()
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl RegistrationRepository for InMemoryRegistrationRepository {
    async fn append(&self, record: &RegistrationRecord) -> Result<(), RepositoryError> {
        if take_failure(&self.failures_left) {
            return Err(RepositoryError::DatabaseError("store unavailable".to_string()));
        }
        let mut records = self.records.write().await;
        if records
            .iter()
            .any(|r| r.registration_id == record.registration_id)
        {
            return Err(RepositoryError::DatabaseError(format!(
                "duplicate registration id {}",
                record.registration_id
            )));
        }
        records.push(record.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryHandoffStore {
    slots: Arc<RwLock<HashMap<String, String>>>,
    failures_left: Arc<AtomicUsize>,
}

impl InMemoryHandoffStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_puts(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl HandoffStore for InMemoryHandoffStore {
    async fn put(&self, key: &str, value: String) -> Result<(), RepositoryError> {
        if take_failure(&self.failures_left) {
            return Err(RepositoryError::StorageError("quota exceeded".to_string()));
        }
        self.slots.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.slots.read().await.get(key).cloned())
    }
}

/// Records every checkout it is asked to open.
#[derive(Default, Clone)]
pub struct FakePaymentGateway {
    load_calls: Arc<AtomicUsize>,
    load_error: Arc<Mutex<Option<String>>>,
    requests: Arc<Mutex<Vec<PaymentRequest>>>,
}

impl FakePaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_load(&self, reason: &str) {
        *self.load_error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn load(&self) -> Result<(), PaymentError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        match self.load_error.lock().unwrap().clone() {
            Some(reason) => Err(PaymentError::LoadFailed(reason)),
            None => Ok(()),
        }
    }

    async fn open_checkout(&self, request: &PaymentRequest) -> Result<CheckoutSession, PaymentError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            key: "rzp_test_key".to_string(),
            script_url: "https://checkout.example.com/v1/checkout.js".to_string(),
            amount: u64::from(request.amount) * 100,
            currency: request.currency.clone(),
            name: "AI Workshop 2025".to_string(),
            description: request.description.clone(),
            prefill: Prefill {
                name: request.buyer_name.clone(),
                email: request.buyer_email.clone(),
                contact: request.buyer_phone.clone(),
            },
        })
    }
}

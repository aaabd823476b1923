use thiserror::Error;

/// Form validation failures, reported in the order the flow checks them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Please fill all fields and upload ID proof")]
    MissingFields,

    #[error("Registration number must be exactly 8 digits")]
    InvalidRegistrationNumber,

    #[error("Phone number must be exactly 10 digits")]
    InvalidPhone,

    #[error("Please enter a valid email address")]
    InvalidEmail,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Payment SDK failed to load: {0}")]
    LoadFailed(String),

    #[error("Payment failed: {0}")]
    Failed(String),

    #[error("Payment cancelled")]
    Cancelled,
}

/// Everything a single submit attempt can end with.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Money has moved but the durable write did not happen.
    #[error("Payment succeeded (payment id {payment_id}) but saving your confirmation failed")]
    PaymentCapturedNotSaved {
        payment_id: String,
        #[source]
        source: RepositoryError,
    },

    #[error("A registration is already being processed")]
    SubmissionInProgress,

    #[error("The form cannot be edited right now")]
    FormLocked,

    #[error("No payment is awaiting a result")]
    NotAwaitingPayment,

    #[error("There is no unsaved registration to retry")]
    NothingToRetry,
}

impl FlowError {
    /// True when the attempt ended before any money moved.
    pub fn is_retry_safe(&self) -> bool {
        !matches!(self, FlowError::PaymentCapturedNotSaved { .. })
    }
}

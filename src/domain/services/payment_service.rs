use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::PaymentError;

/// What the flow asks the payment service to charge. `amount` is in whole rupees;
/// the gateway converts to the smallest unit for the checkout widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub amount: u32,
    pub currency: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// Options the browser hands to the hosted checkout widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub key: String,
    pub script_url: String,
    /// smallest currency unit
    pub amount: u64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub prefill: Prefill,
}

/// Result of one payment attempt, delivered exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Success { payment_id: String },
    Failure { reason: String },
    Dismissed,
}

/// Hosted checkout collaborator
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Loads the checkout SDK. Calling it again after a success is a no-op.
    async fn load(&self) -> Result<(), PaymentError>;

    async fn open_checkout(&self, request: &PaymentRequest) -> Result<CheckoutSession, PaymentError>;
}

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

pub const PHONE_DIGITS: usize = 10;
pub const REGISTRATION_NUMBER_DIGITS: usize = 8;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("phone pattern is valid"));
static REGISTRATION_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}$").expect("registration number pattern is valid"));
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Keep only ASCII digits, then cap the length.
///
/// Stripping happens before truncation, so `"12a3456789"` with a cap of 8 yields `"12345678"`.
pub fn digits_only(raw: &str, max_len: usize) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(max_len)
        .collect()
}

/// Value object for the identifier shown on the confirmation and the entry pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(String);

impl RegistrationId {
    /// `WS`, the unix time in milliseconds, then a random suffix so that two
    /// sessions completing in the same millisecond still get distinct ids.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "WS{}-{}",
            at.timestamp_millis(),
            suffix[..8].to_ascii_uppercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uploaded ID proof. Only its presence is checked; the content never reaches the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdProof {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Form fields while the registration form is open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationInput {
    name: String,
    email: String,
    phone: String,
    registration_number: String,
    id_proof: Option<IdProof>,
}

impl RegistrationInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    /// Filters instead of rejecting: non-digits are dropped, overflow is cut.
    pub fn set_phone(&mut self, raw: &str) {
        self.phone = digits_only(raw, PHONE_DIGITS);
    }

    pub fn set_registration_number(&mut self, raw: &str) {
        self.registration_number = digits_only(raw, REGISTRATION_NUMBER_DIGITS);
    }

    pub fn attach_id_proof(&mut self, proof: IdProof) {
        self.id_proof = Some(proof);
    }

    pub fn clear_id_proof(&mut self) {
        self.id_proof = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn email(&self) -> &str {
        &self.email
    }
    pub fn phone(&self) -> &str {
        &self.phone
    }
    pub fn registration_number(&self) -> &str {
        &self.registration_number
    }
    pub fn id_proof(&self) -> Option<&IdProof> {
        self.id_proof.as_ref()
    }

    /// Runs every check in order and stops at the first failure.
    pub fn validate(&self) -> Result<(), DomainError> {
        let missing = self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.phone.is_empty()
            || self.registration_number.is_empty()
            || self.id_proof.is_none();
        if missing {
            return Err(DomainError::MissingFields);
        }
        if !REGISTRATION_NUMBER_PATTERN.is_match(&self.registration_number) {
            return Err(DomainError::InvalidRegistrationNumber);
        }
        if !PHONE_PATTERN.is_match(&self.phone) {
            return Err(DomainError::InvalidPhone);
        }
        if !EMAIL_PATTERN.is_match(self.email.trim()) {
            return Err(DomainError::InvalidEmail);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
        }
    }
}

/// Written once when a payment completes. Serialized as camelCase because the handoff
/// slot is read back by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub registration_id: RegistrationId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub registration_number: String,
    pub id_proof_file_name: String,
    pub payment_id: String,
    pub payment_status: PaymentStatus,
    pub payment_amount: u32,
    pub coupon_applied: String,
    pub registration_date: DateTime<Utc>,
}

impl RegistrationRecord {
    pub fn completed(
        input: &RegistrationInput,
        payment_id: String,
        payment_amount: u32,
        coupon_applied: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            registration_id: RegistrationId::generate(at),
            name: input.name().trim().to_string(),
            email: input.email().trim().to_string(),
            phone: input.phone().to_string(),
            registration_number: input.registration_number().to_string(),
            id_proof_file_name: input
                .id_proof()
                .map(|proof| proof.file_name.clone())
                .unwrap_or_default(),
            payment_id,
            payment_status: PaymentStatus::Completed,
            payment_amount,
            coupon_applied,
            registration_date: at,
        }
    }
}

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::{
    error::{FlowError, PaymentError, RepositoryError},
    models::{
        coupon::{CouponNotice, CouponState, PriceQuote, PricingPolicy},
        registration::{RegistrationInput, RegistrationRecord},
    },
    repositories::{handoff_store::HandoffStore, registration_repository::RegistrationRepository},
    services::payment_service::{CheckoutSession, PaymentGateway, PaymentOutcome, PaymentRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Editing,
    Validating,
    PaymentPending,
    Persisting,
    Confirmed,
    /// Only sticks when a captured payment could not be saved.
    Error,
}

/// Static inputs of a flow: pricing and how the charge is labelled
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub pricing: PricingPolicy,
    pub currency: String,
    pub description: String,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            pricing: PricingPolicy::default(),
            currency: "INR".to_string(),
            description: "Workshop Registration".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingPayment {
    request: PaymentRequest,
    coupon_applied: String,
}

/// A record whose payment went through but which is not fully saved yet.
#[derive(Debug, Clone)]
struct UnsavedRegistration {
    record: RegistrationRecord,
    stored_durably: bool,
}

/// Read-only view handed to rendering
#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub state: FlowState,
    pub input: RegistrationInput,
    pub coupon: CouponState,
    pub quote: PriceQuote,
    pub submit_enabled: bool,
    pub last_error: Option<String>,
    pub unsaved_payment_id: Option<String>,
}

pub struct RegistrationFlow<P: PaymentGateway, R: RegistrationRepository, H: HandoffStore> {
    payment_gateway: P,
    registration_repository: R,
    handoff_store: H,
    settings: FlowSettings,
    handoff_key: String,
    state: FlowState,
    input: RegistrationInput,
    coupon: CouponState,
    pending: Option<PendingPayment>,
    unsaved: Option<UnsavedRegistration>,
    last_error: Option<String>,
}

impl<P: PaymentGateway, R: RegistrationRepository, H: HandoffStore> RegistrationFlow<P, R, H> {
    pub fn new(
        payment_gateway: P,
        registration_repository: R,
        handoff_store: H,
        settings: FlowSettings,
        handoff_key: String,
    ) -> Self {
        Self {
            payment_gateway,
            registration_repository,
            handoff_store,
            settings,
            handoff_key,
            state: FlowState::Editing,
            input: RegistrationInput::new(),
            coupon: CouponState::default(),
            pending: None,
            unsaved: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn input(&self) -> &RegistrationInput {
        &self.input
    }

    pub fn coupon(&self) -> &CouponState {
        &self.coupon
    }

    pub fn quote(&self) -> PriceQuote {
        self.settings.pricing.quote(&self.coupon)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn handoff_key(&self) -> &str {
        &self.handoff_key
    }

    /// Payment id of a captured payment whose record is not saved yet.
    pub fn unsaved_payment_id(&self) -> Option<&str> {
        self.unsaved.as_ref().map(|u| u.record.payment_id.as_str())
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            state: self.state,
            input: self.input.clone(),
            coupon: self.coupon.clone(),
            quote: self.quote(),
            submit_enabled: self.state == FlowState::Editing,
            last_error: self.last_error.clone(),
            unsaved_payment_id: self.unsaved_payment_id().map(str::to_string),
        }
    }

    pub fn update_form(
        &mut self,
        edit: impl FnOnce(&mut RegistrationInput),
    ) -> Result<(), FlowError> {
        self.ensure_editable()?;
        edit(&mut self.input);
        Ok(())
    }

    pub fn set_coupon_code(&mut self, raw: &str) -> Result<Option<CouponNotice>, FlowError> {
        self.ensure_editable()?;
        let notice = self.coupon.edit(raw, &self.settings.pricing.coupon_code);
        if notice == Some(CouponNotice::Applied) {
            info!(code = %self.coupon.code(), "coupon applied");
        }
        Ok(notice)
    }

    pub fn remove_coupon(&mut self) -> Result<CouponNotice, FlowError> {
        self.ensure_editable()?;
        Ok(self.coupon.remove())
    }

    /// Validates the form and opens a checkout for the current price.
    ///
    /// Leaves the flow in `PaymentPending` until [`Self::complete_payment`] is called.
    pub async fn submit(&mut self) -> Result<CheckoutSession, FlowError> {
        match self.state {
            FlowState::Editing => {}
            FlowState::Validating | FlowState::PaymentPending | FlowState::Persisting => {
                return Err(FlowError::SubmissionInProgress);
            }
            FlowState::Confirmed | FlowState::Error => return Err(FlowError::FormLocked),
        }

        self.last_error = None;
        self.transition(FlowState::Validating);
        if let Err(e) = self.input.validate() {
            return Err(self.fail(e.into()));
        }

        let quote = self.quote();
        let request = PaymentRequest {
            buyer_name: self.input.name().trim().to_string(),
            buyer_email: self.input.email().trim().to_string(),
            buyer_phone: self.input.phone().to_string(),
            amount: quote.final_amount,
            currency: self.settings.currency.clone(),
            description: self.settings.description.clone(),
        };

        if let Err(e) = self.payment_gateway.load().await {
            return Err(self.fail(e.into()));
        }
        let checkout = match self.payment_gateway.open_checkout(&request).await {
            Ok(checkout) => checkout,
            Err(e) => return Err(self.fail(e.into())),
        };

        info!(amount = request.amount, currency = %request.currency, "payment initiated");
        self.pending = Some(PendingPayment {
            request,
            coupon_applied: self.coupon.applied_code().to_string(),
        });
        self.transition(FlowState::PaymentPending);
        Ok(checkout)
    }

    /// Consumes the single result of the pending payment attempt.
    pub async fn complete_payment(
        &mut self,
        outcome: PaymentOutcome,
    ) -> Result<RegistrationRecord, FlowError> {
        if self.state != FlowState::PaymentPending {
            return Err(FlowError::NotAwaitingPayment);
        }
        let pending = self.pending.take().ok_or(FlowError::NotAwaitingPayment)?;

        match outcome {
            PaymentOutcome::Success { payment_id } => {
                let now = Utc::now();
                let payment_id = if payment_id.trim().is_empty() {
                    format!("pay_{}", now.timestamp_millis())
                } else {
                    payment_id
                };
                info!(payment_id = %payment_id, "payment captured");
                let record = RegistrationRecord::completed(
                    &self.input,
                    payment_id,
                    pending.request.amount,
                    pending.coupon_applied,
                    now,
                );
                self.persist(UnsavedRegistration {
                    record,
                    stored_durably: false,
                })
                .await
            }
            PaymentOutcome::Failure { reason } => {
                Err(self.fail(PaymentError::Failed(reason).into()))
            }
            PaymentOutcome::Dismissed => Err(self.fail(PaymentError::Cancelled.into())),
        }
    }

    /// Saves the retained record again, keeping its registration and payment ids.
    pub async fn retry_persistence(&mut self) -> Result<RegistrationRecord, FlowError> {
        if self.state != FlowState::Error {
            return Err(FlowError::NothingToRetry);
        }
        let unsaved = self.unsaved.take().ok_or(FlowError::NothingToRetry)?;
        self.persist(unsaved).await
    }

    async fn persist(
        &mut self,
        mut unsaved: UnsavedRegistration,
    ) -> Result<RegistrationRecord, FlowError> {
        self.transition(FlowState::Persisting);

        if !unsaved.stored_durably {
            if let Err(source) = self.registration_repository.append(&unsaved.record).await {
                return Err(self.fail_after_payment(unsaved, source));
            }
            unsaved.stored_durably = true;
        }

        let stored = match serde_json::to_string(&unsaved.record) {
            Ok(value) => self.handoff_store.put(&self.handoff_key, value).await,
            Err(e) => Err(RepositoryError::from(e)),
        };
        if let Err(source) = stored {
            return Err(self.fail_after_payment(unsaved, source));
        }

        let record = unsaved.record;
        info!(registration_id = %record.registration_id, "registration confirmed");
        self.last_error = None;
        self.transition(FlowState::Confirmed);
        Ok(record)
    }

    fn ensure_editable(&self) -> Result<(), FlowError> {
        if self.state == FlowState::Editing {
            Ok(())
        } else {
            Err(FlowError::FormLocked)
        }
    }

    fn transition(&mut self, next: FlowState) {
        debug!(from = ?self.state, to = ?next, "registration flow transition");
        self.state = next;
    }

    /// Nothing was charged: report and hand the form back.
    fn fail(&mut self, err: FlowError) -> FlowError {
        self.transition(FlowState::Error);
        warn!(error = %err, "registration attempt failed");
        self.last_error = Some(err.to_string());
        self.transition(FlowState::Editing);
        err
    }

    fn fail_after_payment(
        &mut self,
        unsaved: UnsavedRegistration,
        source: RepositoryError,
    ) -> FlowError {
        let payment_id = unsaved.record.payment_id.clone();
        error!(
            payment_id = %payment_id,
            registration_id = %unsaved.record.registration_id,
            stored_durably = unsaved.stored_durably,
            error = %source,
            "payment captured but registration not saved"
        );
        self.unsaved = Some(unsaved);
        let err = FlowError::PaymentCapturedNotSaved { payment_id, source };
        self.last_error = Some(err.to_string());
        self.transition(FlowState::Error);
        err
    }
}

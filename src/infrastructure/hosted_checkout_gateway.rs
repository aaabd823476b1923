use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{
    config::PaymentSettings,
    domain::{
        error::PaymentError,
        services::payment_service::{CheckoutSession, PaymentGateway, PaymentRequest, Prefill},
    },
};

/// Hosted checkout widget (Razorpay style). The browser runs the widget; this side makes
/// sure the SDK is reachable and prepares the options it is opened with.
#[derive(Clone)]
pub struct HostedCheckoutGateway {
    client: reqwest::Client,
    settings: Arc<PaymentSettings>,
    loaded: Arc<OnceCell<()>>,
}

impl HostedCheckoutGateway {
    pub fn new(client: reqwest::Client, settings: PaymentSettings) -> Self {
        Self {
            client,
            settings: Arc::new(settings),
            loaded: Arc::new(OnceCell::new()),
        }
    }

    async fn fetch_script(&self) -> Result<(), PaymentError> {
        let url = &self.settings.script_url;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PaymentError::LoadFailed(e.to_string()))?;

        if !response.status().is_success() {
            warn!(%url, status = %response.status(), "checkout sdk unavailable");
            return Err(PaymentError::LoadFailed(format!(
                "checkout script returned {}",
                response.status()
            )));
        }
        info!(%url, "checkout sdk loaded");
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for HostedCheckoutGateway {
    async fn load(&self) -> Result<(), PaymentError> {
        // a failed fetch leaves the cell empty so the next submit tries again
        self.loaded
            .get_or_try_init(|| self.fetch_script())
            .await
            .map(|_| ())
    }

    async fn open_checkout(&self, request: &PaymentRequest) -> Result<CheckoutSession, PaymentError> {
        if request.amount == 0 {
            return Err(PaymentError::Failed("amount must be positive".to_string()));
        }

        Ok(CheckoutSession {
            key: self.settings.key_id.clone(),
            script_url: self.settings.script_url.clone(),
            // paise
            amount: u64::from(request.amount) * 100,
            currency: request.currency.clone(),
            name: self.settings.merchant_name.clone(),
            description: request.description.clone(),
            prefill: Prefill {
                name: request.buyer_name.clone(),
                email: request.buyer_email.clone(),
                contact: request.buyer_phone.clone(),
            },
        })
    }
}

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::{
    domain::models::{coupon::PricingPolicy, event::EventDetails},
    usecase::registration_flow::FlowSettings,
};

/// Service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub handoff: HandoffSettings,
    pub sessions: SessionSettings,
    pub payment: PaymentSettings,
    pub pricing: PricingPolicy,
    pub event: EventDetails,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://registrations.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HandoffSettings {
    pub dir: PathBuf,
}

impl Default for HandoffSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/handoff"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seconds a session may sit untouched before it is dropped
    pub idle_ttl_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 30 * 60,
        }
    }
}

impl SessionSettings {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentSettings {
    pub key_id: String,
    pub script_url: String,
    pub merchant_name: String,
    pub currency: String,
    pub description: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            script_url: "https://checkout.razorpay.com/v1/checkout.js".to_string(),
            merchant_name: "AI Workshop 2025".to_string(),
            currency: "INR".to_string(),
            description: "Workshop Registration".to_string(),
        }
    }
}

impl Settings {
    /// Layers, lowest first: defaults, `workshop.toml` (optional), `WORKSHOP__*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("workshop.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("WORKSHOP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            pricing: self.pricing.clone(),
            currency: self.payment.currency.clone(),
            description: self.payment.description.clone(),
        }
    }
}

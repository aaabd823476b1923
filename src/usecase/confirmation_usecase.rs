use serde::Serialize;
use tracing::warn;

use crate::domain::{
    error::RepositoryError,
    models::{entry_pass::EntryPass, event::EventDetails, registration::RegistrationRecord},
    repositories::handoff_store::HandoffStore,
};

/// Page routes known to the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Route {
    Entry,
    Success,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Entry => "/",
            Route::Success => "/success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Render(RegistrationRecord),
    Redirect(Route),
}

pub struct ConfirmationUsecase<H: HandoffStore> {
    handoff_store: H,
    event: EventDetails,
}

impl<H: HandoffStore> ConfirmationUsecase<H> {
    pub fn new(handoff_store: H, event: EventDetails) -> Self {
        Self {
            handoff_store,
            event,
        }
    }

    /// Never renders without a record: an empty or unreadable slot sends the visitor back
    /// to the entry page.
    pub async fn open(&self, key: &str) -> Result<Confirmation, RepositoryError> {
        let Some(raw) = self.handoff_store.get(key).await? else {
            return Ok(Confirmation::Redirect(Route::Entry));
        };

        match serde_json::from_str::<RegistrationRecord>(&raw) {
            Ok(record) => Ok(Confirmation::Render(record)),
            Err(e) => {
                warn!(key, error = %e, "unreadable handoff record");
                Ok(Confirmation::Redirect(Route::Entry))
            }
        }
    }

    pub async fn entry_pass(&self, key: &str) -> Result<Option<EntryPass>, RepositoryError> {
        Ok(match self.open(key).await? {
            Confirmation::Render(record) => Some(EntryPass::render(&record, &self.event)),
            Confirmation::Redirect(_) => None,
        })
    }
}

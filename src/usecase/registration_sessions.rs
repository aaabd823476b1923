use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    domain::{
        error::PaymentError,
        repositories::{
            handoff_store::{HandoffStore, session_key},
            registration_repository::RegistrationRepository,
        },
        services::payment_service::PaymentGateway,
    },
    usecase::registration_flow::{FlowSettings, FlowState, RegistrationFlow},
};

pub type SharedFlow<P, R, H> = Arc<Mutex<RegistrationFlow<P, R, H>>>;

struct SessionEntry<P, R, H>
where
    P: PaymentGateway,
    R: RegistrationRepository,
    H: HandoffStore,
{
    flow: SharedFlow<P, R, H>,
    last_touched: Instant,
}

/// One registration flow per browser session.
///
/// The per-session mutex is what keeps a double click from starting two payments.
/// Finished and idle sessions are swept whenever a new one opens; a session holding a
/// captured but unsaved payment is never swept.
pub struct RegistrationSessions<P, R, H>
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    payment_gateway: P,
    registration_repository: R,
    handoff_store: H,
    settings: FlowSettings,
    idle_ttl: Duration,
    sessions: RwLock<HashMap<Uuid, SessionEntry<P, R, H>>>,
}

impl<P, R, H> RegistrationSessions<P, R, H>
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    pub fn new(
        payment_gateway: P,
        registration_repository: R,
        handoff_store: H,
        settings: FlowSettings,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            payment_gateway,
            registration_repository,
            handoff_store,
            settings,
            idle_ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn open(&self) -> (Uuid, SharedFlow<P, R, H>) {
        let id = Uuid::new_v4();
        let flow = Arc::new(Mutex::new(RegistrationFlow::new(
            self.payment_gateway.clone(),
            self.registration_repository.clone(),
            self.handoff_store.clone(),
            self.settings.clone(),
            session_key(&id.to_string()),
        )));

        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions);
        sessions.insert(
            id,
            SessionEntry {
                flow: flow.clone(),
                last_touched: Instant::now(),
            },
        );
        info!(session = %id, open_sessions = sessions.len(), "registration session opened");
        (id, flow)
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedFlow<P, R, H>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_touched = Instant::now();
        Some(entry.flow.clone())
    }

    /// Loads the checkout script without touching any session lock.
    pub async fn preload_checkout(&self) -> Result<(), PaymentError> {
        self.payment_gateway.load().await
    }

    /// Drops confirmed sessions and sessions idle for at least `idle_ttl`.
    /// A flow that is locked is in use and stays.
    fn sweep(&self, sessions: &mut HashMap<Uuid, SessionEntry<P, R, H>>) {
        let idle_ttl = self.idle_ttl;
        sessions.retain(|id, entry| {
            let Ok(flow) = entry.flow.try_lock() else {
                return true;
            };
            if flow.unsaved_payment_id().is_some() {
                return true;
            }
            let evict = flow.state() == FlowState::Confirmed
                || entry.last_touched.elapsed() >= idle_ttl;
            if evict {
                debug!(session = %id, state = ?flow.state(), "registration session evicted");
            }
            !evict
        });
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::{
        domain::{models::registration::IdProof, services::payment_service::PaymentOutcome},
        infrastructure::in_memory::{
            FakePaymentGateway, InMemoryHandoffStore, InMemoryRegistrationRepository,
        },
    };

    type TestSessions = RegistrationSessions<
        FakePaymentGateway,
        InMemoryRegistrationRepository,
        InMemoryHandoffStore,
    >;
    type TestFlow =
        SharedFlow<FakePaymentGateway, InMemoryRegistrationRepository, InMemoryHandoffStore>;

    const LONG_TTL: Duration = Duration::from_secs(3600);

    fn sessions_with(
        repository: InMemoryRegistrationRepository,
        idle_ttl: Duration,
    ) -> TestSessions {
        RegistrationSessions::new(
            FakePaymentGateway::new(),
            repository,
            InMemoryHandoffStore::new(),
            FlowSettings::default(),
            idle_ttl,
        )
    }

    #[fixture]
    fn sessions() -> TestSessions {
        sessions_with(InMemoryRegistrationRepository::new(), LONG_TTL)
    }

    async fn pay(flow: &TestFlow) {
        let mut flow = flow.lock().await;
        flow.update_form(|input| {
            input.set_name("Asha Verma");
            input.set_email("asha@example.com");
            input.set_phone("9876543210");
            input.set_registration_number("12345678");
            input.attach_id_proof(IdProof {
                file_name: "aadhar.pdf".to_string(),
                content_type: None,
                size: None,
            });
        })
        .unwrap();
        flow.submit().await.unwrap();
        let _ = flow
            .complete_payment(PaymentOutcome::Success {
                payment_id: "pay_123".to_string(),
            })
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn each_session_gets_its_own_handoff_key(sessions: TestSessions) {
        let (first_id, first) = sessions.open().await;
        let (second_id, second) = sessions.open().await;

        assert_ne!(first_id, second_id);
        assert_eq!(
            first.lock().await.handoff_key(),
            session_key(&first_id.to_string())
        );
        assert_ne!(
            first.lock().await.handoff_key(),
            second.lock().await.handoff_key()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_session_is_none(sessions: TestSessions) {
        sessions.open().await;
        assert!(sessions.get(Uuid::new_v4()).await.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn get_returns_the_same_flow(sessions: TestSessions) {
        let (id, flow) = sessions.open().await;
        flow.lock()
            .await
            .update_form(|input| input.set_name("Asha"))
            .unwrap();

        let again = sessions.get(id).await.unwrap();
        assert_eq!(again.lock().await.input().name(), "Asha");
    }

    #[rstest]
    #[tokio::test]
    async fn confirmed_session_is_swept_on_next_open(sessions: TestSessions) {
        let (id, flow) = sessions.open().await;
        pay(&flow).await;
        assert_eq!(flow.lock().await.state(), FlowState::Confirmed);

        sessions.open().await;

        assert!(sessions.get(id).await.is_none());
    }

    #[tokio::test]
    async fn idle_session_is_swept_after_ttl() {
        let sessions = sessions_with(InMemoryRegistrationRepository::new(), Duration::ZERO);
        let (idle, _) = sessions.open().await;

        let (fresh, _) = sessions.open().await;

        assert!(sessions.get(idle).await.is_none());
        assert!(sessions.get(fresh).await.is_some());
    }

    #[tokio::test]
    async fn unsaved_payment_session_survives_sweep() {
        let repository = InMemoryRegistrationRepository::new();
        repository.fail_next_appends(1);
        let sessions = sessions_with(repository, Duration::ZERO);
        let (id, flow) = sessions.open().await;
        pay(&flow).await;
        assert_eq!(flow.lock().await.state(), FlowState::Error);

        sessions.open().await;
        sessions.open().await;

        let kept = sessions.get(id).await.unwrap();
        assert_eq!(kept.lock().await.unsaved_payment_id(), Some("pay_123"));
    }

    #[tokio::test]
    async fn busy_session_is_not_swept() {
        let sessions = sessions_with(InMemoryRegistrationRepository::new(), Duration::ZERO);
        let (id, flow) = sessions.open().await;
        let guard = flow.lock().await;

        sessions.open().await;

        drop(guard);
        assert!(sessions.get(id).await.is_some());
    }

    #[tokio::test]
    async fn checkout_preload_does_not_wait_for_a_busy_session() {
        let gateway = FakePaymentGateway::new();
        let sessions = RegistrationSessions::new(
            gateway.clone(),
            InMemoryRegistrationRepository::new(),
            InMemoryHandoffStore::new(),
            FlowSettings::default(),
            LONG_TTL,
        );
        let (_, flow) = sessions.open().await;
        let _busy = flow.lock().await;

        sessions.preload_checkout().await.unwrap();

        assert_eq!(gateway.load_calls(), 1);
    }
}

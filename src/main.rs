mod config;
mod domain;
mod infrastructure;
mod presentation;
mod telemetry;
mod usecase;

use axum::{Router, routing::get};
use sea_orm::{ConnectOptions, Database};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    config::Settings,
    domain::{
        models::event::EventDetails,
        repositories::{handoff_store::HandoffStore, registration_repository::RegistrationRepository},
        services::payment_service::PaymentGateway,
    },
    infrastructure::{
        file_handoff_store::FileHandoffStore, hosted_checkout_gateway::HostedCheckoutGateway,
        registration_repository::SqlRegistrationRepository,
    },
    presentation::handlers::{
        event_handler::create_event_router, registration_handler::create_registration_router,
    },
    usecase::{
        confirmation_usecase::ConfirmationUsecase, registration_sessions::RegistrationSessions,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let settings = Settings::load()?;

    let mut opt = ConnectOptions::new(settings.database.url.clone());
    opt.max_connections(settings.database.max_connections)
        .min_connections(1)
        .sqlx_logging(true);
    let db = Database::connect(opt).await?;

    let registration_repository = SqlRegistrationRepository::new(db);
    registration_repository.ensure_schema().await?;
    let handoff_store = FileHandoffStore::new(settings.handoff.dir.clone());
    if settings.payment.key_id.is_empty() {
        warn!("payment key id is not configured; checkouts will be rejected by the provider");
    }
    let payment_gateway =
        HostedCheckoutGateway::new(reqwest::Client::new(), settings.payment.clone());

    let sessions = RegistrationSessions::new(
        payment_gateway,
        registration_repository,
        handoff_store.clone(),
        settings.flow_settings(),
        settings.sessions.idle_ttl(),
    );
    let confirmation = ConfirmationUsecase::new(handoff_store, settings.event.clone());
    let app = build_app(sessions, confirmation, settings.event.clone());

    let listener = TcpListener::bind(&settings.server.bind_addr).await?;
    info!(addr = %settings.server.bind_addr, "workshop registration listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn build_app<P, R, H>(
    sessions: RegistrationSessions<P, R, H>,
    confirmation: ConfirmationUsecase<H>,
    event: EventDetails,
) -> Router
where
    P: PaymentGateway + Clone + 'static,
    R: RegistrationRepository + Clone + 'static,
    H: HandoffStore + Clone + 'static,
{
    Router::new()
        .route("/", get(|| async { "AI Workshop 2025 registration" }))
        .nest(
            "/api",
            create_registration_router(sessions, confirmation).merge(create_event_router(event)),
        )
}

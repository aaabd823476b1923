use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    domain::{
        error::{FlowError, PaymentError},
        models::{
            coupon::CouponNotice,
            registration::{IdProof, RegistrationRecord},
        },
        repositories::{
            handoff_store::{HandoffStore, session_key},
            registration_repository::RegistrationRepository,
        },
        services::payment_service::{CheckoutSession, PaymentGateway, PaymentOutcome},
    },
    usecase::{
        confirmation_usecase::{Confirmation, ConfirmationUsecase, Route},
        registration_flow::FlowSnapshot,
        registration_sessions::{RegistrationSessions, SharedFlow},
    },
};

// Request

/// json for a form edit; absent fields are left untouched
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FormUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub registration_number: Option<String>,
    pub id_proof: Option<IdProof>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CouponRequest {
    pub code: String,
}

// Response

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse<S = serde_json::Value> {
    pub session_id: Uuid,
    pub snapshot: S,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CouponResponse<S = serde_json::Value> {
    pub notice: Option<CouponNotice>,
    pub snapshot: S,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmedResponse {
    pub record: RegistrationRecord,
    pub redirect: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
    pub payment_id: Option<String>,
    pub retry_safe: bool,
}

fn error_response(err: &FlowError) -> Response {
    let (status, kind) = match err {
        FlowError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
        FlowError::Payment(PaymentError::LoadFailed(_)) => (StatusCode::BAD_GATEWAY, "payment_load"),
        FlowError::Payment(PaymentError::Failed(_)) => (StatusCode::PAYMENT_REQUIRED, "payment_failed"),
        FlowError::Payment(PaymentError::Cancelled) => {
            (StatusCode::PAYMENT_REQUIRED, "payment_cancelled")
        }
        FlowError::PaymentCapturedNotSaved { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "payment_captured_not_saved")
        }
        FlowError::SubmissionInProgress
        | FlowError::FormLocked
        | FlowError::NotAwaitingPayment
        | FlowError::NothingToRetry => (StatusCode::CONFLICT, "conflict"),
    };
    let payment_id = match err {
        FlowError::PaymentCapturedNotSaved { payment_id, .. } => Some(payment_id.clone()),
        _ => None,
    };
    let body = ErrorResponse {
        kind: kind.to_string(),
        message: err.to_string(),
        payment_id,
        retry_safe: err.is_retry_safe(),
    };
    (status, Json(body)).into_response()
}

fn session_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json("Session not found")).into_response()
}

/* Router Function and Handler Function */

/// function return Router object
/// Suppose to be nested by main router
pub fn create_registration_router<P, R, H>(
    sessions: RegistrationSessions<P, R, H>,
    confirmation: ConfirmationUsecase<H>,
) -> Router
where
    P: PaymentGateway + Clone + 'static,
    R: RegistrationRepository + Clone + 'static,
    H: HandoffStore + Clone + 'static,
{
    let state = AppState {
        sessions: Arc::new(sessions),
        confirmation: Arc::new(confirmation),
    };

    Router::new()
        .route("/sessions", post(create_session::<P, R, H>))
        .route("/sessions/{id}", get(show_session::<P, R, H>))
        .route("/sessions/{id}/form", put(update_form::<P, R, H>))
        .route(
            "/sessions/{id}/coupon",
            put(apply_coupon::<P, R, H>).delete(remove_coupon::<P, R, H>),
        )
        .route("/sessions/{id}/submit", post(submit::<P, R, H>))
        .route("/sessions/{id}/payment", post(payment_result::<P, R, H>))
        .route(
            "/sessions/{id}/persistence/retry",
            post(retry_persistence::<P, R, H>),
        )
        .route("/sessions/{id}/confirmation", get(self::confirmation::<P, R, H>))
        .route(
            "/sessions/{id}/confirmation/pass",
            get(entry_pass::<P, R, H>),
        )
        .with_state(state)
}

pub struct AppState<P, R, H>
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    pub sessions: Arc<RegistrationSessions<P, R, H>>,
    pub confirmation: Arc<ConfirmationUsecase<H>>,
}

impl<P, R, H> Clone for AppState<P, R, H>
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            confirmation: self.confirmation.clone(),
        }
    }
}

impl<P, R, H> AppState<P, R, H>
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    async fn flow(&self, id: Uuid) -> Option<SharedFlow<P, R, H>> {
        self.sessions.get(id).await
    }
}

// handler function

async fn create_session<P, R, H>(State(state): State<AppState<P, R, H>>) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    let (session_id, flow) = state.sessions.open().await;
    let snapshot = flow.lock().await.snapshot();
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            snapshot,
        }),
    )
        .into_response()
}

async fn show_session<P, R, H>(
    State(state): State<AppState<P, R, H>>,
    Path(id): Path<Uuid>,
) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    let Some(flow) = state.flow(id).await else {
        return session_not_found();
    };
    let snapshot: FlowSnapshot = flow.lock().await.snapshot();
    (StatusCode::OK, Json(snapshot)).into_response()
}

async fn update_form<P, R, H>(
    State(state): State<AppState<P, R, H>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FormUpdateRequest>,
) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    let Some(flow) = state.flow(id).await else {
        return session_not_found();
    };
    let mut flow = flow.lock().await;
    let result = flow.update_form(|input| {
        if let Some(name) = payload.name {
            input.set_name(name);
        }
        if let Some(email) = payload.email {
            input.set_email(email);
        }
        if let Some(phone) = payload.phone {
            input.set_phone(&phone);
        }
        if let Some(number) = payload.registration_number {
            input.set_registration_number(&number);
        }
        if let Some(proof) = payload.id_proof {
            input.attach_id_proof(proof);
        }
    });

    match result {
        Ok(()) => (StatusCode::OK, Json(flow.snapshot())).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn apply_coupon<P, R, H>(
    State(state): State<AppState<P, R, H>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CouponRequest>,
) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    let Some(flow) = state.flow(id).await else {
        return session_not_found();
    };
    let mut flow = flow.lock().await;
    match flow.set_coupon_code(&payload.code) {
        Ok(notice) => (
            StatusCode::OK,
            Json(CouponResponse {
                notice,
                snapshot: flow.snapshot(),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn remove_coupon<P, R, H>(
    State(state): State<AppState<P, R, H>>,
    Path(id): Path<Uuid>,
) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    let Some(flow) = state.flow(id).await else {
        return session_not_found();
    };
    let mut flow = flow.lock().await;
    match flow.remove_coupon() {
        Ok(notice) => (
            StatusCode::OK,
            Json(CouponResponse {
                notice: Some(notice),
                snapshot: flow.snapshot(),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn submit<P, R, H>(
    State(state): State<AppState<P, R, H>>,
    Path(id): Path<Uuid>,
) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    let Some(flow) = state.flow(id).await else {
        return session_not_found();
    };
    // The script fetch happens outside the session lock so snapshots are not held up by it.
    // `submit` loads again under the lock, which is a no-op once this succeeded.
    if let Err(e) = state.sessions.preload_checkout().await {
        warn!(session = %id, error = %e, "checkout preload failed");
    }
    let result: Result<CheckoutSession, FlowError> = flow.lock().await.submit().await;
    match result {
        Ok(checkout) => (StatusCode::OK, Json(checkout)).into_response(),
        Err(e) => error_response(&e),
    }
}

fn confirmed(record: RegistrationRecord) -> Response {
    (
        StatusCode::CREATED,
        Json(ConfirmedResponse {
            record,
            redirect: Route::Success.path().to_string(),
        }),
    )
        .into_response()
}

async fn payment_result<P, R, H>(
    State(state): State<AppState<P, R, H>>,
    Path(id): Path<Uuid>,
    Json(outcome): Json<PaymentOutcome>,
) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    let Some(flow) = state.flow(id).await else {
        return session_not_found();
    };
    let result = flow.lock().await.complete_payment(outcome).await;
    match result {
        Ok(record) => confirmed(record),
        Err(e) => error_response(&e),
    }
}

async fn retry_persistence<P, R, H>(
    State(state): State<AppState<P, R, H>>,
    Path(id): Path<Uuid>,
) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    let Some(flow) = state.flow(id).await else {
        return session_not_found();
    };
    let result = flow.lock().await.retry_persistence().await;
    match result {
        Ok(record) => confirmed(record),
        Err(e) => error_response(&e),
    }
}

async fn confirmation<P, R, H>(
    State(state): State<AppState<P, R, H>>,
    Path(id): Path<Uuid>,
) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    match state.confirmation.open(&session_key(&id.to_string())).await {
        Ok(Confirmation::Render(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(Confirmation::Redirect(route)) => Redirect::to(route.path()).into_response(),
        Err(e) => {
            error!(session = %id, error = %e, "handoff slot unreadable");
            Redirect::to(Route::Entry.path()).into_response()
        }
    }
}

async fn entry_pass<P, R, H>(
    State(state): State<AppState<P, R, H>>,
    Path(id): Path<Uuid>,
) -> Response
where
    P: PaymentGateway + Clone,
    R: RegistrationRepository + Clone,
    H: HandoffStore + Clone,
{
    match state
        .confirmation
        .entry_pass(&session_key(&id.to_string()))
        .await
    {
        Ok(Some(pass)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", pass.file_name),
                ),
            ],
            pass.body,
        )
            .into_response(),
        Ok(None) => Redirect::to(Route::Entry.path()).into_response(),
        Err(e) => {
            error!(session = %id, error = %e, "handoff slot unreadable");
            Redirect::to(Route::Entry.path()).into_response()
        }
    }
}

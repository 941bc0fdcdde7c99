use axum::{
    extract::{ConnectInfo, Path, State},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::rate_limit;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::certificate::{CertificateResponse, VerifyResponse};
use crate::services::certificate_issuer;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_certificates))
        .route("/verify/:certificate_number", get(verify_certificate))
        .route("/:certificate_id", get(get_certificate))
}

async fn list_certificates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CertificateResponse>>, ApiError> {
    let certificates = repositories::certificates::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list certificates"))?;

    Ok(Json(certificates.into_iter().map(CertificateResponse::from_db).collect()))
}

async fn get_certificate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(certificate_id): Path<String>,
) -> Result<Json<CertificateResponse>, ApiError> {
    let certificate =
        repositories::certificates::find_for_user_by_id(state.db(), &user.id, &certificate_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch certificate"))?
            .ok_or_else(|| ApiError::NotFound("Certificate not found".to_string()))?;

    Ok(Json(CertificateResponse::from_db(certificate)))
}

/// Public. Unknown numbers answer `{"valid": false}` with 200; over-limit clients get 429.
async fn verify_certificate(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Path(certificate_number): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let client = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    rate_limit::enforce(
        &state,
        "verify",
        &client,
        state.settings().rate_limit().verify_per_minute,
        "Too many verification requests, try again later",
    )
    .await?;

    let certificate = certificate_issuer::verify(state.db(), &certificate_number)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to verify certificate"))?;

    Ok(Json(VerifyResponse::from_lookup(certificate)))
}

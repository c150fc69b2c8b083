//! `POST /api/referrals` — the form-automation webhook.
//!
//! Deliberately unauthenticated: the caller is an external automation, not a
//! staff session, so the payload contract enforced by `intake::ingest` is the
//! entire trust boundary. No access-gate check happens here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::ApiContext;
use crate::intake::{self, ReferralSubmission};

#[derive(Serialize)]
pub struct ReferralCreated {
    pub success: bool,
    pub referral_id: String,
    pub message: String,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Json(submission): Json<ReferralSubmission>,
) -> Result<(StatusCode, Json<ReferralCreated>), ApiError> {
    let conn = ctx
        .db
        .lock()
        .map_err(|_| ApiError::Internal("database lock poisoned".into()))?;

    let referral_id = intake::ingest(&conn, &submission)?;

    Ok((
        StatusCode::CREATED,
        Json(ReferralCreated {
            success: true,
            referral_id: referral_id.to_string(),
            message: "Referral created successfully".into(),
        }),
    ))
}

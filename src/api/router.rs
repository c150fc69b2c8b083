use axum::routing::{get, post};
use axum::Router;

use super::endpoints;
use super::ApiContext;

/// Build the intake router.
///
/// Returns a `Router` with the webhook endpoints under `/api/`, ready to be
/// mounted on any axum server.
pub fn intake_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/referrals", post(endpoints::referrals::create))
        .route("/api/health", get(endpoints::health::check))
        .with_state(ctx)
}

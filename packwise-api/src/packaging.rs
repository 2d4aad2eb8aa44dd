use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use packwise_catalog::PackagingDescriptor;
use packwise_core::PackagingRequest;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/packaging/resolve", post(resolve_packaging))
}

/// POST /v1/packaging/resolve
/// Packaging quantity, price and unit name for a variant or template
pub async fn resolve_packaging(
    State(state): State<AppState>,
    payload: Result<Json<PackagingRequest>, JsonRejection>,
) -> Result<Json<PackagingDescriptor>, AppError> {
    let Json(request) = payload.map_err(AppError::from_rejection)?;

    let packaging = state.packaging.resolve(&request).await?;
    state.metrics.record_resolution(&packaging);

    tracing::debug!(
        product_id = ?request.product_id,
        template_id = ?request.template_id,
        has_packaging = packaging.has_packaging,
        "packaging resolved"
    );
    Ok(Json(packaging))
}

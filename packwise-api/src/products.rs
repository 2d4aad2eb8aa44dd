use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use packwise_core::ProductDetails;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/products/scan/{code}", get(scan_product))
}

/// GET /v1/products/scan/{code}
/// Product details for a scanned barcode or reference, pack card included
pub async fn scan_product(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ProductDetails>, AppError> {
    let Some((details, snapshot)) = state.search.lookup(&code).await? else {
        state.metrics.record_scan(None);
        return Err(AppError::NotFoundError(format!(
            "No product matches '{}'",
            code.trim()
        )));
    };
    state.metrics.record_scan(Some(details.scanned_as));

    let details = state.enrichment.apply(details, &snapshot);
    Ok(Json(details))
}

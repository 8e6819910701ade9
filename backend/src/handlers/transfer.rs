//! HTTP handlers for transfer endpoints

use axum::{extract::State, Json};
use shared::{TransferOutcome, TransferRequest};

use crate::error::AppResult;
use crate::services::TransferService;
use crate::AppState;

/// Transfer stock between branches
pub async fn transfer_stock(
    State(state): State<AppState>,
    Json(input): Json<TransferRequest>,
) -> AppResult<Json<TransferOutcome>> {
    let service = TransferService::new(state.db);
    let outcome = service.transfer(input).await?;
    Ok(Json(outcome))
}

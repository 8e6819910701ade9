//! HTTP handlers for batch registry endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use shared::{AsOfQuery, Availability, BatchUpdate, BatchView, BranchStockView, NewBatch};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::batch::BatchFilter;
use crate::services::{AllocationService, BatchService};
use crate::AppState;

/// Result of an expiration sweep
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub as_of: NaiveDate,
    pub deactivated: u64,
}

/// List batches
pub async fn list_batches(
    State(state): State<AppState>,
    Query(filter): Query<BatchFilter>,
) -> AppResult<Json<Vec<BatchView>>> {
    let service = BatchService::new(state.db, state.clock);
    let batches = service.list_batches(filter).await?;
    Ok(Json(batches))
}

/// Register an inbound batch
pub async fn register_batch(
    State(state): State<AppState>,
    Json(input): Json<NewBatch>,
) -> AppResult<(StatusCode, Json<BatchView>)> {
    let service = BatchService::new(state.db, state.clock);
    let batch = service.register_batch(input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Get a batch by ID
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<BatchView>> {
    let service = BatchService::new(state.db, state.clock);
    let batch = service.get_batch(batch_id, query.as_of).await?;
    Ok(Json(batch))
}

/// Update a batch
pub async fn update_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<BatchUpdate>,
) -> AppResult<Json<BatchView>> {
    let service = BatchService::new(state.db, state.clock);
    let batch = service.update_batch(batch_id, input).await?;
    Ok(Json(batch))
}

/// Deactivate a batch
pub async fn deactivate_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchView>> {
    let service = BatchService::new(state.db, state.clock);
    let batch = service.deactivate_batch(batch_id).await?;
    Ok(Json(batch))
}

/// Units of a batch still available to allocate
pub async fn get_availability(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Availability>> {
    let service = AllocationService::new(state.db, state.clock);
    let availability = service.availability(batch_id).await?;
    Ok(Json(availability))
}

/// Branch stock rows drawn from a batch
pub async fn list_batch_stocks(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Vec<BranchStockView>>> {
    let service = AllocationService::new(state.db, state.clock);
    let stocks = service.list_by_batch(batch_id).await?;
    Ok(Json(stocks))
}

/// Active batches inside their warning window
pub async fn list_expiring_batches(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Vec<BatchView>>> {
    let as_of = query.resolve(state.clock.as_ref());
    let service = BatchService::new(state.db, state.clock);
    let batches = service.list_expiring_soon(as_of).await?;
    Ok(Json(batches))
}

/// Batches past their expiration date
pub async fn list_expired_batches(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Vec<BatchView>>> {
    let as_of = query.resolve(state.clock.as_ref());
    let service = BatchService::new(state.db, state.clock);
    let batches = service.list_expired(as_of).await?;
    Ok(Json(batches))
}

/// Deactivate every expired batch (daily sweep)
pub async fn deactivate_expired_batches(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<SweepResponse>> {
    let as_of = query.resolve(state.clock.as_ref());
    let service = BatchService::new(state.db, state.clock);
    let deactivated = service.deactivate_all_expired(as_of).await?;
    Ok(Json(SweepResponse { as_of, deactivated }))
}

//! HTTP handlers for branch stock (allocation ledger) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{AllocationRequest, BranchHolding, BranchStock, BranchStockView};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::allocation::{AdjustStockInput, LowStockFilter, MinimumStockInput};
use crate::services::AllocationService;
use crate::AppState;

/// Allocate part of a batch to a branch
pub async fn allocate_stock(
    State(state): State<AppState>,
    Json(input): Json<AllocationRequest>,
) -> AppResult<(StatusCode, Json<BranchStockView>)> {
    let service = AllocationService::new(state.db, state.clock);
    let stock = service.allocate(input).await?;
    Ok((StatusCode::CREATED, Json(stock)))
}

/// Set a stock row's quantity
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(stock_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<BranchStockView>> {
    let service = AllocationService::new(state.db, state.clock);
    let stock = service.adjust(stock_id, input).await?;
    Ok(Json(stock))
}

/// Change a stock row's low-stock threshold
pub async fn update_minimum_stock(
    State(state): State<AppState>,
    Path(stock_id): Path<Uuid>,
    Json(input): Json<MinimumStockInput>,
) -> AppResult<Json<BranchStockView>> {
    let service = AllocationService::new(state.db, state.clock);
    let stock = service.update_minimum_stock(stock_id, input).await?;
    Ok(Json(stock))
}

/// Release a stock row back to its batch
pub async fn release_stock(
    State(state): State<AppState>,
    Path(stock_id): Path<Uuid>,
) -> AppResult<Json<BranchStock>> {
    let service = AllocationService::new(state.db, state.clock);
    let stock = service.release(stock_id).await?;
    Ok(Json(stock))
}

/// Rows at or below their minimum
pub async fn list_low_stock(
    State(state): State<AppState>,
    Query(filter): Query<LowStockFilter>,
) -> AppResult<Json<Vec<BranchStockView>>> {
    let service = AllocationService::new(state.db, state.clock);
    let stocks = service.list_low_stock(filter).await?;
    Ok(Json(stocks))
}

/// Stock rows held by a branch
pub async fn list_branch_stocks(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<BranchStockView>>> {
    let service = AllocationService::new(state.db, state.clock);
    let stocks = service.list_by_branch(branch_id).await?;
    Ok(Json(stocks))
}

/// Per-batch totals held by a branch
pub async fn get_branch_holdings(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<BranchHolding>>> {
    let service = AllocationService::new(state.db, state.clock);
    let holdings = service.branch_holdings(branch_id).await?;
    Ok(Json(holdings))
}

/// Stock rows of a product across branches
pub async fn list_product_stocks(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<BranchStockView>>> {
    let service = AllocationService::new(state.db, state.clock);
    let stocks = service.list_by_product(product_id).await?;
    Ok(Json(stocks))
}

//! HTTP handlers for expiration notification endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use shared::{AsOfQuery, ExpiringNotification, ExpiringStockAlert};

use crate::error::AppResult;
use crate::services::NotificationService;
use crate::AppState;

/// Batches that should raise an expiration warning
pub async fn get_expiring_notifications(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Vec<ExpiringNotification>>> {
    let as_of = query.resolve(state.clock.as_ref());
    let service = NotificationService::new(state.db);
    let notifications = service.expiring_notifications(as_of).await?;
    Ok(Json(notifications))
}

/// Expiration warnings with the affected branch allocations
pub async fn get_expiring_stock(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Vec<ExpiringStockAlert>>> {
    let as_of = query.resolve(state.clock.as_ref());
    let service = NotificationService::new(state.db);
    let alerts = service.expiring_stock(as_of).await?;
    Ok(Json(alerts))
}

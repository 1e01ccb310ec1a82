//! Order lifecycle handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use ink_core::{Order, OrderId, OrderStatus, PackageSnapshot};
use ink_store::Store;

use crate::auth::{AdminIdentity, Identity};
use crate::billing::orders::{create_order, expire_pending, mark_cancelled, mark_paid};
use crate::error::ApiError;
use crate::state::AppState;

/// Order representation returned by the API.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order id.
    pub id: String,
    /// Owning account.
    pub account_id: String,
    /// Base credits snapshotted at creation.
    pub base_credits: i64,
    /// Bonus credits snapshotted at creation.
    pub bonus_credits: i64,
    /// Amount due in minor currency units.
    pub amount_due: i64,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Payment provider label.
    pub provider: String,
    /// Provider transaction id once known.
    pub provider_txn_id: Option<String>,
    /// Frozen package fields.
    pub package: PackageSnapshot,
    /// Creation time.
    pub created_at: String,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            account_id: order.account_id.to_string(),
            base_credits: order.base_credits,
            bonus_credits: order.bonus_credits,
            amount_due: order.amount_due,
            status: order.status,
            provider: order.provider.clone(),
            provider_txn_id: order.provider_txn_id.clone(),
            package: order.package.clone(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// Order creation request.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Catalog package to purchase.
    pub package_id: String,
    /// Payment provider label (default: "portone").
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    "portone".to_string()
}

/// Create a pending order for the calling account.
pub async fn create(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = create_order(
        state.store.as_ref(),
        identity.account_id,
        &body.package_id,
        &body.provider,
        Utc::now(),
    )?;

    Ok(Json(OrderResponse::from(&order)))
}

/// Order list response.
#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    /// Orders, newest first.
    pub orders: Vec<OrderResponse>,
}

/// List the calling account's orders, newest first.
///
/// Pending orders past the payment window are cancelled on the way out;
/// this is the only place expiry happens.
pub async fn list(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<ListOrdersResponse>, ApiError> {
    expire_pending(state.store.as_ref(), &identity.account_id, Utc::now())?;

    let orders = state.store.list_orders(&identity.account_id)?;

    Ok(Json(ListOrdersResponse {
        orders: orders.iter().map(OrderResponse::from).collect(),
    }))
}

/// Admin order list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListAllOrdersQuery {
    /// Maximum number of orders to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// List every order across accounts (admin), newest first.
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Query(query): Query<ListAllOrdersQuery>,
) -> Result<Json<ListOrdersResponse>, ApiError> {
    let orders = state
        .store
        .list_all_orders(query.limit.min(100), query.offset)?;

    Ok(Json(ListOrdersResponse {
        orders: orders.iter().map(OrderResponse::from).collect(),
    }))
}

/// Payment confirmation request.
#[derive(Debug, Deserialize, Default)]
pub struct MarkPaidRequest {
    /// Provider transaction id from the payment gateway.
    pub provider_txn_id: Option<String>,
}

/// Payment confirmation response.
#[derive(Debug, Serialize)]
pub struct MarkPaidResponse {
    /// The order after reconciliation.
    pub order: OrderResponse,
    /// Whether this call performed the credit (false on replay).
    pub credited: bool,
    /// False when the credit landed but the ledger append failed.
    pub applied: bool,
    /// Balance after the credit.
    pub balance_after: i64,
    /// The guarding ledger entry id, when known.
    pub entry_id: Option<String>,
}

/// Confirm payment and credit the order (admin). Safe to retry.
pub async fn paid(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Path(order_id): Path<String>,
    body: Option<Json<MarkPaidRequest>>,
) -> Result<Json<MarkPaidResponse>, ApiError> {
    let order_id = order_id
        .parse::<OrderId>()
        .map_err(|_| ApiError::Validation("invalid order id".into()))?;

    let provider_txn_id = body.and_then(|Json(b)| b.provider_txn_id);

    let outcome = mark_paid(
        state.store.as_ref(),
        order_id,
        admin.0.account_id,
        provider_txn_id,
    )?;

    Ok(Json(MarkPaidResponse {
        order: OrderResponse::from(&outcome.order),
        credited: outcome.credited,
        applied: outcome.applied,
        balance_after: outcome.balance_after,
        entry_id: outcome.entry_id.map(|id| id.to_string()),
    }))
}

/// Cancel an uncredited order. Owners and admins only.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = order_id
        .parse::<OrderId>()
        .map_err(|_| ApiError::Validation("invalid order id".into()))?;

    let order = state
        .store
        .get_order(&order_id)?
        .ok_or_else(|| ApiError::NotFound(format!("order not found: {order_id}")))?;

    if order.account_id != identity.account_id && !identity.role.is_admin() {
        return Err(ApiError::Forbidden);
    }

    let order = mark_cancelled(state.store.as_ref(), order_id)?;

    Ok(Json(OrderResponse::from(&order)))
}

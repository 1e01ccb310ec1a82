//! Order reconciliation: crediting purchases exactly once.

use chrono::{DateTime, Utc};

use ink_core::{AccountId, EntryId, LedgerDetail, LedgerEntry, Order, OrderId, OrderStatus};
use ink_store::Store;

use crate::error::ApiError;

use super::require_account;

/// Result of confirming payment on an order.
#[derive(Debug, Clone)]
pub struct PaidOutcome {
    /// The order after reconciliation.
    pub order: Order,

    /// Whether this call performed the credit (false on replay).
    pub credited: bool,

    /// False when the balance was credited but the ledger append failed.
    pub applied: bool,

    /// Balance after the credit, from this call or the recorded entry.
    pub balance_after: i64,

    /// The `order_paid` ledger entry guarding this order.
    pub entry_id: Option<EntryId>,
}

/// Create a pending order from a catalog package, snapshotting its fields.
///
/// # Errors
///
/// - `ApiError::NotFound` if the account or package doesn't exist.
/// - `ApiError::Validation` if the package is not currently purchasable.
pub fn create_order(
    store: &dyn Store,
    account_id: AccountId,
    package_id: &str,
    provider: &str,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    require_account(store, &account_id)?;

    let package = store
        .get_package(package_id)?
        .ok_or_else(|| ApiError::NotFound(format!("package not found: {package_id}")))?;

    if !package.is_purchasable(now) {
        return Err(ApiError::Validation(format!(
            "package not currently purchasable: {package_id}"
        )));
    }

    let order = Order::pending(account_id, package.snapshot(), package.price, provider);
    store.put_order(&order)?;

    tracing::info!(
        order_id = %order.id,
        account_id = %account_id,
        package_id = %package_id,
        amount_due = order.amount_due,
        "Order created"
    );

    Ok(order)
}

/// Confirm payment and credit the order's pack, exactly once.
///
/// The `order_paid` ledger entry is the idempotency guard: if one already
/// references this order the credit is skipped entirely and only the
/// status is repaired. A crash between crediting and the status flip is
/// therefore safe to retry.
///
/// # Errors
///
/// - `ApiError::NotFound` if the order or its account doesn't exist.
pub fn mark_paid(
    store: &dyn Store,
    order_id: OrderId,
    actor: AccountId,
    provider_txn_id: Option<String>,
) -> Result<PaidOutcome, ApiError> {
    let mut order = require_order(store, &order_id)?;

    if let Some(existing) = store.find_order_credit(&order.account_id, &order_id)? {
        // Already settled. Repair the status if a crash hit between the
        // credit and the flip.
        if order.status != OrderStatus::Paid {
            order.status = OrderStatus::Paid;
            order.updated_at = Utc::now();
            store.put_order(&order)?;
            tracing::warn!(order_id = %order_id, "Repaired order status from recorded credit");
        }
        return Ok(PaidOutcome {
            balance_after: existing.balance_after(),
            entry_id: Some(existing.id),
            order,
            credited: false,
            applied: true,
        });
    }

    let account = require_account(store, &order.account_id)?;
    let total = order.total_credits();
    let target = account.balance + total;
    let previous = store.write_balance(&order.account_id, target)?;
    let delta = target - previous;

    if provider_txn_id.is_some() {
        order.provider_txn_id = provider_txn_id;
    }

    let entry = LedgerEntry::new(
        order.account_id,
        delta,
        LedgerDetail::OrderPaid {
            order_id,
            provider: order.provider.clone(),
            provider_txn_id: order.provider_txn_id.clone(),
            before: previous,
            after: target,
            package: order.package.clone(),
            actor,
        },
    );

    if let Err(e) = store.append_entry(&entry) {
        // Balance credited but no audit row: surface applied=false and
        // leave the status pending so the gap is visible.
        tracing::error!(
            order_id = %order_id,
            account_id = %order.account_id,
            error = %e,
            "Order credited but ledger append failed; manual reconciliation needed"
        );
        return Ok(PaidOutcome {
            order,
            credited: true,
            applied: false,
            balance_after: target,
            entry_id: None,
        });
    }

    // Only after the ledger guard exists does the status flip.
    if order.status != OrderStatus::Paid {
        order.status = OrderStatus::Paid;
        order.updated_at = Utc::now();
        store.put_order(&order)?;
    }

    tracing::info!(
        order_id = %order_id,
        account_id = %order.account_id,
        credits = total,
        balance_after = target,
        "Order paid and credited"
    );

    Ok(PaidOutcome {
        order,
        credited: true,
        applied: true,
        balance_after: target,
        entry_id: Some(entry.id),
    })
}

/// Cancel an order that has not produced a credit.
///
/// # Errors
///
/// - `ApiError::NotFound` if the order doesn't exist.
/// - `ApiError::Conflict` if a credit ledger entry already exists.
pub fn mark_cancelled(store: &dyn Store, order_id: OrderId) -> Result<Order, ApiError> {
    let mut order = require_order(store, &order_id)?;

    if store.find_order_credit(&order.account_id, &order_id)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "order already credited, cannot cancel: {order_id}"
        )));
    }

    if order.status != OrderStatus::Cancelled {
        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();
        store.put_order(&order)?;
        tracing::info!(order_id = %order_id, "Order cancelled");
    }

    Ok(order)
}

/// Cancel pending orders past the 30-minute payment window.
///
/// Invoked as a side effect of listing orders; there is no sweep timer.
///
/// # Errors
///
/// Returns an error if a store operation fails.
pub fn expire_pending(
    store: &dyn Store,
    account_id: &AccountId,
    now: DateTime<Utc>,
) -> Result<usize, ApiError> {
    let mut expired = 0;
    for mut order in store.list_orders(account_id)? {
        if order.is_stale(now) {
            order.status = OrderStatus::Cancelled;
            order.updated_at = now;
            store.put_order(&order)?;
            expired += 1;
        }
    }

    if expired > 0 {
        tracing::info!(account_id = %account_id, expired, "Stale pending orders cancelled");
    }

    Ok(expired)
}

fn require_order(store: &dyn Store, order_id: &OrderId) -> Result<Order, ApiError> {
    store
        .get_order(order_id)?
        .ok_or_else(|| ApiError::NotFound(format!("order not found: {order_id}")))
}

//! Package catalog handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ink_core::Package;
use ink_store::Store;

use crate::auth::AdminIdentity;
use crate::error::ApiError;
use crate::state::AppState;

/// Package representation returned by the API.
#[derive(Debug, Serialize)]
pub struct PackageResponse {
    /// Package id.
    pub id: String,
    /// Base credits granted on purchase.
    pub base_credits: i64,
    /// Promotional bonus credits.
    pub bonus_credits: i64,
    /// Price in minor currency units.
    pub price: i64,
    /// Display label.
    pub label: String,
    /// Display description.
    pub description: String,
    /// Listing position.
    pub sort_order: i32,
}

impl From<&Package> for PackageResponse {
    fn from(package: &Package) -> Self {
        Self {
            id: package.id.clone(),
            base_credits: package.base_credits,
            bonus_credits: package.bonus_credits,
            price: package.price,
            label: package.label.clone(),
            description: package.description.clone(),
            sort_order: package.sort_order,
        }
    }
}

/// Catalog list response.
#[derive(Debug, Serialize)]
pub struct ListPackagesResponse {
    /// Purchasable packages in display order.
    pub packages: Vec<PackageResponse>,
}

/// List currently purchasable packages in display order.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListPackagesResponse>, ApiError> {
    let now = Utc::now();
    let mut packages: Vec<Package> = state
        .store
        .list_packages()?
        .into_iter()
        .filter(|p| p.is_purchasable(now))
        .collect();
    packages.sort_by_key(|p| p.sort_order);

    Ok(Json(ListPackagesResponse {
        packages: packages.iter().map(PackageResponse::from).collect(),
    }))
}

/// Package upsert request (admin).
#[derive(Debug, Deserialize)]
pub struct PutPackageRequest {
    /// Base credits granted on purchase.
    pub base_credits: i64,
    /// Promotional bonus credits (default: 0).
    #[serde(default)]
    pub bonus_credits: i64,
    /// Price in minor currency units.
    pub price: i64,
    /// Display label.
    pub label: String,
    /// Display description (default: empty).
    #[serde(default)]
    pub description: String,
    /// Start of the sale window, if bounded.
    pub active_from: Option<DateTime<Utc>>,
    /// End of the sale window, if bounded.
    pub active_until: Option<DateTime<Utc>>,
    /// Listing position (default: 0).
    #[serde(default)]
    pub sort_order: i32,
    /// Whether the package is offered at all (default: true).
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Create or replace a catalog package (admin).
///
/// Existing orders are unaffected: they hold their own snapshot.
pub async fn put(
    State(state): State<Arc<AppState>>,
    _admin: AdminIdentity,
    Path(package_id): Path<String>,
    Json(body): Json<PutPackageRequest>,
) -> Result<Json<PackageResponse>, ApiError> {
    if body.base_credits < 0 || body.bonus_credits < 0 || body.price < 0 {
        return Err(ApiError::Validation(
            "credits and price must be non-negative".into(),
        ));
    }

    let package = Package {
        id: package_id,
        base_credits: body.base_credits,
        bonus_credits: body.bonus_credits,
        price: body.price,
        label: body.label,
        description: body.description,
        active_from: body.active_from,
        active_until: body.active_until,
        sort_order: body.sort_order,
        is_active: body.is_active,
    };
    state.store.put_package(&package)?;

    tracing::info!(package_id = %package.id, "Package upserted");

    Ok(Json(PackageResponse::from(&package)))
}

//! Core domain types for the ink economy.
//!
//! "Ink points" are the prepaid-usage unit that meters the AI grading
//! feature. This crate holds the pure domain model: strongly-typed ids,
//! accounts with a cached balance, the append-only ledger entry, the cost
//! calculator, purchase orders, catalog packages, and grading sessions.
//! No I/O lives here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod cost;
pub mod ids;
pub mod ledger;
pub mod order;
pub mod package;
pub mod session;
pub mod usage;

pub use account::{Account, Role};
pub use cost::{CostBreakdown, PricingConfig};
pub use ids::{AccountId, EntryId, IdError, OrderId, SessionId};
pub use ledger::{LedgerDetail, LedgerEntry};
pub use order::{Order, OrderStatus, ORDER_PENDING_TTL_MINUTES};
pub use package::{Package, PackageSnapshot};
pub use session::{Session, SessionStatus, SESSION_TTL_MINUTES};
pub use usage::UsageReport;

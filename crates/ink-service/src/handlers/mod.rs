//! HTTP request handlers.

pub mod accounts;
pub mod credits;
pub mod health;
pub mod orders;
pub mod packages;
pub mod sessions;
pub mod usage;

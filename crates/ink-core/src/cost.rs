//! Cost calculator: token counts to an ink-point charge.
//!
//! The conversion is a pure function so every caller (and every test
//! oracle) reproduces the same charge for the same usage report:
//!
//! ```text
//! usd     = input/1e6 * input_rate + output/1e6 * output_rate
//! local   = usd * exchange_rate
//! rounded = ceil(local)
//! fee     = 1 if local >= 1 else 0
//! charge  = rounded + fee
//! ```
//!
//! The fee threshold is strictly `local >= 1` (one local-currency unit),
//! independent of the integer rounding. Zero tokens charge nothing.

use serde::{Deserialize, Serialize};

use crate::UsageReport;

/// Pricing parameters for the cost calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// USD per one million input tokens.
    pub input_rate_usd_per_million: f64,

    /// USD per one million output tokens.
    pub output_rate_usd_per_million: f64,

    /// USD to local-currency exchange rate.
    pub exchange_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_rate_usd_per_million: 0.5,
            output_rate_usd_per_million: 3.0,
            exchange_rate: 33.0,
        }
    }
}

impl PricingConfig {
    /// Convert a usage report into an ink-point charge.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn charge_for(&self, usage: &UsageReport) -> CostBreakdown {
        let usd = usage.input_tokens as f64 / 1_000_000.0 * self.input_rate_usd_per_million
            + usage.output_tokens as f64 / 1_000_000.0 * self.output_rate_usd_per_million;
        let local = usd * self.exchange_rate;
        let rounded = local.ceil() as i64;
        let fee = i64::from(local >= 1.0);

        CostBreakdown {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            usd,
            local,
            rounded,
            fee,
            charge: rounded + fee,
        }
    }
}

/// The full arithmetic behind a charge, persisted with the ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Input token count from the usage report.
    pub input_tokens: u64,

    /// Output token count from the usage report.
    pub output_tokens: u64,

    /// Raw USD cost before conversion.
    pub usd: f64,

    /// Cost in local currency before rounding.
    pub local: f64,

    /// `ceil(local)`.
    pub rounded: i64,

    /// Platform fee: one ink point once the local cost reaches one unit.
    pub fee: i64,

    /// Final charge in ink points (`rounded + fee`), non-negative.
    pub charge: i64,
}

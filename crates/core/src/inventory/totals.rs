//! Invoice total aggregation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tally_shared::config::LineTotalMode;

use crate::error::{LedgerError, LedgerResult};
use crate::invoice::InvoiceLine;
use crate::store::NUMERIC_SCALE;

/// How line amounts combine into an invoice total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTotal {
    /// The sum of every line.
    #[default]
    RunningSum,
    /// Only the last line's amount; earlier lines are ignored.
    LastLine,
}

impl LineTotal {
    /// Combines `lines` into a total.
    pub fn total(self, lines: &[InvoiceLine]) -> LedgerResult<Decimal> {
        match self {
            Self::RunningSum => lines.iter().try_fold(Decimal::ZERO, |sum, line| {
                sum.checked_add(line.amount)
                    .ok_or_else(|| LedgerError::OutOfRange("invoice total".to_string()))
            }),
            Self::LastLine => Ok(lines.last().map_or(Decimal::ZERO, |line| line.amount)),
        }
    }
}

impl From<LineTotalMode> for LineTotal {
    fn from(mode: LineTotalMode) -> Self {
        match mode {
            LineTotalMode::RunningSum => Self::RunningSum,
            LineTotalMode::LastLine => Self::LastLine,
        }
    }
}

/// `unit_price * quantity` rounded half away from zero to the stored scale,
/// failing on overflow.
///
/// Totals are summed from these rounded amounts, so an invoice total always
/// equals the sum of its stored lines.
pub fn line_amount(unit_price: Decimal, quantity: Decimal) -> LedgerResult<Decimal> {
    unit_price
        .checked_mul(quantity)
        .map(|amount| {
            amount.round_dp_with_strategy(NUMERIC_SCALE, RoundingStrategy::MidpointAwayFromZero)
        })
        .ok_or_else(|| LedgerError::OutOfRange("invoice line amount".to_string()))
}

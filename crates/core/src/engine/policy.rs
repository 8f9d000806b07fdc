//! Ledger policy knobs.

use tally_shared::config::LedgerConfig;

use crate::inventory::LineTotal;

/// The tunable rules an engine is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Whether balances may go below zero.
    pub allow_negative_balance: bool,
    /// Whether budget profit may go below zero.
    pub allow_negative_profit: bool,
    /// How invoice lines combine into a total.
    pub line_total: LineTotal,
}

impl LedgerPolicy {
    /// Refuses overdrafts and deficits, keeping the default line total.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            allow_negative_balance: false,
            allow_negative_profit: false,
            ..Self::default()
        }
    }
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            allow_negative_balance: true,
            allow_negative_profit: true,
            line_total: LineTotal::RunningSum,
        }
    }
}

impl From<&LedgerConfig> for LedgerPolicy {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            allow_negative_balance: config.allow_negative_balance,
            allow_negative_profit: config.allow_negative_profit,
            line_total: config.line_total.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_shared::config::LineTotalMode;

    #[test]
    fn test_default_policy_is_permissive() {
        let policy = LedgerPolicy::default();
        assert!(policy.allow_negative_balance);
        assert!(policy.allow_negative_profit);
        assert_eq!(policy.line_total, LineTotal::RunningSum);
    }

    #[test]
    fn test_policy_from_config() {
        let config = LedgerConfig {
            allow_negative_balance: false,
            allow_negative_profit: true,
            line_total: LineTotalMode::LastLine,
        };

        let policy = LedgerPolicy::from(&config);

        assert!(!policy.allow_negative_balance);
        assert!(policy.allow_negative_profit);
        assert_eq!(policy.line_total, LineTotal::LastLine);
    }
}

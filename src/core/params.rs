//! Oracle parameters that can be changed via governance.
//!
//! Parameters are replaced as a whole by an authorized `UpdateParams`
//! message and read by the state machine and the aggregation engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::{DEFAULT_SLASH_WINDOW, DEFAULT_VOTE_PERIOD};

// ═══════════════════════════════════════════════════════════════════════════════
// MEDIAN TIE-BREAK
// ═══════════════════════════════════════════════════════════════════════════════

/// Which side wins when the cumulative power lands exactly on half the ballot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedianTieBreak {
    /// The lower rate wins an exact half-weight split
    Lower,
    /// The higher rate wins an exact half-weight split
    Upper,
}

impl Default for MedianTieBreak {
    fn default() -> Self {
        Self::Lower
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARAMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Process-wide oracle configuration.
///
/// Decimals serialize as strings so the struct round-trips through bincode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Length of a voting period in blocks
    pub vote_period: u64,
    /// Fraction of total bonded power a ballot needs to publish a rate
    #[serde(with = "rust_decimal::serde::str")]
    pub vote_threshold: Decimal,
    /// Width of the reward band around the median, as a fraction of it
    #[serde(with = "rust_decimal::serde::str")]
    pub reward_band: Decimal,
    /// Fraction of stake a slashing collaborator may take from a candidate
    #[serde(with = "rust_decimal::serde::str")]
    pub slash_fraction: Decimal,
    /// Length of a slash window in blocks
    pub slash_window: u64,
    /// Minimum fraction of valid votes per slash window
    #[serde(with = "rust_decimal::serde::str")]
    pub min_valid_per_window: Decimal,
    /// Tie-break policy for the weighted median
    #[serde(default)]
    pub median_tie_break: MedianTieBreak,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            vote_period: DEFAULT_VOTE_PERIOD,
            vote_threshold: Decimal::new(50, 2),      // 50%
            reward_band: Decimal::new(2, 2),          // 2%
            slash_fraction: Decimal::new(1, 4),       // 0.01%
            slash_window: DEFAULT_SLASH_WINDOW,
            min_valid_per_window: Decimal::new(5, 2), // 5%
            median_tie_break: MedianTieBreak::Lower,
        }
    }
}

impl Params {
    /// Short periods for local networks and tests
    pub fn testnet() -> Self {
        Self {
            vote_period: 5,
            slash_window: 50,
            ..Default::default()
        }
    }

    /// Builder-style vote period override
    pub fn with_vote_period(mut self, vote_period: u64) -> Self {
        self.vote_period = vote_period;
        self
    }

    /// Builder-style vote threshold override
    pub fn with_vote_threshold(mut self, threshold: Decimal) -> Self {
        self.vote_threshold = threshold;
        self
    }

    /// Number of vote periods in one slash window
    pub fn periods_per_window(&self) -> u64 {
        if self.vote_period == 0 {
            return 0;
        }
        self.slash_window / self.vote_period
    }

    /// Validate parameters are within bounds and consistent
    pub fn validate(&self) -> Result<()> {
        if self.vote_period == 0 {
            return Err(invalid("vote_period", "must be greater than 0"));
        }
        if self.vote_threshold <= Decimal::new(33, 2) {
            return Err(invalid("vote_threshold", "must be greater than 33%"));
        }
        if self.vote_threshold > Decimal::ONE {
            return Err(invalid("vote_threshold", "cannot exceed 100%"));
        }
        for (name, value) in [
            ("reward_band", self.reward_band),
            ("slash_fraction", self.slash_fraction),
            ("min_valid_per_window", self.min_valid_per_window),
        ] {
            if value.is_sign_negative() || value > Decimal::ONE {
                return Err(invalid(name, "must be within [0, 1]"));
            }
        }
        if self.slash_window < self.vote_period {
            return Err(invalid("slash_window", "must be at least one vote period"));
        }
        if self.slash_window % self.vote_period != 0 {
            return Err(invalid("slash_window", "must be a multiple of vote_period"));
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: &str) -> Error {
    Error::InvalidParameter {
        name: name.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(Params::default().validate().is_ok());
        assert!(Params::testnet().validate().is_ok());
        assert_eq!(Params::default().periods_per_window(), 7200);
    }

    #[test]
    fn test_threshold_bounds() {
        let low = Params::default().with_vote_threshold(Decimal::new(33, 2));
        assert!(low.validate().is_err());

        let high = Params::default().with_vote_threshold(Decimal::new(101, 2));
        assert!(high.validate().is_err());

        let ok = Params::default().with_vote_threshold(Decimal::new(34, 2));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_window_must_align_with_period() {
        let mut params = Params::default().with_vote_period(10);
        params.slash_window = 95;
        assert!(params.validate().is_err());

        params.slash_window = 5;
        assert!(params.validate().is_err());

        params.slash_window = 100;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_fraction_bounds() {
        let mut params = Params::default();
        params.reward_band = Decimal::new(-1, 2);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_tie_break() {
        let mut params = Params::default();
        params.median_tie_break = MedianTieBreak::Upper;
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"upper\""));
        let back: Params = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_bincode_roundtrip() {
        let mut params = Params::testnet();
        params.vote_threshold = Decimal::new(667, 3);
        let bytes = bincode::serialize(&params).unwrap();
        let back: Params = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, params);
    }
}

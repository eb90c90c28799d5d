//! Static risk tiering of a VBAC success probability.
//!
//! Tiers are keyed off P(VBAC), so a *high* probability is *low* risk:
//!
//! | probability          | tier   |
//! |----------------------|--------|
//! | `>= 0.70`            | Low    |
//! | `>= 0.40` and `< 0.70` | Medium |
//! | `< 0.40`             | High   |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest probability classified as [`RiskTier::Low`]
pub const LOW_RISK_MIN_PROBABILITY: f64 = 0.70;
/// Lowest probability classified as [`RiskTier::Medium`]
pub const MEDIUM_RISK_MIN_PROBABILITY: f64 = 0.40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= LOW_RISK_MIN_PROBABILITY {
            RiskTier::Low
        } else if probability >= MEDIUM_RISK_MIN_PROBABILITY {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            RiskTier::Low => {
                "Your chances for a successful VBAC are favorable. Consider discussing your birth plan with your healthcare provider."
            }
            RiskTier::Medium => {
                "You have a moderate chance of VBAC success. Carefully weigh the benefits and risks with your healthcare team."
            }
            RiskTier::High => {
                "Your VBAC success probability is lower than average. Please consult with your healthcare provider about the safest delivery option for you."
            }
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        };
        f.write_str(s)
    }
}

/// Client-facing prediction summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Percentage in [0, 100], one decimal place
    pub probability: f64,
    pub risk_level: RiskTier,
    pub message: String,
}

impl Assessment {
    /// Tier and message are derived from the unrounded probability
    pub fn from_probability(probability: f64) -> Self {
        let p = probability.clamp(0.0, 1.0);
        let tier = RiskTier::from_probability(p);
        Self {
            probability: (p * 1000.0).round() / 10.0,
            risk_level: tier,
            message: tier.recommendation().to_string(),
        }
    }
}

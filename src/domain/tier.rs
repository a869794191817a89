// src/domain/tier.rs
//
// Candidate-selection tiers. Each wider tier includes every narrower one:
// LOW ⊆ MEDIUM ⊆ HIGH ⊆ ALL.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    /// Placeholder videos only (no title yet)
    Low,
    /// Adds videos missing duration or channel linkage
    Medium,
    /// Adds videos never enriched or missing view counts
    High,
    /// Every video
    All,
}

impl PriorityTier {
    /// All tiers, narrowest first
    pub const ORDERED: [PriorityTier; 4] = [
        PriorityTier::Low,
        PriorityTier::Medium,
        PriorityTier::High,
        PriorityTier::All,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PriorityTier::Low => "low",
            PriorityTier::Medium => "medium",
            PriorityTier::High => "high",
            PriorityTier::All => "all",
        }
    }

    /// True when every candidate of `other` is also a candidate of `self`.
    pub fn includes(self, other: PriorityTier) -> bool {
        self >= other
    }
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PriorityTier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(PriorityTier::Low),
            "medium" => Ok(PriorityTier::Medium),
            "high" => Ok(PriorityTier::High),
            "all" => Ok(PriorityTier::All),
            _ => Err(DomainError::UnknownPriorityTier(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<PriorityTier>().unwrap(), PriorityTier::High);
        assert_eq!("Medium".parse::<PriorityTier>().unwrap(), PriorityTier::Medium);
        assert_eq!(" low ".parse::<PriorityTier>().unwrap(), PriorityTier::Low);
        assert_eq!("all".parse::<PriorityTier>().unwrap(), PriorityTier::All);
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let err = "urgent".parse::<PriorityTier>().unwrap_err();
        assert!(matches!(err, DomainError::UnknownPriorityTier(ref s) if s == "urgent"));
    }

    #[test]
    fn test_tiers_are_cumulative() {
        assert!(PriorityTier::All.includes(PriorityTier::High));
        assert!(PriorityTier::High.includes(PriorityTier::Medium));
        assert!(PriorityTier::Medium.includes(PriorityTier::Low));
        assert!(!PriorityTier::Low.includes(PriorityTier::Medium));
        for tier in PriorityTier::ORDERED {
            assert!(tier.includes(tier));
        }
    }
}

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use shopbooks_core::{DomainError, DomainResult, ProductId};

use crate::level::StockLevel;

/// What to do when a stock-out exceeds the available stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversellPolicy {
    /// Record the movement anyway; the cached counter floors at zero.
    #[default]
    Permit,
    /// Fail with an invariant violation.
    Reject,
}

impl OversellPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OversellPolicy::Permit => "permit",
            OversellPolicy::Reject => "reject",
        }
    }

    /// Check an issue of `quantity` units against the authoritative level.
    pub fn check(&self, product: ProductId, level: &StockLevel, quantity: i64) -> DomainResult<()> {
        match self {
            OversellPolicy::Permit => Ok(()),
            OversellPolicy::Reject if level.would_oversell(quantity) => {
                Err(DomainError::invariant(format!(
                    "insufficient stock for product {product}: requested {quantity}, available {}",
                    level.available
                )))
            }
            OversellPolicy::Reject => Ok(()),
        }
    }
}

impl FromStr for OversellPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permit" => Ok(OversellPolicy::Permit),
            "reject" => Ok(OversellPolicy::Reject),
            other => Err(DomainError::validation(format!(
                "unknown oversell policy '{other}' (expected permit or reject)"
            ))),
        }
    }
}

impl core::fmt::Display for OversellPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permit_never_blocks() {
        let level = StockLevel::new(0, 0);
        assert!(OversellPolicy::Permit.check(ProductId::new(), &level, 10).is_ok());
    }

    #[test]
    fn reject_blocks_beyond_available() {
        let level = StockLevel::new(5, 0);
        let p = ProductId::new();
        assert!(OversellPolicy::Reject.check(p, &level, 5).is_ok());
        assert!(matches!(
            OversellPolicy::Reject.check(p, &level, 6),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" Reject ".parse::<OversellPolicy>().unwrap(), OversellPolicy::Reject);
        assert_eq!("permit".parse::<OversellPolicy>().unwrap(), OversellPolicy::Permit);
        assert!("sometimes".parse::<OversellPolicy>().is_err());
    }
}

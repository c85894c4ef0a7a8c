//! Governance authority resolution.
//!
//! Required denoms and params may only be changed by the governance
//! authority. Who that is belongs to the host ledger; the oracle asks an
//! [`AuthorityResolver`].

use serde::{Deserialize, Serialize};

use crate::core::address::AccAddress;
use crate::core::params::Params;
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// GOVERNANCE ACTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Operations gated on the governance authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceAction {
    /// Add a denom to the required set
    AddRequiredDenom {
        /// Denom to add
        denom: String,
    },

    /// Remove a denom from the required set
    RemoveRequiredDenom {
        /// Denom to remove
        denom: String,
    },

    /// Replace params
    UpdateParams {
        /// New params
        params: Params,
    },
}

impl GovernanceAction {
    /// Get action name
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddRequiredDenom { .. } => "Add Required Denom",
            Self::RemoveRequiredDenom { .. } => "Remove Required Denom",
            Self::UpdateParams { .. } => "Update Params",
        }
    }

    /// Get description of the action
    pub fn describe(&self) -> String {
        match self {
            Self::AddRequiredDenom { denom } => format!("Add required denom {}", denom),
            Self::RemoveRequiredDenom { denom } => format!("Remove required denom {}", denom),
            Self::UpdateParams { params } => {
                format!("Update params (vote period {})", params.vote_period)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLVER
// ═══════════════════════════════════════════════════════════════════════════════

/// Decides whether a principal may perform a governance action
pub trait AuthorityResolver {
    /// Whether `principal` may perform `action`
    fn is_authorized(&self, principal: &AccAddress, action: &GovernanceAction) -> bool;

    /// Fail with [`Error::UnauthorizedAction`] unless authorized
    fn ensure_authorized(&self, principal: &AccAddress, action: &GovernanceAction) -> Result<()> {
        if self.is_authorized(principal, action) {
            Ok(())
        } else {
            Err(Error::UnauthorizedAction(format!(
                "{} is not the governance authority: {}",
                principal,
                action.describe()
            )))
        }
    }
}

/// A single fixed authority account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedAuthority {
    authority: AccAddress,
}

impl FixedAuthority {
    /// Create a resolver for one authority account
    pub fn new(authority: AccAddress) -> Self {
        Self { authority }
    }

    /// The authority account
    pub fn authority(&self) -> &AccAddress {
        &self.authority
    }
}

impl AuthorityResolver for FixedAuthority {
    fn is_authorized(&self, principal: &AccAddress, _action: &GovernanceAction) -> bool {
        *principal == self.authority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_authority() {
        let gov = AccAddress::from_bytes(&[1; 20]).unwrap();
        let other = AccAddress::from_bytes(&[2; 20]).unwrap();
        let resolver = FixedAuthority::new(gov.clone());
        let action = GovernanceAction::AddRequiredDenom { denom: "BTC".into() };

        assert!(resolver.ensure_authorized(&gov, &action).is_ok());
        assert!(matches!(
            resolver.ensure_authorized(&other, &action),
            Err(Error::UnauthorizedAction(_))
        ));
    }

    #[test]
    fn test_describe() {
        let action = GovernanceAction::RemoveRequiredDenom { denom: "ETH".into() };
        assert_eq!(action.name(), "Remove Required Denom");
        assert_eq!(action.describe(), "Remove required denom ETH");
    }
}

//! Required denom whitelist.
//!
//! Only required denoms are tallied. Changes are idempotent: adding a
//! present denom or removing an absent one succeeds without effect.

use tracing::info;

use crate::core::address::AccAddress;
use crate::error::Result;
use crate::governance::authority::{AuthorityResolver, GovernanceAction};
use crate::storage::backend::StorageBackend;
use crate::storage::state::OracleStore;
use crate::utils::validation::validate_denom;

/// Governance-controlled required denom set
pub struct DenomWhitelist<'a, B: StorageBackend, A: AuthorityResolver> {
    store: &'a OracleStore<B>,
    authority: &'a A,
}

impl<'a, B: StorageBackend, A: AuthorityResolver> DenomWhitelist<'a, B, A> {
    /// Create a whitelist manager
    pub fn new(store: &'a OracleStore<B>, authority: &'a A) -> Self {
        Self { store, authority }
    }

    /// Add a denom, returning whether the set changed
    pub fn add(&self, principal: &AccAddress, denom: &str) -> Result<bool> {
        self.authority.ensure_authorized(
            principal,
            &GovernanceAction::AddRequiredDenom {
                denom: denom.to_string(),
            },
        )?;
        validate_denom(denom)?;

        let added = self.store.add_required_denom(denom)?;
        if added {
            info!(denom, "required denom added");
        }
        Ok(added)
    }

    /// Remove a denom, returning whether the set changed
    pub fn remove(&self, principal: &AccAddress, denom: &str) -> Result<bool> {
        self.authority.ensure_authorized(
            principal,
            &GovernanceAction::RemoveRequiredDenom {
                denom: denom.to_string(),
            },
        )?;
        validate_denom(denom)?;

        let removed = self.store.remove_required_denom(denom)?;
        if removed {
            info!(denom, "required denom removed");
        }
        Ok(removed)
    }

    /// Whether a denom is required
    pub fn contains(&self, denom: &str) -> Result<bool> {
        self.store.is_required_denom(denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::governance::authority::FixedAuthority;
    use crate::storage::backend::InMemoryStore;

    fn gov() -> AccAddress {
        AccAddress::from_bytes(&[7; 20]).unwrap()
    }

    #[test]
    fn test_add_remove_idempotent() {
        let store = OracleStore::new(InMemoryStore::new());
        let authority = FixedAuthority::new(gov());
        let whitelist = DenomWhitelist::new(&store, &authority);

        assert!(whitelist.add(&gov(), "ATOM").unwrap());
        assert!(!whitelist.add(&gov(), "ATOM").unwrap());
        assert!(whitelist.contains("ATOM").unwrap());

        assert!(whitelist.remove(&gov(), "ATOM").unwrap());
        assert!(!whitelist.remove(&gov(), "ATOM").unwrap());
        assert!(!whitelist.contains("ATOM").unwrap());
    }

    #[test]
    fn test_requires_authority() {
        let store = OracleStore::new(InMemoryStore::new());
        let authority = FixedAuthority::new(gov());
        let whitelist = DenomWhitelist::new(&store, &authority);
        let stranger = AccAddress::from_bytes(&[8; 20]).unwrap();

        assert!(matches!(
            whitelist.add(&stranger, "ATOM"),
            Err(Error::UnauthorizedAction(_))
        ));
        assert!(!whitelist.contains("ATOM").unwrap());
    }

    #[test]
    fn test_rejects_bad_denom() {
        let store = OracleStore::new(InMemoryStore::new());
        let authority = FixedAuthority::new(gov());
        let whitelist = DenomWhitelist::new(&store, &authority);

        assert!(matches!(
            whitelist.add(&gov(), "9X"),
            Err(Error::InvalidDenom { .. })
        ));
    }
}

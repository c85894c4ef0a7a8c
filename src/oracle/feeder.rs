//! Feeder delegation.
//!
//! A validator may let another account submit prevotes and votes on its
//! behalf. Without a delegation the validator's own account is its feeder.

use tracing::debug;

use crate::core::address::{AccAddress, AddressCodec, ValAddress};
use crate::error::{Error, Result};
use crate::storage::backend::StorageBackend;
use crate::storage::state::OracleStore;

/// Validator to feeder mapping
pub struct FeederRegistry<'a, B: StorageBackend> {
    store: &'a OracleStore<B>,
}

impl<'a, B: StorageBackend> FeederRegistry<'a, B> {
    /// Create a registry over the oracle store
    pub fn new(store: &'a OracleStore<B>) -> Self {
        Self { store }
    }

    /// Authorize `feeder` for `validator`, replacing any previous delegate
    pub fn delegate(&self, validator: &ValAddress, feeder: &AccAddress) -> Result<()> {
        self.store.set_feeder_delegation(validator, feeder)?;
        debug!(
            validator = %validator.short(),
            feeder = %feeder.short(),
            "feeder delegated"
        );
        Ok(())
    }

    /// Account currently allowed to feed for `validator`
    pub fn resolve_feeder(&self, validator: &ValAddress) -> Result<AccAddress> {
        Ok(self
            .store
            .feeder_delegation(validator)?
            .unwrap_or_else(|| validator.to_account()))
    }

    /// Whether `submitter` may feed for `validator`
    pub fn authorize(&self, submitter: &AccAddress, validator: &ValAddress) -> Result<bool> {
        Ok(*submitter == self.resolve_feeder(validator)?)
    }

    /// Like [`authorize`](Self::authorize) but failing with
    /// [`Error::UnauthorizedFeeder`], addresses rendered through `codec`
    pub fn ensure_authorized(
        &self,
        submitter: &AccAddress,
        validator: &ValAddress,
        codec: &AddressCodec,
    ) -> Result<()> {
        let expected = self.resolve_feeder(validator)?;
        if *submitter == expected {
            return Ok(());
        }
        Err(Error::UnauthorizedFeeder {
            validator: codec.encode_validator(validator)?,
            submitter: codec.encode_account(submitter)?,
            expected: codec.encode_account(&expected)?,
        })
    }
}

// 4.0 issuer.rs: the authority scope behind one debt asset. exactly one issuer
// per debt asset; its admin is the only identity allowed to authorize markets,
// and its authority account holds every market reserve and signs every mint.

use crate::types::{AccountId, AssetId, IssuerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub id: IssuerId,
    /// May authorize new markets; receives admin fees.
    pub admin: AccountId,
    /// The debt asset this issuer mints and controls.
    pub debt_asset: AssetId,
    /// Derived signer scope. Opaque to the core: the host ledger derives the
    /// real address, the engine only routes reserves and mints through it.
    pub authority: AccountId,
}

impl Issuer {
    pub fn new(id: IssuerId, admin: AccountId, debt_asset: AssetId, authority: AccountId) -> Self {
        Self {
            id,
            admin,
            debt_asset,
            authority,
        }
    }

    pub fn is_admin(&self, caller: AccountId) -> bool {
        caller == self.admin
    }
}

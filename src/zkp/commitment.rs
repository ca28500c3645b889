// Commitment / nullifier / vote-option-hash derivation
use std::sync::Arc;

use crate::primitives::{FieldElement, Result};
use super::poseidon::{CircomPoseidon, FieldHasher};

/// Private voter secret. Generated client-side and never submitted.
pub type VoterSecret = FieldElement;
/// H(secret), registered once per eligible voter
pub type Commitment = FieldElement;
/// H(secret, domain tag), spent once per vote
pub type Nullifier = FieldElement;
/// H(option, salt), hides the choice until the reveal phase
pub type VoteOptionHash = FieldElement;
/// Random blinding value for the vote option hash
pub type VoteSalt = FieldElement;
/// Vote options are 1-based: valid values are 1..=options_count
pub type VoteOption = u32;

/// Domain tag separating nullifier derivation from the commitment hash
pub const NULLIFIER_DOMAIN_TAG: u64 = 0;

/// Deterministic derivations over an injected hash capability.
#[derive(Clone)]
pub struct CommitmentScheme {
    hasher: Arc<dyn FieldHasher>,
}

impl CommitmentScheme {
    pub fn new(hasher: Arc<dyn FieldHasher>) -> Self {
        Self { hasher }
    }

    /// Scheme over circomlib Poseidon, the hash the circuits are built on
    pub fn poseidon() -> Self {
        Self::new(Arc::new(CircomPoseidon))
    }

    pub fn derive_commitment(&self, secret: &VoterSecret) -> Result<Commitment> {
        self.hasher.hash(&[*secret])
    }

    pub fn derive_nullifier(&self, secret: &VoterSecret, domain_tag: &FieldElement) -> Result<Nullifier> {
        self.hasher.hash(&[*secret, *domain_tag])
    }

    pub fn derive_nullifier_default(&self, secret: &VoterSecret) -> Result<Nullifier> {
        self.derive_nullifier(secret, &FieldElement::from_u64(NULLIFIER_DOMAIN_TAG))
    }

    pub fn derive_vote_option_hash(&self, option: VoteOption, salt: &VoteSalt) -> Result<VoteOptionHash> {
        self.hasher.hash(&[FieldElement::from(option), *salt])
    }
}

impl Default for CommitmentScheme {
    fn default() -> Self {
        Self::poseidon()
    }
}

impl std::fmt::Debug for CommitmentScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitmentScheme").finish_non_exhaustive()
    }
}

// Anonymous commit-reveal ballot engine
// Voters register a Poseidon commitment, cast with a Groth16 proof and a
// one-time nullifier, and open their choice with a second proof.

pub mod primitives;
pub mod zkp;
pub mod voting;
pub mod config;

// Re-export key types for easy access
pub use primitives::{
    primitives::*,
    error::*,
    field::*,
};

pub use zkp::{
    CircomPoseidon, CircuitId, CircuitKeyStore, CircuitWitness, Commitment, CommitmentScheme, ContractProof,
    FieldHasher, GeneratedProof, Groth16Prover, Groth16Verifier, Nullifier, ProofBridge, ProofOracle,
    ProofVerifier, SnarkProof, VoteOption, VoteOptionHash, VoteSalt, VoterSecret,
};

pub use voting::{
    AuditRecord, Ballot, Clock, Election, ElectionEvent, ElectionMode, HiddenBallot, ManualClock, OpenBallot,
    Phase, RevealBallot, SystemClock, TallyLedger,
};

pub use config::ElectionConfig;

#[cfg(test)]
mod tests;

// Error types for the ballot protocol engine
use thiserror::Error;

use super::primitives::Principal;
use crate::voting::Phase;

pub type Result<T> = std::result::Result<T, VotingError>;

/// Every failure names the precondition it violated. No variant is raised
/// after a partial state mutation.
#[derive(Error, Debug)]
pub enum VotingError {
    #[error("Unauthorized: {0} is not the election administrator")]
    Unauthorized(Principal),

    #[error("Phase error: {operation} requires {required}, election is in {current}")]
    PhaseError {
        operation: &'static str,
        required: &'static str,
        current: Phase,
    },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("Unsupported operation: {operation} is not available in {mode} elections")]
    UnsupportedOperation {
        operation: &'static str,
        mode: &'static str,
    },

    #[error("Results not revealed: the administrator has not published the tally")]
    ResultsNotRevealed,

    #[error("Voter not registered: commitment {0}")]
    VoterNotRegistered(String),

    #[error("Nullifier already used: {0}")]
    NullifierAlreadyUsed(String),

    #[error("Unknown nullifier: {0}")]
    UnknownNullifier(String),

    #[error("Vote already revealed for nullifier {0}")]
    AlreadyRevealed(String),

    #[error("Invalid vote option {option}: expected 1..={options_count}")]
    InvalidOption { option: String, options_count: u32 },

    #[error("Proof verification failed for {0} circuit")]
    ProofVerificationFailed(String),

    #[error("Proof generation failed: {0}")]
    ProofGenerationError(String),

    #[error("Invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("Invalid proof encoding: {0}")]
    InvalidProofEncoding(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for VotingError {
    fn from(err: std::io::Error) -> Self {
        VotingError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VotingError {
    fn from(err: serde_json::Error) -> Self {
        VotingError::Serialization(err.to_string())
    }
}

impl From<ark_serialize::SerializationError> for VotingError {
    fn from(err: ark_serialize::SerializationError) -> Self {
        VotingError::Serialization(err.to_string())
    }
}

impl From<light_poseidon::PoseidonError> for VotingError {
    fn from(err: light_poseidon::PoseidonError) -> Self {
        VotingError::Hash(err.to_string())
    }
}

// Submissions accepted by the election state machine
use serde::{Deserialize, Serialize};

use crate::zkp::{Commitment, ContractProof, Nullifier, VoteOption, VoteOptionHash};

/// Commit-reveal cast: proves membership and binds a hidden option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenBallot {
    pub proof: ContractProof,
    pub commitment: Commitment,
    pub nullifier: Nullifier,
    pub vote_option_hash: VoteOptionHash,
}

/// Single-phase cast with the option in the clear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenBallot {
    pub proof: ContractProof,
    pub commitment: Commitment,
    pub option: VoteOption,
    pub nullifier: Nullifier,
}

/// Opens a previously cast hidden ballot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealBallot {
    pub proof: ContractProof,
    pub nullifier: Nullifier,
    pub option: VoteOption,
}

/// The two cast variants, selected by the election mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ballot {
    Hidden(HiddenBallot),
    Open(OpenBallot),
}

impl Ballot {
    pub fn nullifier(&self) -> &Nullifier {
        match self {
            Ballot::Hidden(ballot) => &ballot.nullifier,
            Ballot::Open(ballot) => &ballot.nullifier,
        }
    }

    pub fn commitment(&self) -> &Commitment {
        match self {
            Ballot::Hidden(ballot) => &ballot.commitment,
            Ballot::Open(ballot) => &ballot.commitment,
        }
    }
}

impl From<HiddenBallot> for Ballot {
    fn from(ballot: HiddenBallot) -> Self {
        Ballot::Hidden(ballot)
    }
}

impl From<OpenBallot> for Ballot {
    fn from(ballot: OpenBallot) -> Self {
        Ballot::Open(ballot)
    }
}

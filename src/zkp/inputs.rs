// Circuit identifiers and their public/private input contracts
use serde::{Deserialize, Serialize};

use crate::primitives::{FieldElement, Result, VotingError};
use super::commitment::{Commitment, Nullifier, VoteOption, VoteOptionHash, VoteSalt, VoterSecret};

/// Circuits the protocol proves against. Keys and artifacts are addressed by these ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitId {
    /// Hidden-choice cast: proves commitment, nullifier and option hash share one secret
    Vote,
    /// Reveal: proves an option/salt pair opens a stored option hash
    Reveal,
    /// Single-phase cast with the option in the clear
    OpenBallot,
}

impl CircuitId {
    pub const ALL: [CircuitId; 3] = [CircuitId::Vote, CircuitId::Reveal, CircuitId::OpenBallot];

    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitId::Vote => "vote",
            CircuitId::Reveal => "reveal",
            CircuitId::OpenBallot => "open_ballot",
        }
    }

    /// Public signal layout, in the order the circuit allocates its instance variables
    pub fn public_signal_names(&self) -> &'static [&'static str] {
        match self {
            CircuitId::Vote => &["commitment", "nullifier", "vote_option_hash"],
            CircuitId::Reveal => &["nullifier", "vote_option_hash", "option"],
            CircuitId::OpenBallot => &["commitment", "option", "nullifier"],
        }
    }

    pub fn num_public_signals(&self) -> usize {
        self.public_signal_names().len()
    }
}

impl std::fmt::Display for CircuitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CircuitId {
    type Err = VotingError;

    fn from_str(s: &str) -> Result<Self> {
        CircuitId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| VotingError::Configuration(format!("unknown circuit '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotePrivateInputs {
    pub secret: VoterSecret,
    pub option: VoteOption,
    pub salt: VoteSalt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotePublicInputs {
    pub commitment: Commitment,
    pub nullifier: Nullifier,
    pub vote_option_hash: VoteOptionHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealPrivateInputs {
    pub salt: VoteSalt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealPublicInputs {
    pub nullifier: Nullifier,
    pub vote_option_hash: VoteOptionHash,
    pub option: VoteOption,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBallotPrivateInputs {
    pub secret: VoterSecret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenBallotPublicInputs {
    pub commitment: Commitment,
    pub option: VoteOption,
    pub nullifier: Nullifier,
}

impl VotePublicInputs {
    pub fn to_signals(&self) -> Vec<FieldElement> {
        vec![self.commitment, self.nullifier, self.vote_option_hash]
    }

    pub fn from_signals(signals: &[FieldElement]) -> Result<Self> {
        expect_len(CircuitId::Vote, signals)?;
        Ok(Self {
            commitment: signals[0],
            nullifier: signals[1],
            vote_option_hash: signals[2],
        })
    }
}

impl RevealPublicInputs {
    pub fn to_signals(&self) -> Vec<FieldElement> {
        vec![self.nullifier, self.vote_option_hash, FieldElement::from(self.option)]
    }

    pub fn from_signals(signals: &[FieldElement]) -> Result<Self> {
        expect_len(CircuitId::Reveal, signals)?;
        Ok(Self {
            nullifier: signals[0],
            vote_option_hash: signals[1],
            option: option_from_signal(&signals[2])?,
        })
    }
}

impl OpenBallotPublicInputs {
    pub fn to_signals(&self) -> Vec<FieldElement> {
        vec![self.commitment, FieldElement::from(self.option), self.nullifier]
    }

    pub fn from_signals(signals: &[FieldElement]) -> Result<Self> {
        expect_len(CircuitId::OpenBallot, signals)?;
        Ok(Self {
            commitment: signals[0],
            option: option_from_signal(&signals[1])?,
            nullifier: signals[2],
        })
    }
}

/// Complete assignment for one proof: private witness plus public inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitWitness {
    Vote {
        private: VotePrivateInputs,
        public: VotePublicInputs,
    },
    Reveal {
        private: RevealPrivateInputs,
        public: RevealPublicInputs,
    },
    OpenBallot {
        private: OpenBallotPrivateInputs,
        public: OpenBallotPublicInputs,
    },
}

impl CircuitWitness {
    pub fn circuit_id(&self) -> CircuitId {
        match self {
            CircuitWitness::Vote { .. } => CircuitId::Vote,
            CircuitWitness::Reveal { .. } => CircuitId::Reveal,
            CircuitWitness::OpenBallot { .. } => CircuitId::OpenBallot,
        }
    }

    pub fn public_signals(&self) -> Vec<FieldElement> {
        match self {
            CircuitWitness::Vote { public, .. } => public.to_signals(),
            CircuitWitness::Reveal { public, .. } => public.to_signals(),
            CircuitWitness::OpenBallot { public, .. } => public.to_signals(),
        }
    }
}

fn expect_len(circuit: CircuitId, signals: &[FieldElement]) -> Result<()> {
    if signals.len() != circuit.num_public_signals() {
        return Err(VotingError::InvalidProofEncoding(format!(
            "{} circuit expects {} public signals, got {}",
            circuit,
            circuit.num_public_signals(),
            signals.len()
        )));
    }
    Ok(())
}

fn option_from_signal(signal: &FieldElement) -> Result<VoteOption> {
    signal
        .to_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| VotingError::InvalidProofEncoding(format!("option signal {} does not fit in u32", signal)))
}

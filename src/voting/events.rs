// Audit trail of successful election mutations
use serde::{Deserialize, Serialize};

use crate::primitives::Timestamp;
use crate::zkp::{Commitment, Nullifier, VoteOption, VoteOptionHash};
use super::phase::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ElectionEvent {
    VoterRegistered { commitment: Commitment },
    PhaseChanged { from: Phase, to: Phase },
    /// Commit-reveal cast: only the option hash is known
    VoteCast { nullifier: Nullifier, vote_option_hash: VoteOptionHash },
    /// Open ballot cast: the option is counted immediately
    OpenVoteCast { nullifier: Nullifier, option: VoteOption },
    VoteRevealed { nullifier: Nullifier, option: VoteOption },
    VotingExtended { voting_end_time: Timestamp },
    ResultsRevealed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: u64,
    pub at: Timestamp,
    #[serde(flatten)]
    pub event: ElectionEvent,
}

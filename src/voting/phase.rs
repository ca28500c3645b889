// Election lifecycle phases and deployment modes
use serde::{Deserialize, Serialize};

/// Lifecycle phase. Ordering follows the discriminants, and transitions only
/// ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    Registration = 0,
    Voting = 1,
    Revealing = 2,
    Ended = 3,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Registration, Phase::Voting, Phase::Revealing, Phase::Ended];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Phase> {
        Phase::ALL.into_iter().find(|p| p.as_u8() == value)
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Registration => "Registration",
            Phase::Voting => "Voting",
            Phase::Revealing => "Revealing",
            Phase::Ended => "Ended",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Ended
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s) || p.as_u8().to_string() == s)
            .ok_or_else(|| format!("unknown phase '{}'", s))
    }
}

/// How a deployment casts votes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElectionMode {
    /// Hidden vote option hash at cast time, opened by a second proof.
    /// Phases are advanced by the administrator.
    CommitReveal,
    /// One proof per voter with the option in the clear. Voting closes on its
    /// own once the deadline passes.
    OpenBallot { voting_duration_secs: u64 },
}

impl ElectionMode {
    pub fn name(&self) -> &'static str {
        match self {
            ElectionMode::CommitReveal => "commit-reveal",
            ElectionMode::OpenBallot { .. } => "open-ballot",
        }
    }
}

impl Default for ElectionMode {
    fn default() -> Self {
        ElectionMode::CommitReveal
    }
}

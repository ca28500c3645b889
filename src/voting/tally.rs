// Per-option vote counters
use std::collections::BTreeMap;

use crate::primitives::{Result, VotingError};
use crate::zkp::VoteOption;

/// Counts for options 1..=options_count, all starting at zero.
/// Counters only ever increase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyLedger {
    counts: BTreeMap<VoteOption, u64>,
}

impl TallyLedger {
    pub fn new(options_count: u32) -> Self {
        Self {
            counts: (1..=options_count).map(|option| (option, 0)).collect(),
        }
    }

    pub fn options_count(&self) -> u32 {
        self.counts.len() as u32
    }

    pub fn is_valid_option(&self, option: VoteOption) -> bool {
        self.counts.contains_key(&option)
    }

    /// Add one vote for `option`, returning the new count
    pub fn record(&mut self, option: VoteOption) -> Result<u64> {
        let options_count = self.options_count();
        let count = self.counts.get_mut(&option).ok_or(VotingError::InvalidOption {
            option: option.to_string(),
            options_count,
        })?;
        *count += 1;
        Ok(*count)
    }

    pub fn count(&self, option: VoteOption) -> Option<u64> {
        self.counts.get(&option).copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn results(&self) -> BTreeMap<VoteOption, u64> {
        self.counts.clone()
    }
}

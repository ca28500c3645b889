// Election state machine
// Owns the registered, consumed and revealed sets, the tally and the phase.
// Every operation validates all of its preconditions before the first write,
// so a failed call leaves the election untouched.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ElectionConfig;
use crate::primitives::{FieldElement, Principal, Result, Timestamp, VotingError};
use crate::zkp::{
    CircuitId, Commitment, ContractProof, Nullifier, OpenBallotPublicInputs, ProofVerifier, RevealPublicInputs,
    VoteOption, VoteOptionHash, VotePublicInputs,
};
use super::ballot::{Ballot, HiddenBallot, OpenBallot, RevealBallot};
use super::clock::Clock;
use super::events::{AuditRecord, ElectionEvent};
use super::phase::{ElectionMode, Phase};
use super::tally::TallyLedger;

/// One election instance
pub struct Election {
    admin: Principal,
    options_count: u32,
    mode: ElectionMode,

    // Admin-driven phase, commit-reveal only
    phase: Phase,
    // Deadline and publication flag, open ballot only
    voting_end_time: Option<Timestamp>,
    results_revealed: bool,

    registered: HashSet<Commitment>,
    used_nullifiers: HashSet<Nullifier>,
    vote_option_hashes: HashMap<Nullifier, VoteOptionHash>,
    revealed: HashSet<Nullifier>,
    tally: TallyLedger,

    events: Vec<AuditRecord>,
    verifier: Arc<dyn ProofVerifier>,
    clock: Arc<dyn Clock>,
}

impl Election {
    pub fn new(
        admin: Principal,
        options_count: u32,
        mode: ElectionMode,
        verifier: Arc<dyn ProofVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if options_count == 0 {
            return Err(VotingError::Configuration("options_count must be at least 1".to_string()));
        }

        let (phase, voting_end_time) = match mode {
            ElectionMode::CommitReveal => (Phase::Registration, None),
            ElectionMode::OpenBallot { voting_duration_secs } => {
                let end = clock.now().checked_add(voting_duration_secs).ok_or_else(|| {
                    VotingError::Configuration("voting duration overflows the clock".to_string())
                })?;
                (Phase::Voting, Some(end))
            }
        };

        info!(
            "🗳️  New {} election: {} options, admin {}",
            mode.name(),
            options_count,
            admin
        );

        Ok(Self {
            admin,
            options_count,
            mode,
            phase,
            voting_end_time,
            results_revealed: false,
            registered: HashSet::new(),
            used_nullifiers: HashSet::new(),
            vote_option_hashes: HashMap::new(),
            revealed: HashSet::new(),
            tally: TallyLedger::new(options_count),
            events: Vec::new(),
            verifier,
            clock,
        })
    }

    pub fn from_config(config: &ElectionConfig, verifier: Arc<dyn ProofVerifier>, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Self::new(config.admin.clone(), config.options_count, config.mode, verifier, clock)
    }

    // ----- read entry points -----

    pub fn admin(&self) -> &Principal {
        &self.admin
    }

    pub fn options_count(&self) -> u32 {
        self.options_count
    }

    pub fn mode(&self) -> ElectionMode {
        self.mode
    }

    /// Current phase. Open ballot elections report Voting until the deadline
    /// and Ended from then on, evaluated against the clock on every call.
    pub fn phase(&self) -> Phase {
        match self.voting_end_time {
            Some(end) if self.clock.now() >= end => Phase::Ended,
            Some(_) => Phase::Voting,
            None => self.phase,
        }
    }

    pub fn is_registered(&self, commitment: &Commitment) -> bool {
        self.registered.contains(commitment)
    }

    pub fn is_nullifier_used(&self, nullifier: &Nullifier) -> bool {
        self.used_nullifiers.contains(nullifier)
    }

    pub fn is_revealed(&self, nullifier: &Nullifier) -> bool {
        self.revealed.contains(nullifier)
    }

    pub fn stored_vote_option_hash(&self, nullifier: &Nullifier) -> Option<&VoteOptionHash> {
        self.vote_option_hashes.get(nullifier)
    }

    pub fn voting_end_time(&self) -> Option<Timestamp> {
        self.voting_end_time
    }

    pub fn results_revealed(&self) -> bool {
        self.results_revealed
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn votes_cast(&self) -> usize {
        self.used_nullifiers.len()
    }

    pub fn events(&self) -> &[AuditRecord] {
        &self.events
    }

    /// Final per-option counts.
    /// Commit-reveal elections expose them once Ended; open ballot elections
    /// once the administrator has revealed them after the deadline.
    pub fn get_results(&self) -> Result<BTreeMap<VoteOption, u64>> {
        match self.mode {
            ElectionMode::CommitReveal => {
                self.require_phase("get_results", Phase::Ended)?;
            }
            ElectionMode::OpenBallot { .. } => {
                self.require_phase("get_results", Phase::Ended)?;
                if !self.results_revealed {
                    return Err(VotingError::ResultsNotRevealed);
                }
            }
        }
        Ok(self.tally.results())
    }

    // ----- administration -----

    pub fn register_voter(&mut self, caller: &Principal, commitment: Commitment) -> Result<()> {
        self.require_admin(caller)?;
        self.require_registration_open()?;

        if self.registered.insert(commitment) {
            self.emit(ElectionEvent::VoterRegistered { commitment });
        } else {
            debug!("Commitment {} already registered", commitment);
        }
        Ok(())
    }

    /// Register many commitments in one call, returning how many were new
    pub fn batch_register_voters(&mut self, caller: &Principal, commitments: &[Commitment]) -> Result<usize> {
        self.require_admin(caller)?;
        self.require_registration_open()?;

        let mut added = 0;
        for commitment in commitments {
            if self.registered.insert(*commitment) {
                self.emit(ElectionEvent::VoterRegistered { commitment: *commitment });
                added += 1;
            }
        }
        info!("📋 Registered {} new voters ({} submitted)", added, commitments.len());
        Ok(added)
    }

    /// Move to a later phase. Skipping phases is allowed, going back or
    /// staying put is not.
    pub fn change_state(&mut self, caller: &Principal, new_phase: Phase) -> Result<()> {
        self.require_admin(caller)?;
        self.require_commit_reveal("change_state")?;

        let current = self.phase;
        if new_phase <= current {
            warn!("Rejected phase change {} -> {}", current, new_phase);
            return Err(VotingError::InvalidTransition {
                from: current,
                to: new_phase,
            });
        }

        self.phase = new_phase;
        self.emit(ElectionEvent::PhaseChanged {
            from: current,
            to: new_phase,
        });
        Ok(())
    }

    /// Push the open ballot deadline back by `additional_secs`
    pub fn extend_voting(&mut self, caller: &Principal, additional_secs: u64) -> Result<Timestamp> {
        self.require_admin(caller)?;
        self.require_open_ballot("extend_voting")?;
        self.require_phase("extend_voting", Phase::Voting)?;

        let end = self
            .voting_end_time
            .ok_or_else(|| VotingError::Configuration("open ballot election without a deadline".to_string()))?;
        let new_end = end
            .checked_add(additional_secs)
            .ok_or_else(|| VotingError::Configuration("voting extension overflows the clock".to_string()))?;

        self.voting_end_time = Some(new_end);
        self.emit(ElectionEvent::VotingExtended { voting_end_time: new_end });
        Ok(new_end)
    }

    /// Publish the open ballot tally once voting has closed
    pub fn reveal_results(&mut self, caller: &Principal) -> Result<()> {
        self.require_admin(caller)?;
        self.require_open_ballot("reveal_results")?;
        self.require_phase("reveal_results", Phase::Ended)?;

        if !self.results_revealed {
            self.results_revealed = true;
            self.emit(ElectionEvent::ResultsRevealed);
        }
        Ok(())
    }

    // ----- voting -----

    /// Cast either ballot variant; the variant must match the election mode
    pub fn cast_vote(&mut self, ballot: &Ballot) -> Result<()> {
        match ballot {
            Ballot::Hidden(hidden) => self.cast_hidden_vote(hidden),
            Ballot::Open(open) => self.cast_open_vote(open),
        }
    }

    pub fn cast_hidden_vote(&mut self, ballot: &HiddenBallot) -> Result<()> {
        self.require_commit_reveal("cast_hidden_vote")?;
        self.require_phase("cast_vote", Phase::Voting)?;
        self.require_registered(&ballot.commitment)?;
        self.require_fresh_nullifier(&ballot.nullifier)?;

        let public = VotePublicInputs {
            commitment: ballot.commitment,
            nullifier: ballot.nullifier,
            vote_option_hash: ballot.vote_option_hash,
        };
        self.verify(CircuitId::Vote, &public.to_signals(), &ballot.proof)?;

        self.used_nullifiers.insert(ballot.nullifier);
        self.vote_option_hashes.insert(ballot.nullifier, ballot.vote_option_hash);
        self.emit(ElectionEvent::VoteCast {
            nullifier: ballot.nullifier,
            vote_option_hash: ballot.vote_option_hash,
        });
        Ok(())
    }

    pub fn cast_open_vote(&mut self, ballot: &OpenBallot) -> Result<()> {
        self.require_open_ballot("cast_open_vote")?;
        self.require_phase("cast_vote", Phase::Voting)?;
        self.require_registered(&ballot.commitment)?;
        self.require_valid_option(ballot.option)?;
        self.require_fresh_nullifier(&ballot.nullifier)?;

        let public = OpenBallotPublicInputs {
            commitment: ballot.commitment,
            option: ballot.option,
            nullifier: ballot.nullifier,
        };
        self.verify(CircuitId::OpenBallot, &public.to_signals(), &ballot.proof)?;

        // the only fallible write, and it goes first
        self.tally.record(ballot.option)?;
        self.used_nullifiers.insert(ballot.nullifier);
        self.revealed.insert(ballot.nullifier);
        self.emit(ElectionEvent::OpenVoteCast {
            nullifier: ballot.nullifier,
            option: ballot.option,
        });
        Ok(())
    }

    pub fn reveal_vote_with_proof(&mut self, ballot: &RevealBallot) -> Result<()> {
        self.require_commit_reveal("reveal_vote_with_proof")?;
        self.require_phase("reveal_vote_with_proof", Phase::Revealing)?;

        let stored_hash = *self
            .vote_option_hashes
            .get(&ballot.nullifier)
            .ok_or_else(|| VotingError::UnknownNullifier(ballot.nullifier.to_string()))?;
        self.require_valid_option(ballot.option)?;

        let public = RevealPublicInputs {
            nullifier: ballot.nullifier,
            vote_option_hash: stored_hash,
            option: ballot.option,
        };
        self.verify(CircuitId::Reveal, &public.to_signals(), &ballot.proof)?;

        if self.revealed.contains(&ballot.nullifier) {
            return Err(VotingError::AlreadyRevealed(ballot.nullifier.to_string()));
        }

        self.tally.record(ballot.option)?;
        self.revealed.insert(ballot.nullifier);
        self.emit(ElectionEvent::VoteRevealed {
            nullifier: ballot.nullifier,
            option: ballot.option,
        });
        Ok(())
    }

    // ----- preconditions -----

    fn require_admin(&self, caller: &Principal) -> Result<()> {
        if caller != &self.admin {
            return Err(VotingError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    fn require_commit_reveal(&self, operation: &'static str) -> Result<()> {
        match self.mode {
            ElectionMode::CommitReveal => Ok(()),
            _ => Err(self.unsupported(operation)),
        }
    }

    fn require_open_ballot(&self, operation: &'static str) -> Result<()> {
        match self.mode {
            ElectionMode::OpenBallot { .. } => Ok(()),
            _ => Err(self.unsupported(operation)),
        }
    }

    fn unsupported(&self, operation: &'static str) -> VotingError {
        VotingError::UnsupportedOperation {
            operation,
            mode: self.mode.name(),
        }
    }

    fn require_phase(&self, operation: &'static str, required: Phase) -> Result<()> {
        let current = self.phase();
        if current != required {
            return Err(VotingError::PhaseError {
                operation,
                required: required.name(),
                current,
            });
        }
        Ok(())
    }

    // Commit-reveal registers during Registration, open ballot until the deadline
    fn require_registration_open(&self) -> Result<()> {
        match self.mode {
            ElectionMode::CommitReveal => self.require_phase("register_voter", Phase::Registration),
            ElectionMode::OpenBallot { .. } => self.require_phase("register_voter", Phase::Voting),
        }
    }

    fn require_registered(&self, commitment: &Commitment) -> Result<()> {
        if !self.registered.contains(commitment) {
            return Err(VotingError::VoterNotRegistered(commitment.to_string()));
        }
        Ok(())
    }

    fn require_fresh_nullifier(&self, nullifier: &Nullifier) -> Result<()> {
        if self.used_nullifiers.contains(nullifier) {
            return Err(VotingError::NullifierAlreadyUsed(nullifier.to_string()));
        }
        Ok(())
    }

    fn require_valid_option(&self, option: VoteOption) -> Result<()> {
        if !self.tally.is_valid_option(option) {
            return Err(VotingError::InvalidOption {
                option: option.to_string(),
                options_count: self.options_count,
            });
        }
        Ok(())
    }

    fn verify(&self, circuit: CircuitId, signals: &[FieldElement], proof: &ContractProof) -> Result<()> {
        // a proof that cannot be decoded is a failed proof as far as the election is concerned
        let valid = match self.verifier.verify(circuit, signals, proof) {
            Ok(valid) => valid,
            Err(VotingError::InvalidProofEncoding(reason)) => {
                debug!("Undecodable {} proof: {}", circuit, reason);
                false
            }
            Err(e) => return Err(e),
        };
        if !valid {
            warn!("❌ {} proof rejected", circuit);
            return Err(VotingError::ProofVerificationFailed(circuit.to_string()));
        }
        Ok(())
    }

    fn emit(&mut self, event: ElectionEvent) {
        let record = AuditRecord {
            sequence: self.events.len() as u64,
            at: self.clock.now(),
            event,
        };
        match &record.event {
            ElectionEvent::VoterRegistered { commitment } => debug!("Voter registered: {}", commitment),
            ElectionEvent::PhaseChanged { from, to } => info!("🔄 Phase changed: {} -> {}", from, to),
            ElectionEvent::VoteCast { nullifier, .. } => info!("🗳️  Vote cast, nullifier {}", nullifier),
            ElectionEvent::OpenVoteCast { nullifier, option } => {
                info!("🗳️  Vote cast for option {}, nullifier {}", option, nullifier)
            }
            ElectionEvent::VoteRevealed { option, .. } => info!("🔓 Vote revealed for option {}", option),
            ElectionEvent::VotingExtended { voting_end_time } => {
                info!("⏰ Voting extended until {}", voting_end_time)
            }
            ElectionEvent::ResultsRevealed => info!("📊 Results revealed"),
        }
        self.events.push(record);
    }
}

impl std::fmt::Debug for Election {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Election")
            .field("admin", &self.admin)
            .field("options_count", &self.options_count)
            .field("mode", &self.mode)
            .field("phase", &self.phase())
            .field("registered", &self.registered.len())
            .field("votes_cast", &self.used_nullifiers.len())
            .field("revealed", &self.revealed.len())
            .finish_non_exhaustive()
    }
}

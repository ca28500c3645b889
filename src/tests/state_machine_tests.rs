// Commit-reveal election behaviour against the scripted proof system
use std::collections::BTreeMap;
use std::sync::Arc;

use super::support::*;
use crate::primitives::{FieldElement, VotingError};
use crate::voting::{ElectionEvent, Phase, RevealBallot};
use crate::zkp::ProofVerifier;

#[test]
fn test_concrete_scenario() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(3, system.clone());
    let (secret, salt) = voter(1);

    let c1 = bridge.scheme().derive_commitment(&secret).unwrap();
    election.register_voter(&admin(), c1).unwrap();
    election.change_state(&admin(), Phase::Voting).unwrap();

    let ballot = bridge.prove_vote(&secret, 2, &salt).unwrap();
    election.cast_hidden_vote(&ballot).unwrap();
    assert!(election.is_nullifier_used(&ballot.nullifier));
    assert_eq!(election.stored_vote_option_hash(&ballot.nullifier), Some(&ballot.vote_option_hash));

    assert!(matches!(
        election.cast_hidden_vote(&ballot),
        Err(VotingError::NullifierAlreadyUsed(_))
    ));

    election.change_state(&admin(), Phase::Revealing).unwrap();
    let reveal = bridge.prove_reveal(&secret, 2, &salt).unwrap();
    election.reveal_vote_with_proof(&reveal).unwrap();
    assert!(election.is_revealed(&reveal.nullifier));

    assert!(matches!(
        election.reveal_vote_with_proof(&reveal),
        Err(VotingError::AlreadyRevealed(_))
    ));

    election.change_state(&admin(), Phase::Ended).unwrap();
    let results = election.get_results().unwrap();
    assert_eq!(results, BTreeMap::from([(1, 0), (2, 1), (3, 0)]));

    println!("✅ Register, cast, replay, reveal, replay scenario holds");
}

#[test]
fn test_failed_double_vote_leaves_state_unchanged() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    let (secret, salt) = voter(1);

    election
        .register_voter(&admin(), bridge.scheme().derive_commitment(&secret).unwrap())
        .unwrap();
    election.change_state(&admin(), Phase::Voting).unwrap();
    let ballot = bridge.prove_vote(&secret, 1, &salt).unwrap();
    election.cast_hidden_vote(&ballot).unwrap();

    let events_before = election.events().len();
    let votes_before = election.votes_cast();

    // same secret, different choice: same nullifier
    let second = bridge.prove_vote(&secret, 2, &FieldElement::from_u64(5)).unwrap();
    assert_eq!(second.nullifier, ballot.nullifier);
    assert!(matches!(
        election.cast_hidden_vote(&second),
        Err(VotingError::NullifierAlreadyUsed(_))
    ));

    assert_eq!(election.events().len(), events_before);
    assert_eq!(election.votes_cast(), votes_before);
    assert_eq!(election.stored_vote_option_hash(&ballot.nullifier), Some(&ballot.vote_option_hash));
}

#[test]
fn test_unregistered_commitment_rejected_before_proof() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    election.change_state(&admin(), Phase::Voting).unwrap();

    let (secret, salt) = voter(7);
    let ballot = bridge.prove_vote(&secret, 1, &salt).unwrap();
    assert!(matches!(
        election.cast_hidden_vote(&ballot),
        Err(VotingError::VoterNotRegistered(_))
    ));
    assert_eq!(system.verify_calls(), 0);
    assert!(!election.is_nullifier_used(&ballot.nullifier));
}

#[test]
fn test_invalid_proof_rejected_atomically() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    let (secret, salt) = voter(1);
    let (other_secret, _) = voter(2);

    election
        .register_voter(&admin(), bridge.scheme().derive_commitment(&secret).unwrap())
        .unwrap();
    election.change_state(&admin(), Phase::Voting).unwrap();

    // proof made for another voter's signals
    let mut ballot = bridge.prove_vote(&secret, 1, &salt).unwrap();
    ballot.proof = bridge.prove_vote(&other_secret, 1, &salt).unwrap().proof;

    assert!(matches!(
        election.cast_hidden_vote(&ballot),
        Err(VotingError::ProofVerificationFailed(circuit)) if circuit == "vote"
    ));
    assert!(!election.is_nullifier_used(&ballot.nullifier));
    assert_eq!(election.votes_cast(), 0);
}

#[test]
fn test_reveal_range_checked_before_verification() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(3, system.clone());
    let (secret, salt) = voter(1);

    election
        .register_voter(&admin(), bridge.scheme().derive_commitment(&secret).unwrap())
        .unwrap();
    election.change_state(&admin(), Phase::Voting).unwrap();
    let ballot = bridge.prove_vote(&secret, 2, &salt).unwrap();
    election.cast_hidden_vote(&ballot).unwrap();
    election.change_state(&admin(), Phase::Revealing).unwrap();

    let calls_before = system.verify_calls();
    let valid = bridge.prove_reveal(&secret, 2, &salt).unwrap();
    for option in [0, 4, u32::MAX] {
        let reveal = RevealBallot { option, ..valid.clone() };
        assert!(matches!(
            election.reveal_vote_with_proof(&reveal),
            Err(VotingError::InvalidOption { options_count: 3, .. })
        ));
    }
    assert_eq!(system.verify_calls(), calls_before);
    assert!(!election.is_revealed(&valid.nullifier));
}

#[test]
fn test_reveal_binds_to_cast_option() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(3, system.clone());
    let (secret, salt) = voter(1);

    election
        .register_voter(&admin(), bridge.scheme().derive_commitment(&secret).unwrap())
        .unwrap();
    election.change_state(&admin(), Phase::Voting).unwrap();
    election
        .cast_hidden_vote(&bridge.prove_vote(&secret, 1, &salt).unwrap())
        .unwrap();
    election.change_state(&admin(), Phase::Revealing).unwrap();

    // a proof for option 3 opens a different option hash than the stored one
    let lie = bridge.prove_reveal(&secret, 3, &salt).unwrap();
    assert!(matches!(
        election.reveal_vote_with_proof(&lie),
        Err(VotingError::ProofVerificationFailed(_))
    ));

    // relabelling an honest proof fails too
    let honest = bridge.prove_reveal(&secret, 1, &salt).unwrap();
    let relabelled = RevealBallot { option: 2, ..honest.clone() };
    assert!(matches!(
        election.reveal_vote_with_proof(&relabelled),
        Err(VotingError::ProofVerificationFailed(_))
    ));

    election.reveal_vote_with_proof(&honest).unwrap();
    election.change_state(&admin(), Phase::Ended).unwrap();
    assert_eq!(election.get_results().unwrap()[&1], 1);
}

#[test]
fn test_unknown_nullifier_on_reveal() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    election.change_state(&admin(), Phase::Revealing).unwrap();

    let (secret, salt) = voter(3);
    let reveal = bridge.prove_reveal(&secret, 1, &salt).unwrap();
    assert!(matches!(
        election.reveal_vote_with_proof(&reveal),
        Err(VotingError::UnknownNullifier(_))
    ));
}

#[test]
fn test_phase_gates() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    let (secret, salt) = voter(1);
    let commitment = bridge.scheme().derive_commitment(&secret).unwrap();
    election.register_voter(&admin(), commitment).unwrap();

    let ballot = bridge.prove_vote(&secret, 1, &salt).unwrap();
    let err = election.cast_hidden_vote(&ballot).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Phase error: cast_vote requires Voting, election is in Registration"
    );

    election.change_state(&admin(), Phase::Voting).unwrap();
    assert!(matches!(
        election.register_voter(&admin(), FieldElement::from_u64(9)),
        Err(VotingError::PhaseError { current: Phase::Voting, .. })
    ));

    let reveal = bridge.prove_reveal(&secret, 1, &salt).unwrap();
    assert!(matches!(
        election.reveal_vote_with_proof(&reveal),
        Err(VotingError::PhaseError { required: "Revealing", .. })
    ));
    assert!(matches!(
        election.get_results(),
        Err(VotingError::PhaseError { required: "Ended", .. })
    ));
}

#[test]
fn test_admin_only_operations() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    let commitment = bridge.scheme().derive_commitment(&voter(1).0).unwrap();

    assert!(matches!(
        election.register_voter(&mallory(), commitment),
        Err(VotingError::Unauthorized(p)) if p == mallory()
    ));
    assert!(matches!(
        election.batch_register_voters(&mallory(), &[commitment]),
        Err(VotingError::Unauthorized(_))
    ));
    assert!(matches!(
        election.change_state(&mallory(), Phase::Voting),
        Err(VotingError::Unauthorized(_))
    ));
    assert_eq!(election.phase(), Phase::Registration);
    assert!(!election.is_registered(&commitment));
}

#[test]
fn test_registration_is_idempotent() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    let c1 = bridge.scheme().derive_commitment(&voter(1).0).unwrap();
    let c2 = bridge.scheme().derive_commitment(&voter(2).0).unwrap();

    election.register_voter(&admin(), c1).unwrap();
    election.register_voter(&admin(), c1).unwrap();
    assert_eq!(election.batch_register_voters(&admin(), &[c1, c2, c2]).unwrap(), 1);
    assert_eq!(election.registered_count(), 2);

    let registrations = election
        .events()
        .iter()
        .filter(|r| matches!(r.event, ElectionEvent::VoterRegistered { .. }))
        .count();
    assert_eq!(registrations, 2);
}

#[test]
fn test_transitions_are_strictly_forward() {
    let (_, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());

    assert!(matches!(
        election.change_state(&admin(), Phase::Registration),
        Err(VotingError::InvalidTransition { from: Phase::Registration, to: Phase::Registration })
    ));

    // skipping ahead is allowed
    election.change_state(&admin(), Phase::Revealing).unwrap();
    assert!(matches!(
        election.change_state(&admin(), Phase::Voting),
        Err(VotingError::InvalidTransition { .. })
    ));
    assert_eq!(election.phase(), Phase::Revealing);

    election.change_state(&admin(), Phase::Ended).unwrap();
    for phase in Phase::ALL {
        assert!(election.change_state(&admin(), phase).is_err());
    }
    assert_eq!(election.phase(), Phase::Ended);
}

#[test]
fn test_tally_matches_reveals() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(3, system.clone());
    let choices = [1u32, 3, 3, 2, 3, 1];

    let voters: Vec<_> = (0..choices.len() as u64).map(voter).collect();
    let commitments: Vec<_> = voters
        .iter()
        .map(|(secret, _)| bridge.scheme().derive_commitment(secret).unwrap())
        .collect();
    election.batch_register_voters(&admin(), &commitments).unwrap();

    election.change_state(&admin(), Phase::Voting).unwrap();
    for ((secret, salt), option) in voters.iter().zip(choices) {
        election
            .cast_hidden_vote(&bridge.prove_vote(secret, option, salt).unwrap())
            .unwrap();
    }

    election.change_state(&admin(), Phase::Revealing).unwrap();
    for ((secret, salt), option) in voters.iter().zip(choices) {
        election
            .reveal_vote_with_proof(&bridge.prove_reveal(secret, option, salt).unwrap())
            .unwrap();
    }

    election.change_state(&admin(), Phase::Ended).unwrap();
    let results = election.get_results().unwrap();
    assert_eq!(results, BTreeMap::from([(1, 2), (2, 1), (3, 3)]));
    assert_eq!(results.values().sum::<u64>(), choices.len() as u64);
}

#[test]
fn test_unrevealed_votes_are_not_counted() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    let voters: Vec<_> = (0..2).map(voter).collect();
    for (secret, _) in &voters {
        election
            .register_voter(&admin(), bridge.scheme().derive_commitment(secret).unwrap())
            .unwrap();
    }

    election.change_state(&admin(), Phase::Voting).unwrap();
    for (secret, salt) in &voters {
        election
            .cast_hidden_vote(&bridge.prove_vote(secret, 2, salt).unwrap())
            .unwrap();
    }
    election.change_state(&admin(), Phase::Revealing).unwrap();
    let (secret, salt) = &voters[0];
    election
        .reveal_vote_with_proof(&bridge.prove_reveal(secret, 2, salt).unwrap())
        .unwrap();
    election.change_state(&admin(), Phase::Ended).unwrap();

    assert_eq!(election.get_results().unwrap(), BTreeMap::from([(1, 0), (2, 1)]));
}

#[test]
fn test_audit_trail_sequence() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    let (secret, salt) = voter(1);

    election
        .register_voter(&admin(), bridge.scheme().derive_commitment(&secret).unwrap())
        .unwrap();
    election.change_state(&admin(), Phase::Voting).unwrap();
    let ballot = bridge.prove_vote(&secret, 1, &salt).unwrap();
    election.cast_hidden_vote(&ballot).unwrap();

    let events = election.events();
    assert_eq!(events.len(), 3);
    assert!(events.iter().enumerate().all(|(i, r)| r.sequence == i as u64));
    assert_eq!(
        events[1].event,
        ElectionEvent::PhaseChanged { from: Phase::Registration, to: Phase::Voting }
    );
    assert_eq!(
        events[2].event,
        ElectionEvent::VoteCast {
            nullifier: ballot.nullifier,
            vote_option_hash: ballot.vote_option_hash,
        }
    );
    assert_eq!(events[2].at, START_TIME);
}

#[test]
fn test_zero_options_rejected_at_construction() {
    let (_, system) = mock_setup();
    let verifier: Arc<dyn ProofVerifier> = system;
    let result = crate::voting::Election::new(
        admin(),
        0,
        crate::voting::ElectionMode::CommitReveal,
        verifier,
        Arc::new(crate::voting::SystemClock),
    );
    assert!(matches!(result, Err(VotingError::Configuration(_))));
}

#[test]
fn test_open_ballot_rejected_in_commit_reveal_mode() {
    let (bridge, system) = mock_setup();
    let mut election = commit_reveal_election(2, system.clone());
    election.change_state(&admin(), Phase::Voting).unwrap();

    let (secret, _) = voter(1);
    let ballot = bridge.prove_open(&secret, 1).unwrap();
    assert!(matches!(
        election.cast_vote(&ballot.into()),
        Err(VotingError::UnsupportedOperation { operation: "cast_open_vote", mode: "commit-reveal" })
    ));
    assert!(matches!(
        election.extend_voting(&admin(), 60),
        Err(VotingError::UnsupportedOperation { .. })
    ));
}

// Shared fixtures: a scripted proof system and cached Groth16 keys
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_snark::SNARK;
use rand::{rngs::StdRng, SeedableRng};

use crate::primitives::{FieldElement, Fingerprint, Principal, Result, VotingError};
use crate::voting::{Election, ElectionMode, ManualClock};
use crate::zkp::circuits::BallotCircuit;
use crate::zkp::{
    CircuitId, CircuitWitness, CommitmentScheme, ContractProof, Groth16Prover, Groth16Verifier, ProofBridge,
    ProofOracle, ProofVerifier, SnarkProof,
};

pub const START_TIME: u64 = 1_700_000_000;

pub fn admin() -> Principal {
    Principal::from("admin")
}

pub fn mallory() -> Principal {
    Principal::from("mallory")
}

/// Secret and salt for the n-th test voter
pub fn voter(n: u64) -> (FieldElement, FieldElement) {
    (FieldElement::from_u64(123456 + n), FieldElement::from_u64(789012 + n))
}

/// Proof system that checks the circuit relations natively and tags each
/// proof with a digest of (circuit, public signals). Verification recomputes
/// the digest, so a proof only verifies against the signals it was made for.
#[derive(Default)]
pub struct MockProofSystem {
    scheme: CommitmentScheme,
    verify_calls: AtomicUsize,
}

impl MockProofSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    fn tag(circuit: CircuitId, signals: &[FieldElement]) -> String {
        let mut data = circuit.as_str().as_bytes().to_vec();
        for signal in signals {
            data.extend_from_slice(&signal.to_be_bytes());
        }
        Fingerprint::from_data(&data).to_hex()
    }

    fn check_relation(&self, witness: &CircuitWitness) -> Result<bool> {
        let s = &self.scheme;
        Ok(match witness {
            CircuitWitness::Vote { private, public } => {
                s.derive_commitment(&private.secret)? == public.commitment
                    && s.derive_nullifier_default(&private.secret)? == public.nullifier
                    && s.derive_vote_option_hash(private.option, &private.salt)? == public.vote_option_hash
            }
            CircuitWitness::Reveal { private, public } => {
                s.derive_vote_option_hash(public.option, &private.salt)? == public.vote_option_hash
            }
            CircuitWitness::OpenBallot { private, public } => {
                s.derive_commitment(&private.secret)? == public.commitment
                    && s.derive_nullifier_default(&private.secret)? == public.nullifier
            }
        })
    }
}

impl ProofOracle for MockProofSystem {
    fn prove(&self, witness: &CircuitWitness) -> Result<(SnarkProof, Vec<FieldElement>)> {
        if !self.check_relation(witness)? {
            return Err(VotingError::ProofGenerationError(format!(
                "inputs do not satisfy the {} circuit",
                witness.circuit_id()
            )));
        }
        let signals = witness.public_signals();
        let tag = Self::tag(witness.circuit_id(), &signals);
        let proof = SnarkProof {
            pi_a: [tag, "0".to_string(), "1".to_string()],
            pi_b: [
                ["0".to_string(), "0".to_string()],
                ["0".to_string(), "0".to_string()],
                ["1".to_string(), "0".to_string()],
            ],
            pi_c: ["0".to_string(), "0".to_string(), "1".to_string()],
            protocol: "groth16".to_string(),
            curve: "bn128".to_string(),
        };
        Ok((proof, signals))
    }
}

impl ProofVerifier for MockProofSystem {
    fn verify(&self, circuit: CircuitId, public_signals: &[FieldElement], proof: &ContractProof) -> Result<bool> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(proof.a[0] == Self::tag(circuit, public_signals))
    }
}

/// Bridge and verifier sharing one mock proof system
pub fn mock_setup() -> (ProofBridge, Arc<MockProofSystem>) {
    let system = Arc::new(MockProofSystem::new());
    let bridge = ProofBridge::new(CommitmentScheme::poseidon(), system.clone(), system.clone());
    (bridge, system)
}

pub fn commit_reveal_election(options_count: u32, verifier: Arc<dyn ProofVerifier>) -> Election {
    Election::new(
        admin(),
        options_count,
        ElectionMode::CommitReveal,
        verifier,
        Arc::new(ManualClock::new(START_TIME)),
    )
    .unwrap()
}

pub fn open_ballot_election(
    options_count: u32,
    duration: u64,
    verifier: Arc<dyn ProofVerifier>,
) -> (Election, ManualClock) {
    let clock = ManualClock::new(START_TIME);
    let election = Election::new(
        admin(),
        options_count,
        ElectionMode::OpenBallot { voting_duration_secs: duration },
        verifier,
        Arc::new(clock.clone()),
    )
    .unwrap();
    (election, clock)
}

type KeyPairs = HashMap<CircuitId, (ProvingKey<Bn254>, VerifyingKey<Bn254>)>;

/// Groth16 keys for every circuit, generated once per test run
pub fn groth16_keys() -> &'static KeyPairs {
    static KEYS: OnceLock<KeyPairs> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(7);
        CircuitId::ALL
            .into_iter()
            .map(|id| {
                let keys = Groth16::<Bn254>::circuit_specific_setup(BallotCircuit::empty(id), &mut rng).unwrap();
                (id, keys)
            })
            .collect()
    })
}

pub fn groth16_setup() -> (ProofBridge, Arc<Groth16Verifier>) {
    let mut prover = Groth16Prover::new();
    let mut verifier = Groth16Verifier::new();
    for (id, (pk, vk)) in groth16_keys() {
        prover.insert_key(*id, pk.clone());
        verifier.insert_key(*id, vk);
    }
    let verifier = Arc::new(verifier);
    let bridge = ProofBridge::new(CommitmentScheme::poseidon(), Arc::new(prover), verifier.clone());
    (bridge, verifier)
}

// Client-side bridge between protocol values and the proof oracle
use std::sync::Arc;

use tracing::{debug, info};

use crate::primitives::{FieldElement, Result, VotingError};
use crate::voting::{HiddenBallot, OpenBallot, RevealBallot};
use super::commitment::{CommitmentScheme, Nullifier, VoteOption, VoteSalt, VoterSecret};
use super::encoding::{ContractProof, SnarkProof};
use super::inputs::{
    CircuitId, CircuitWitness, OpenBallotPrivateInputs, OpenBallotPublicInputs, RevealPrivateInputs,
    RevealPublicInputs, VotePrivateInputs, VotePublicInputs,
};
use super::oracle::{ProofOracle, ProofVerifier};

/// Proof plus the public signals it commits to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProof {
    pub circuit: CircuitId,
    pub proof: SnarkProof,
    pub public_signals: Vec<FieldElement>,
}

pub struct ProofBridge {
    scheme: CommitmentScheme,
    oracle: Arc<dyn ProofOracle>,
    verifier: Arc<dyn ProofVerifier>,
}

impl ProofBridge {
    pub fn new(scheme: CommitmentScheme, oracle: Arc<dyn ProofOracle>, verifier: Arc<dyn ProofVerifier>) -> Self {
        Self { scheme, oracle, verifier }
    }

    pub fn scheme(&self) -> &CommitmentScheme {
        &self.scheme
    }

    pub fn build_vote_input(&self, secret: &VoterSecret, option: VoteOption, salt: &VoteSalt) -> Result<CircuitWitness> {
        let public = VotePublicInputs {
            commitment: self.scheme.derive_commitment(secret)?,
            nullifier: self.scheme.derive_nullifier_default(secret)?,
            vote_option_hash: self.scheme.derive_vote_option_hash(option, salt)?,
        };
        Ok(CircuitWitness::Vote {
            private: VotePrivateInputs {
                secret: *secret,
                option,
                salt: *salt,
            },
            public,
        })
    }

    /// The nullifier is carried as a public input so a reveal proof is tied
    /// to the ballot it opens.
    pub fn build_reveal_input(&self, nullifier: &Nullifier, salt: &VoteSalt, option: VoteOption) -> Result<CircuitWitness> {
        let public = RevealPublicInputs {
            nullifier: *nullifier,
            vote_option_hash: self.scheme.derive_vote_option_hash(option, salt)?,
            option,
        };
        Ok(CircuitWitness::Reveal {
            private: RevealPrivateInputs { salt: *salt },
            public,
        })
    }

    pub fn build_open_ballot_input(&self, secret: &VoterSecret, option: VoteOption) -> Result<CircuitWitness> {
        let public = OpenBallotPublicInputs {
            commitment: self.scheme.derive_commitment(secret)?,
            option,
            nullifier: self.scheme.derive_nullifier_default(secret)?,
        };
        Ok(CircuitWitness::OpenBallot {
            private: OpenBallotPrivateInputs { secret: *secret },
            public,
        })
    }

    pub fn generate_proof(&self, witness: &CircuitWitness) -> Result<GeneratedProof> {
        let circuit = witness.circuit_id();
        info!("⚡ Generating {} proof", circuit);

        let (proof, public_signals) = self.oracle.prove(witness)?;
        if public_signals != witness.public_signals() {
            return Err(VotingError::ProofGenerationError(format!(
                "oracle returned public signals out of {} circuit order",
                circuit
            )));
        }

        Ok(GeneratedProof {
            circuit,
            proof,
            public_signals,
        })
    }

    /// The one off-chain to on-chain conversion
    pub fn encode_for_verifier(&self, proof: &SnarkProof) -> ContractProof {
        ContractProof::from(proof)
    }

    /// Fail-fast check before submitting to an election
    pub fn verify_offline(&self, generated: &GeneratedProof) -> Result<bool> {
        let valid = self.verifier.verify(
            generated.circuit,
            &generated.public_signals,
            &self.encode_for_verifier(&generated.proof),
        )?;
        debug!("Offline {} verification: {}", generated.circuit, valid);
        Ok(valid)
    }

    // ----- ballot construction -----

    pub fn prove_vote(&self, secret: &VoterSecret, option: VoteOption, salt: &VoteSalt) -> Result<HiddenBallot> {
        let witness = self.build_vote_input(secret, option, salt)?;
        let generated = self.generate_proof(&witness)?;
        let public = VotePublicInputs::from_signals(&generated.public_signals)?;

        Ok(HiddenBallot {
            proof: self.encode_for_verifier(&generated.proof),
            commitment: public.commitment,
            nullifier: public.nullifier,
            vote_option_hash: public.vote_option_hash,
        })
    }

    pub fn prove_reveal(&self, secret: &VoterSecret, option: VoteOption, salt: &VoteSalt) -> Result<RevealBallot> {
        let nullifier = self.scheme.derive_nullifier_default(secret)?;
        let witness = self.build_reveal_input(&nullifier, salt, option)?;
        let generated = self.generate_proof(&witness)?;

        Ok(RevealBallot {
            proof: self.encode_for_verifier(&generated.proof),
            nullifier,
            option,
        })
    }

    pub fn prove_open(&self, secret: &VoterSecret, option: VoteOption) -> Result<OpenBallot> {
        let witness = self.build_open_ballot_input(secret, option)?;
        let generated = self.generate_proof(&witness)?;
        let public = OpenBallotPublicInputs::from_signals(&generated.public_signals)?;

        Ok(OpenBallot {
            proof: self.encode_for_verifier(&generated.proof),
            commitment: public.commitment,
            option: public.option,
            nullifier: public.nullifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoOracle;

    impl ProofOracle for NoOracle {
        fn prove(&self, witness: &CircuitWitness) -> Result<(SnarkProof, Vec<FieldElement>)> {
            Err(VotingError::ProofGenerationError(format!("no artifacts for {}", witness.circuit_id())))
        }
    }

    impl ProofVerifier for NoOracle {
        fn verify(&self, _: CircuitId, _: &[FieldElement], _: &ContractProof) -> Result<bool> {
            Ok(false)
        }
    }

    fn bridge() -> ProofBridge {
        ProofBridge::new(CommitmentScheme::poseidon(), Arc::new(NoOracle), Arc::new(NoOracle))
    }

    #[test]
    fn test_vote_input_layout() {
        let bridge = bridge();
        let secret = FieldElement::from_u64(123456);
        let salt = FieldElement::from_u64(789012);
        let witness = bridge.build_vote_input(&secret, 1, &salt).unwrap();

        let scheme = bridge.scheme();
        assert_eq!(
            witness.public_signals(),
            vec![
                scheme.derive_commitment(&secret).unwrap(),
                scheme.derive_nullifier_default(&secret).unwrap(),
                scheme.derive_vote_option_hash(1, &salt).unwrap(),
            ]
        );
        assert_eq!(witness.circuit_id(), CircuitId::Vote);
    }

    #[test]
    fn test_reveal_input_matches_vote_input() {
        let bridge = bridge();
        let secret = FieldElement::from_u64(5);
        let salt = FieldElement::from_u64(6);

        let vote = bridge.build_vote_input(&secret, 2, &salt).unwrap();
        let CircuitWitness::Vote { public: vote_public, .. } = vote else {
            panic!("expected vote witness");
        };
        let reveal = bridge.build_reveal_input(&vote_public.nullifier, &salt, 2).unwrap();
        let CircuitWitness::Reveal { public, .. } = reveal else {
            panic!("expected reveal witness");
        };

        assert_eq!(public.vote_option_hash, vote_public.vote_option_hash);
        assert_eq!(public.option, 2);
    }

    #[test]
    fn test_oracle_failure_surfaces_as_generation_error() {
        let bridge = bridge();
        let result = bridge.prove_open(&FieldElement::from_u64(1), 1);
        assert!(matches!(result, Err(VotingError::ProofGenerationError(_))));
    }
}

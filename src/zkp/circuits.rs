// R1CS circuits for the ballot protocol
// Instance variables are allocated before any witness, in the order given by
// CircuitId::public_signal_names, so public signal vectors line up with them.
use ark_bn254::Fr;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use ark_r1cs_std::{
    alloc::AllocVar,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};

use super::commitment::NULLIFIER_DOMAIN_TAG;
use super::inputs::{CircuitId, CircuitWitness};
use super::poseidon::poseidon_gadget;

fn alloc_input(cs: &ConstraintSystemRef<Fr>, value: Option<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    FpVar::new_input(cs.clone(), || value.ok_or(SynthesisError::AssignmentMissing))
}

fn alloc_witness(cs: &ConstraintSystemRef<Fr>, value: Option<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    FpVar::new_witness(cs.clone(), || value.ok_or(SynthesisError::AssignmentMissing))
}

/// Vote circuit
/// Proves that one secret opens the registered commitment and derives the
/// submitted nullifier, and that the vote option hash binds (option, salt).
#[derive(Clone, Debug, Default)]
pub struct VoteCircuit {
    // Private inputs (witness)
    pub secret: Option<Fr>,
    pub option: Option<Fr>,
    pub salt: Option<Fr>,

    // Public inputs
    pub commitment: Option<Fr>,
    pub nullifier: Option<Fr>,
    pub vote_option_hash: Option<Fr>,
}

impl VoteCircuit {
    pub fn new(secret: Fr, option: Fr, salt: Fr, commitment: Fr, nullifier: Fr, vote_option_hash: Fr) -> Self {
        Self {
            secret: Some(secret),
            option: Some(option),
            salt: Some(salt),
            commitment: Some(commitment),
            nullifier: Some(nullifier),
            vote_option_hash: Some(vote_option_hash),
        }
    }

    /// Shape-only instance for key generation
    pub fn empty() -> Self {
        Self::default()
    }
}

impl ConstraintSynthesizer<Fr> for VoteCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let commitment = alloc_input(&cs, self.commitment)?;
        let nullifier = alloc_input(&cs, self.nullifier)?;
        let vote_option_hash = alloc_input(&cs, self.vote_option_hash)?;

        let secret = alloc_witness(&cs, self.secret)?;
        let option = alloc_witness(&cs, self.option)?;
        let salt = alloc_witness(&cs, self.salt)?;

        let computed_commitment = poseidon_gadget(&[secret.clone()])?;
        computed_commitment.enforce_equal(&commitment)?;

        let domain_tag = FpVar::constant(Fr::from(NULLIFIER_DOMAIN_TAG));
        let computed_nullifier = poseidon_gadget(&[secret, domain_tag])?;
        computed_nullifier.enforce_equal(&nullifier)?;

        let computed_option_hash = poseidon_gadget(&[option, salt])?;
        computed_option_hash.enforce_equal(&vote_option_hash)?;

        Ok(())
    }
}

/// Reveal circuit
/// Proves knowledge of the salt that opens the stored vote option hash to the
/// public option. The nullifier is a public input so the proof is bound to
/// one ballot.
#[derive(Clone, Debug, Default)]
pub struct RevealCircuit {
    pub salt: Option<Fr>,

    pub nullifier: Option<Fr>,
    pub vote_option_hash: Option<Fr>,
    pub option: Option<Fr>,
}

impl RevealCircuit {
    pub fn new(salt: Fr, nullifier: Fr, vote_option_hash: Fr, option: Fr) -> Self {
        Self {
            salt: Some(salt),
            nullifier: Some(nullifier),
            vote_option_hash: Some(vote_option_hash),
            option: Some(option),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl ConstraintSynthesizer<Fr> for RevealCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let nullifier = alloc_input(&cs, self.nullifier)?;
        let vote_option_hash = alloc_input(&cs, self.vote_option_hash)?;
        let option = alloc_input(&cs, self.option)?;

        let salt = alloc_witness(&cs, self.salt)?;

        let computed_option_hash = poseidon_gadget(&[option, salt])?;
        computed_option_hash.enforce_equal(&vote_option_hash)?;

        // The nullifier takes no part in the hash, square it so it appears in
        // a constraint.
        let _nullifier_squared = &nullifier * &nullifier;

        Ok(())
    }
}

/// Open ballot circuit
/// Single-phase cast: the option is public, the secret opens the commitment
/// and derives the nullifier.
#[derive(Clone, Debug, Default)]
pub struct OpenBallotCircuit {
    pub secret: Option<Fr>,

    pub commitment: Option<Fr>,
    pub option: Option<Fr>,
    pub nullifier: Option<Fr>,
}

impl OpenBallotCircuit {
    pub fn new(secret: Fr, commitment: Fr, option: Fr, nullifier: Fr) -> Self {
        Self {
            secret: Some(secret),
            commitment: Some(commitment),
            option: Some(option),
            nullifier: Some(nullifier),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl ConstraintSynthesizer<Fr> for OpenBallotCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let commitment = alloc_input(&cs, self.commitment)?;
        let option = alloc_input(&cs, self.option)?;
        let nullifier = alloc_input(&cs, self.nullifier)?;

        let secret = alloc_witness(&cs, self.secret)?;

        let computed_commitment = poseidon_gadget(&[secret.clone()])?;
        computed_commitment.enforce_equal(&commitment)?;

        let domain_tag = FpVar::constant(Fr::from(NULLIFIER_DOMAIN_TAG));
        let computed_nullifier = poseidon_gadget(&[secret, domain_tag])?;
        computed_nullifier.enforce_equal(&nullifier)?;

        // same treatment as the nullifier in RevealCircuit
        let _option_squared = &option * &option;

        Ok(())
    }
}

/// Type-erased circuit built from a complete witness
pub enum BallotCircuit {
    Vote(VoteCircuit),
    Reveal(RevealCircuit),
    OpenBallot(OpenBallotCircuit),
}

impl BallotCircuit {
    /// Shape-only instance of `circuit` for key generation
    pub fn empty(circuit: CircuitId) -> Self {
        match circuit {
            CircuitId::Vote => BallotCircuit::Vote(VoteCircuit::empty()),
            CircuitId::Reveal => BallotCircuit::Reveal(RevealCircuit::empty()),
            CircuitId::OpenBallot => BallotCircuit::OpenBallot(OpenBallotCircuit::empty()),
        }
    }
}

impl From<&CircuitWitness> for BallotCircuit {
    fn from(witness: &CircuitWitness) -> Self {
        match witness {
            CircuitWitness::Vote { private, public } => BallotCircuit::Vote(VoteCircuit::new(
                private.secret.into_fr(),
                Fr::from(private.option),
                private.salt.into_fr(),
                public.commitment.into_fr(),
                public.nullifier.into_fr(),
                public.vote_option_hash.into_fr(),
            )),
            CircuitWitness::Reveal { private, public } => BallotCircuit::Reveal(RevealCircuit::new(
                private.salt.into_fr(),
                public.nullifier.into_fr(),
                public.vote_option_hash.into_fr(),
                Fr::from(public.option),
            )),
            CircuitWitness::OpenBallot { private, public } => {
                BallotCircuit::OpenBallot(OpenBallotCircuit::new(
                    private.secret.into_fr(),
                    public.commitment.into_fr(),
                    Fr::from(public.option),
                    public.nullifier.into_fr(),
                ))
            }
        }
    }
}

impl ConstraintSynthesizer<Fr> for BallotCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        match self {
            BallotCircuit::Vote(circuit) => circuit.generate_constraints(cs),
            BallotCircuit::Reveal(circuit) => circuit.generate_constraints(cs),
            BallotCircuit::OpenBallot(circuit) => circuit.generate_constraints(cs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::FieldElement;
    use crate::zkp::commitment::CommitmentScheme;
    use ark_relations::r1cs::ConstraintSystem;

    struct Fixture {
        secret: FieldElement,
        salt: FieldElement,
        option: u32,
        commitment: FieldElement,
        nullifier: FieldElement,
        vote_option_hash: FieldElement,
    }

    fn fixture() -> Fixture {
        let scheme = CommitmentScheme::poseidon();
        let secret = FieldElement::from_u64(123456);
        let salt = FieldElement::from_u64(789012);
        let option = 1;
        Fixture {
            secret,
            salt,
            option,
            commitment: scheme.derive_commitment(&secret).unwrap(),
            nullifier: scheme.derive_nullifier_default(&secret).unwrap(),
            vote_option_hash: scheme.derive_vote_option_hash(option, &salt).unwrap(),
        }
    }

    fn is_satisfied<C: ConstraintSynthesizer<Fr>>(circuit: C) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_vote_circuit_satisfied() {
        let f = fixture();
        let circuit = VoteCircuit::new(
            f.secret.into_fr(),
            Fr::from(f.option),
            f.salt.into_fr(),
            f.commitment.into_fr(),
            f.nullifier.into_fr(),
            f.vote_option_hash.into_fr(),
        );
        assert!(is_satisfied(circuit));
    }

    #[test]
    fn test_vote_circuit_rejects_foreign_commitment() {
        let f = fixture();
        let circuit = VoteCircuit::new(
            f.secret.into_fr(),
            Fr::from(f.option),
            f.salt.into_fr(),
            Fr::from(42u64),
            f.nullifier.into_fr(),
            f.vote_option_hash.into_fr(),
        );
        assert!(!is_satisfied(circuit));
    }

    #[test]
    fn test_reveal_circuit_binds_option() {
        let f = fixture();
        let honest = RevealCircuit::new(
            f.salt.into_fr(),
            f.nullifier.into_fr(),
            f.vote_option_hash.into_fr(),
            Fr::from(f.option),
        );
        assert!(is_satisfied(honest));

        let lying = RevealCircuit::new(
            f.salt.into_fr(),
            f.nullifier.into_fr(),
            f.vote_option_hash.into_fr(),
            Fr::from(2u64),
        );
        assert!(!is_satisfied(lying));
    }

    #[test]
    fn test_open_ballot_circuit_satisfied() {
        let f = fixture();
        let circuit = OpenBallotCircuit::new(
            f.secret.into_fr(),
            f.commitment.into_fr(),
            Fr::from(3u64),
            f.nullifier.into_fr(),
        );
        assert!(is_satisfied(circuit));
    }

    #[test]
    fn test_instance_layout_matches_signal_names() {
        for id in CircuitId::ALL {
            let circuit = BallotCircuit::empty(id);
            let cs = ConstraintSystem::<Fr>::new_ref();
            cs.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
            circuit.generate_constraints(cs.clone()).unwrap();
            // instance variable 0 is the constant one
            assert_eq!(cs.num_instance_variables(), id.num_public_signals() + 1);
        }
    }
}

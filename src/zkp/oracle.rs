// Proof oracle seams and the Groth16 backend behind them
use std::collections::HashMap;
use std::sync::Mutex;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_snark::SNARK;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::primitives::{FieldElement, Result, VotingError};
use super::circuits::BallotCircuit;
use super::encoding::{ContractProof, SnarkProof};
use super::inputs::{CircuitId, CircuitWitness};
use super::trusted_setup::CircuitKeyStore;

/// Client-side proving capability
pub trait ProofOracle: Send + Sync {
    /// Produces a proof plus the public signals it was generated against,
    /// in the circuit's public signal order.
    fn prove(&self, witness: &CircuitWitness) -> Result<(SnarkProof, Vec<FieldElement>)>;
}

/// Verification capability consumed by the election state machine.
/// `Ok(false)` means a well-formed proof that does not verify; malformed
/// encodings are errors.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, circuit: CircuitId, public_signals: &[FieldElement], proof: &ContractProof) -> Result<bool>;
}

/// Groth16 prover over BN254 holding one proving key per circuit
pub struct Groth16Prover {
    proving_keys: HashMap<CircuitId, ProvingKey<Bn254>>,
    rng: Mutex<StdRng>,
}

impl Groth16Prover {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            proving_keys: HashMap::new(),
            rng: Mutex::new(rng),
        }
    }

    pub fn insert_key(&mut self, circuit: CircuitId, key: ProvingKey<Bn254>) {
        self.proving_keys.insert(circuit, key);
    }

    pub fn has_key(&self, circuit: CircuitId) -> bool {
        self.proving_keys.contains_key(&circuit)
    }

    /// Load proving keys for `circuits` from a key store
    pub async fn from_key_store(store: &CircuitKeyStore, circuits: &[CircuitId]) -> Result<Self> {
        let mut prover = Self::new();
        for circuit in circuits {
            prover.insert_key(*circuit, store.load_proving_key(*circuit).await?);
        }
        Ok(prover)
    }

    fn proving_key(&self, circuit: CircuitId) -> Result<&ProvingKey<Bn254>> {
        self.proving_keys
            .get(&circuit)
            .ok_or_else(|| VotingError::Configuration(format!("no proving key loaded for {} circuit", circuit)))
    }

    // Groth16 proving only debug-asserts satisfiability, so check it first
    fn check_satisfied(witness: &CircuitWitness) -> Result<()> {
        let cs = ConstraintSystem::<Fr>::new_ref();
        BallotCircuit::from(witness)
            .generate_constraints(cs.clone())
            .map_err(|e| VotingError::ProofGenerationError(format!("constraint synthesis failed: {}", e)))?;

        let satisfied = cs
            .is_satisfied()
            .map_err(|e| VotingError::ProofGenerationError(e.to_string()))?;
        if !satisfied {
            let failing = cs.which_is_unsatisfied().ok().flatten().unwrap_or_default();
            return Err(VotingError::ProofGenerationError(format!(
                "inputs do not satisfy the {} circuit ({})",
                witness.circuit_id(),
                failing
            )));
        }
        Ok(())
    }
}

impl Default for Groth16Prover {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofOracle for Groth16Prover {
    fn prove(&self, witness: &CircuitWitness) -> Result<(SnarkProof, Vec<FieldElement>)> {
        let circuit_id = witness.circuit_id();
        let proving_key = self.proving_key(circuit_id)?;

        Self::check_satisfied(witness)?;

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| VotingError::ProofGenerationError("prover rng poisoned".to_string()))?;

        let proof = Groth16::<Bn254>::prove(proving_key, BallotCircuit::from(witness), &mut *rng)
            .map_err(|e| VotingError::ProofGenerationError(e.to_string()))?;

        debug!("Generated {} proof", circuit_id);
        Ok((SnarkProof::from(&proof), witness.public_signals()))
    }
}

/// Groth16 verifier holding prepared verifying keys per circuit
#[derive(Default)]
pub struct Groth16Verifier {
    verifying_keys: HashMap<CircuitId, PreparedVerifyingKey<Bn254>>,
}

impl Groth16Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key(&mut self, circuit: CircuitId, key: &VerifyingKey<Bn254>) {
        self.verifying_keys.insert(circuit, prepare_verifying_key(key));
    }

    pub async fn from_key_store(store: &CircuitKeyStore, circuits: &[CircuitId]) -> Result<Self> {
        let mut verifier = Self::new();
        for circuit in circuits {
            let key = store.load_verifying_key(*circuit).await?;
            verifier.insert_key(*circuit, &key);
        }
        info!("🔑 Verifier ready for {} circuits", verifier.verifying_keys.len());
        Ok(verifier)
    }

    /// Verify a proof in the off-chain snarkjs layout
    pub fn verify_snark(&self, circuit: CircuitId, public_signals: &[FieldElement], proof: &SnarkProof) -> Result<bool> {
        let proof = Proof::<Bn254>::try_from(proof)?;
        self.verify_ark(circuit, public_signals, &proof)
    }

    fn verify_ark(&self, circuit: CircuitId, public_signals: &[FieldElement], proof: &Proof<Bn254>) -> Result<bool> {
        let key = self
            .verifying_keys
            .get(&circuit)
            .ok_or_else(|| VotingError::Configuration(format!("no verifying key loaded for {} circuit", circuit)))?;

        if public_signals.len() != circuit.num_public_signals() {
            return Err(VotingError::InvalidProofEncoding(format!(
                "{} circuit expects {} public signals, got {}",
                circuit,
                circuit.num_public_signals(),
                public_signals.len()
            )));
        }

        let inputs: Vec<Fr> = public_signals.iter().map(|s| s.into_fr()).collect();
        let valid = Groth16::<Bn254>::verify_with_processed_vk(key, &inputs, proof)
            .map_err(|e| VotingError::InvalidProofEncoding(e.to_string()))?;

        debug!("{} proof verification result: {}", circuit, valid);
        Ok(valid)
    }
}

impl ProofVerifier for Groth16Verifier {
    fn verify(&self, circuit: CircuitId, public_signals: &[FieldElement], proof: &ContractProof) -> Result<bool> {
        let proof = Proof::<Bn254>::try_from(proof)?;
        self.verify_ark(circuit, public_signals, &proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::inputs::{RevealPrivateInputs, RevealPublicInputs};

    fn bogus_reveal() -> CircuitWitness {
        CircuitWitness::Reveal {
            private: RevealPrivateInputs { salt: FieldElement::from_u64(1) },
            public: RevealPublicInputs {
                nullifier: FieldElement::from_u64(2),
                vote_option_hash: FieldElement::from_u64(3),
                option: 1,
            },
        }
    }

    #[test]
    fn test_missing_proving_key_is_configuration_error() {
        let prover = Groth16Prover::new();
        assert!(matches!(prover.prove(&bogus_reveal()), Err(VotingError::Configuration(_))));
    }

    #[test]
    fn test_unsatisfied_witness_rejected_before_proving() {
        assert!(matches!(
            Groth16Prover::check_satisfied(&bogus_reveal()),
            Err(VotingError::ProofGenerationError(_))
        ));
    }

    #[test]
    fn test_missing_verifying_key_is_configuration_error() {
        let verifier = Groth16Verifier::new();
        let proof = ContractProof {
            a: ["1".to_string(), "2".to_string()],
            b: [["0".to_string(), "0".to_string()], ["0".to_string(), "0".to_string()]],
            c: ["1".to_string(), "2".to_string()],
        };
        assert!(matches!(
            verifier.verify(CircuitId::Vote, &[], &proof),
            Err(VotingError::InvalidProofEncoding(_)) | Err(VotingError::Configuration(_))
        ));
    }
}

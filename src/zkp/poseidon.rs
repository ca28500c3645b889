// Poseidon hash over the BN254 scalar field
// Native hashing uses circomlib-compatible parameters so commitments agree
// bit-for-bit with circomlibjs; the R1CS gadget replays the same permutation
// from the same parameter tables so circuits and off-chain values match.

use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;
use light_poseidon::{
    parameters::bn254_x5::get_poseidon_parameters, Poseidon, PoseidonHasher as _,
    PoseidonParameters,
};

use crate::primitives::{FieldElement, Result, VotingError};

/// One-way hash capability H: FieldElement* -> FieldElement
pub trait FieldHasher: Send + Sync {
    fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement>;
}

/// circomlib Poseidon (x^5 S-box, width = inputs + 1, capacity tag 0)
#[derive(Debug, Default, Clone, Copy)]
pub struct CircomPoseidon;

impl FieldHasher for CircomPoseidon {
    fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement> {
        if inputs.is_empty() {
            return Err(VotingError::Hash("Poseidon needs at least one input".to_string()));
        }
        let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())?;
        let values: Vec<Fr> = inputs.iter().map(|v| v.into_fr()).collect();
        let digest = hasher.hash(&values)?;
        Ok(FieldElement::from_fr(digest))
    }
}

/// Parameter table for `nr_inputs` inputs
pub fn parameters(nr_inputs: usize) -> Result<PoseidonParameters<Fr>> {
    let width = u8::try_from(nr_inputs + 1)
        .map_err(|_| VotingError::Hash(format!("unsupported Poseidon arity {}", nr_inputs)))?;
    Ok(get_poseidon_parameters::<Fr>(width)?)
}

/// In-circuit Poseidon. Returns the first state element after the permutation.
pub fn poseidon_gadget(inputs: &[FpVar<Fr>]) -> std::result::Result<FpVar<Fr>, SynthesisError> {
    let params = parameters(inputs.len()).map_err(|_| SynthesisError::Unsatisfiable)?;
    let width = params.width;

    let mut state: Vec<FpVar<Fr>> = Vec::with_capacity(width);
    state.push(FpVar::zero());
    state.extend(inputs.iter().cloned());

    let half_full = params.full_rounds / 2;
    let total_rounds = params.full_rounds + params.partial_rounds;

    for round in 0..total_rounds {
        for (i, element) in state.iter_mut().enumerate() {
            *element += params.ark[round * width + i];
        }

        let full_round = round < half_full || round >= half_full + params.partial_rounds;
        if full_round {
            for element in state.iter_mut() {
                *element = sbox(element)?;
            }
        } else {
            state[0] = sbox(&state[0])?;
        }

        state = (0..width)
            .map(|i| {
                state
                    .iter()
                    .enumerate()
                    .fold(FpVar::zero(), |acc, (j, element)| acc + element * params.mds[i][j])
            })
            .collect();
    }

    Ok(state[0].clone())
}

// x^5
fn sbox(x: &FpVar<Fr>) -> std::result::Result<FpVar<Fr>, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    Ok(x4 * x)
}

// Groth16 proof encodings
//
// SnarkProof is the off-chain JSON layout produced by snarkjs: projective
// coordinates as decimal strings, G2 coordinates ordered [c0, c1].
// ContractProof is the calldata layout for the EVM pairing precompile: affine
// coordinates, G2 coordinates ordered [c1, c0]. The swap lives only in the
// From impls between the two.
use ark_bn254::{Bn254, Fq, Fq2, G1Affine, G2Affine};
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::Proof;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::primitives::{Result, VotingError};

pub const SNARK_PROTOCOL: &str = "groth16";
pub const SNARK_CURVE: &str = "bn128";

/// snarkjs proof.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnarkProof {
    pub pi_a: [String; 3],
    pub pi_b: [[String; 2]; 3],
    pub pi_c: [String; 3],
    pub protocol: String,
    pub curve: String,
}

/// Verifier contract calldata (a, b, c)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractProof {
    pub a: [String; 2],
    pub b: [[String; 2]; 2],
    pub c: [String; 2],
}

impl From<&SnarkProof> for ContractProof {
    fn from(proof: &SnarkProof) -> Self {
        ContractProof {
            a: g1_to_affine_pair(&proof.pi_a),
            b: g2_to_swapped_pairs(&proof.pi_b),
            c: g1_to_affine_pair(&proof.pi_c),
        }
    }
}

impl From<&ContractProof> for SnarkProof {
    fn from(proof: &ContractProof) -> Self {
        SnarkProof {
            pi_a: g1_from_affine_pair(&proof.a),
            pi_b: g2_from_swapped_pairs(&proof.b),
            pi_c: g1_from_affine_pair(&proof.c),
            protocol: SNARK_PROTOCOL.to_string(),
            curve: SNARK_CURVE.to_string(),
        }
    }
}

// The precompile writes the point at infinity as all-zero coordinates,
// which is never a curve point on BN254.
fn is_zero_pair(pair: &[String; 2]) -> bool {
    pair.iter().all(|c| c == "0")
}

fn g1_to_affine_pair(coords: &[String; 3]) -> [String; 2] {
    if coords[2] == "0" {
        return ["0".to_string(), "0".to_string()];
    }
    [coords[0].clone(), coords[1].clone()]
}

fn g1_from_affine_pair(pair: &[String; 2]) -> [String; 3] {
    if is_zero_pair(pair) {
        return ["0".to_string(), "1".to_string(), "0".to_string()];
    }
    [pair[0].clone(), pair[1].clone(), "1".to_string()]
}

fn g2_to_swapped_pairs(coords: &[[String; 2]; 3]) -> [[String; 2]; 2] {
    let [x, y, z] = coords;
    if is_zero_pair(z) {
        return [
            ["0".to_string(), "0".to_string()],
            ["0".to_string(), "0".to_string()],
        ];
    }
    [[x[1].clone(), x[0].clone()], [y[1].clone(), y[0].clone()]]
}

fn g2_from_swapped_pairs(pairs: &[[String; 2]; 2]) -> [[String; 2]; 3] {
    let [x, y] = pairs;
    if is_zero_pair(x) && is_zero_pair(y) {
        return [
            ["0".to_string(), "0".to_string()],
            ["1".to_string(), "0".to_string()],
            ["0".to_string(), "0".to_string()],
        ];
    }
    [
        [x[1].clone(), x[0].clone()],
        [y[1].clone(), y[0].clone()],
        ["1".to_string(), "0".to_string()],
    ]
}

impl From<&Proof<Bn254>> for SnarkProof {
    fn from(proof: &Proof<Bn254>) -> Self {
        SnarkProof {
            pi_a: encode_g1(&proof.a),
            pi_b: encode_g2(&proof.b),
            pi_c: encode_g1(&proof.c),
            protocol: SNARK_PROTOCOL.to_string(),
            curve: SNARK_CURVE.to_string(),
        }
    }
}

impl TryFrom<&SnarkProof> for Proof<Bn254> {
    type Error = VotingError;

    fn try_from(proof: &SnarkProof) -> Result<Self> {
        if proof.protocol != SNARK_PROTOCOL || proof.curve != SNARK_CURVE {
            return Err(VotingError::InvalidProofEncoding(format!(
                "expected {}/{}, got {}/{}",
                SNARK_PROTOCOL, SNARK_CURVE, proof.protocol, proof.curve
            )));
        }

        Ok(Proof {
            a: decode_g1(&proof.pi_a, "pi_a")?,
            b: decode_g2(&proof.pi_b, "pi_b")?,
            c: decode_g1(&proof.pi_c, "pi_c")?,
        })
    }
}

impl TryFrom<&ContractProof> for Proof<Bn254> {
    type Error = VotingError;

    fn try_from(proof: &ContractProof) -> Result<Self> {
        Proof::try_from(&SnarkProof::from(proof))
    }
}

fn fq_to_decimal(value: &Fq) -> String {
    BigUint::from_bytes_be(&value.into_bigint().to_bytes_be()).to_string()
}

fn fq_from_decimal(value: &str, label: &str) -> Result<Fq> {
    let parsed: BigUint = value
        .parse()
        .map_err(|_| VotingError::InvalidProofEncoding(format!("{}: '{}' is not a decimal integer", label, value)))?;
    let modulus = BigUint::from_bytes_be(&Fq::MODULUS.to_bytes_be());
    if parsed >= modulus {
        return Err(VotingError::InvalidProofEncoding(format!(
            "{}: coordinate exceeds the base field modulus",
            label
        )));
    }
    Ok(Fq::from_be_bytes_mod_order(&parsed.to_bytes_be()))
}

// Identity is written as snarkjs does, with a zero projective z
fn encode_g1(point: &G1Affine) -> [String; 3] {
    if point.infinity {
        return ["0".to_string(), "1".to_string(), "0".to_string()];
    }
    [fq_to_decimal(&point.x), fq_to_decimal(&point.y), "1".to_string()]
}

fn encode_g2(point: &G2Affine) -> [[String; 2]; 3] {
    if point.infinity {
        return [
            ["0".to_string(), "0".to_string()],
            ["1".to_string(), "0".to_string()],
            ["0".to_string(), "0".to_string()],
        ];
    }
    [
        [fq_to_decimal(&point.x.c0), fq_to_decimal(&point.x.c1)],
        [fq_to_decimal(&point.y.c0), fq_to_decimal(&point.y.c1)],
        ["1".to_string(), "0".to_string()],
    ]
}

fn decode_g1(coords: &[String; 3], label: &str) -> Result<G1Affine> {
    match coords[2].as_str() {
        "0" => return Ok(G1Affine::identity()),
        "1" => {}
        z => {
            return Err(VotingError::InvalidProofEncoding(format!(
                "{}: unsupported projective z '{}'",
                label, z
            )))
        }
    }

    let point = G1Affine::new_unchecked(fq_from_decimal(&coords[0], label)?, fq_from_decimal(&coords[1], label)?);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(VotingError::InvalidProofEncoding(format!("{}: point is not on BN254 G1", label)));
    }
    Ok(point)
}

fn decode_g2(coords: &[[String; 2]; 3], label: &str) -> Result<G2Affine> {
    let z = [coords[2][0].as_str(), coords[2][1].as_str()];
    match z {
        ["0", "0"] => return Ok(G2Affine::identity()),
        ["1", "0"] => {}
        _ => {
            return Err(VotingError::InvalidProofEncoding(format!(
                "{}: unsupported projective z {:?}",
                label, z
            )))
        }
    }

    let x = Fq2::new(fq_from_decimal(&coords[0][0], label)?, fq_from_decimal(&coords[0][1], label)?);
    let y = Fq2::new(fq_from_decimal(&coords[1][0], label)?, fq_from_decimal(&coords[1][1], label)?);
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(VotingError::InvalidProofEncoding(format!("{}: point is not on BN254 G2", label)));
    }
    Ok(point)
}

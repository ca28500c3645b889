// BN254 scalar field elements, the native value type of every commitment,
// nullifier, option hash and public signal in the protocol
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use num_bigint::BigUint;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{Result, VotingError};

/// Order of the BN254 scalar field (P)
pub const FIELD_MODULUS: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// Integer in [0, P). Values are always stored reduced.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldElement(Fr);

impl FieldElement {
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    pub fn from_fr(value: Fr) -> Self {
        Self(value)
    }

    pub fn into_fr(self) -> Fr {
        self.0
    }

    /// The modulus as an unbounded integer
    pub fn modulus() -> BigUint {
        BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
    }

    /// Parse a decimal string and reduce it modulo P.
    pub fn from_decimal(value: &str) -> Result<Self> {
        let parsed = parse_decimal(value)?;
        Ok(Self::from_biguint_mod_order(&parsed))
    }

    /// Parse a decimal string that must already be a canonical field element.
    /// Public signals and on-chain values go through this path.
    pub fn from_canonical_decimal(value: &str) -> Result<Self> {
        let parsed = parse_decimal(value)?;
        if parsed >= Self::modulus() {
            return Err(VotingError::InvalidFieldElement(format!(
                "{} is not below the field modulus",
                value
            )));
        }
        Ok(Self::from_biguint_mod_order(&parsed))
    }

    pub fn from_biguint_mod_order(value: &BigUint) -> Self {
        Self(Fr::from_le_bytes_mod_order(&value.to_bytes_le()))
    }

    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        Self(Fr::from_be_bytes_mod_order(bytes))
    }

    /// 31 random bytes reduced modulo P
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 31];
        rng.fill_bytes(&mut bytes);
        Self::from_be_bytes_mod_order(&bytes)
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.0.into_bigint().to_bytes_le())
    }

    pub fn to_decimal(&self) -> String {
        self.to_biguint().to_str_radix(10)
    }

    /// Fixed-width big-endian encoding (32 bytes)
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let raw = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - raw.len()..].copy_from_slice(&raw);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }

    /// Small values such as vote options; `None` when the element does not fit in a u64
    pub fn to_u64(&self) -> Option<u64> {
        let digits = self.to_biguint().to_u64_digits();
        match digits.len() {
            0 => Some(0),
            1 => Some(digits[0]),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

fn parse_decimal(value: &str) -> Result<BigUint> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VotingError::InvalidFieldElement(format!(
            "'{}' is not a non-negative decimal integer",
            value
        )));
    }
    BigUint::parse_bytes(trimmed.as_bytes(), 10)
        .ok_or_else(|| VotingError::InvalidFieldElement(value.to_string()))
}

impl Default for FieldElement {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<u32> for FieldElement {
    fn from(value: u32) -> Self {
        Self::from_u64(value as u64)
    }
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl From<FieldElement> for Fr {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl std::ops::Add for FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::Mul for FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl std::fmt::Display for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl std::fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldElement({})", self.to_decimal())
    }
}

impl std::str::FromStr for FieldElement {
    type Err = VotingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_canonical_decimal(s)
    }
}

// Decimal strings on the wire, the way snarkjs and circomlibjs print field values
impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FieldElement::from_canonical_decimal(&raw).map_err(serde::de::Error::custom)
    }
}

// Zero-knowledge layer for anonymous ballots
// Poseidon commitments, the vote/reveal/open-ballot circuits, Groth16 proving
// and verification over BN254, and the key artifacts they depend on.

pub use commitment::*;
pub use encoding::*;
pub use inputs::*;
pub use oracle::*;
pub use proof_bridge::*;
pub use trusted_setup::*;

pub mod circuits;
pub mod commitment;
pub mod encoding;
pub mod inputs;
pub mod oracle;
pub mod poseidon;
pub mod proof_bridge;
pub mod trusted_setup;

pub use poseidon::{CircomPoseidon, FieldHasher};

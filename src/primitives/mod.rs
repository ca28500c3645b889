// Shared primitives: field math, identities and errors
pub mod primitives;
pub mod error;
pub mod field;

pub use primitives::*;
pub use error::*;
pub use field::*;

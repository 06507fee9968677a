//! X-Ops request authentication: key material, canonical hashing, timestamps, raw RSA
//! signing, and header assembly.

pub mod authorizer;
pub mod digest;
pub mod key;
pub mod sign;
pub mod timestamp;

pub use authorizer::*;
pub use digest::*;
pub use key::*;
pub use sign::*;
pub use timestamp::*;

//! Public extension contracts for attaching signed headers to arbitrary HTTP clients.
//!
//! The crate ships a reqwest adapter behind the `reqwest` feature; other clients implement
//! [`RequestSignerExt`] for their own request type.

pub mod request_signer;

pub use request_signer::*;

//! Chef server API client that signs every request with the X-Ops header protocol.
//!
//! Requests are hashed into a canonical string, signed with a raw RSA private-key transform,
//! and carried as numbered `X-Ops-Authorization-{i}` headers.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod ext;
#[cfg(feature = "reqwest")] pub mod http;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{FixedClock, PrivateKey},
		connection::ConnectionContext,
	};

	/// Timestamp pinned by [`test_context`].
	pub const TEST_TIMESTAMP: &str = "2024-01-02T15:04:05Z";
	/// 2048-bit PKCS#1 key shared by unit and integration tests.
	pub const TEST_KEY_PEM: &str = include_str!("../tests/fixtures/client.pem");
	/// Authorization lines OpenSSL produces for the canonical `GET organizations/test/nodes`
	/// request signed by [`TEST_KEY_PEM`] at [`TEST_TIMESTAMP`] as `tester`.
	pub const TEST_SIGNATURE: &str = include_str!("../tests/fixtures/client_signature.txt");
	/// Three-prime 1024-bit PKCS#1 key (`openssl genpkey -pkeyopt rsa_keygen_primes:3`).
	pub const TEST_MULTI_PRIME_PEM: &str = include_str!("../tests/fixtures/multi_prime.pem");
	/// OpenSSL `RSA_private_encrypt` of `multi-prime` under [`TEST_MULTI_PRIME_PEM`], base64.
	pub const TEST_MULTI_PRIME_SIGNATURE: &str =
		include_str!("../tests/fixtures/multi_prime_signature.txt");

	/// Parses [`TEST_KEY_PEM`].
	pub fn test_key() -> Arc<PrivateKey> {
		Arc::new(PrivateKey::from_pem(TEST_KEY_PEM).expect("Failed to parse the test key fixture."))
	}

	/// Builds a context for `tester` against `url` whose clock is pinned to
	/// [`TEST_TIMESTAMP`].
	pub fn test_context(url: &str) -> ConnectionContext {
		let clock =
			FixedClock::parse(TEST_TIMESTAMP).expect("Test timestamp fixture should parse.");

		ConnectionContext::connect_url(url, "12.0.0", "tester", TEST_KEY_PEM)
			.expect("Failed to build the test connection context.")
			.with_clock(Arc::new(clock))
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		str::FromStr,
		sync::Arc,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use rsa;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, serde_json as _, tokio as _};

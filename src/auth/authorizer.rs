//! Canonical request strings and the X-Ops header set derived from them.
//!
//! A request is signed by hashing its path and body, joining them with the method,
//! timestamp, and user id into a fixed five-line string, and running that string through
//! [`private_encrypt`]. The raw signature is kept as an ordered [`Signature`] and only
//! flattened into numbered `X-Ops-Authorization-{i}` headers when a [`HeaderSet`] is built.

// std
use std::slice::Iter;
// self
use crate::{
	_prelude::*,
	auth::{Clock, PrivateKey, block_encode, current_timestamp, hash_and_join, private_encrypt},
	error::SignError,
	obs::{self, Operation, OperationOutcome, OperationSpan},
};

/// `accept` header name.
pub const HEADER_ACCEPT: &str = "accept";
/// `x-chef-version` header name.
pub const HEADER_CHEF_VERSION: &str = "x-chef-version";
/// `x-ops-timestamp` header name.
pub const HEADER_TIMESTAMP: &str = "x-ops-timestamp";
/// `x-ops-userid` header name.
pub const HEADER_USER_ID: &str = "x-ops-userid";
/// `x-ops-sign` header name.
pub const HEADER_SIGN: &str = "x-ops-sign";
/// `x-ops-content-hash` header name.
pub const HEADER_CONTENT_HASH: &str = "x-ops-content-hash";
/// Prefix of the numbered authorization headers.
pub const HEADER_AUTHORIZATION_PREFIX: &str = "X-Ops-Authorization-";
/// Value of the `accept` header.
pub const ACCEPT_JSON: &str = "application/json";
/// Value of the `x-ops-sign` header.
pub const SIGN_VERSION: &str = "version=1.0";

/// Per-request values that feed the canonical string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SigningInput<'a> {
	/// HTTP method, verbatim.
	pub method: &'a str,
	/// Request path, hashed before signing.
	pub path: &'a str,
	/// Serialized request body, hashed before signing.
	pub body: &'a str,
	/// RFC 3339 timestamp shared with the `x-ops-timestamp` header.
	pub timestamp: &'a str,
}
impl<'a> SigningInput<'a> {
	/// Bundles the request values.
	pub fn new(method: &'a str, path: &'a str, body: &'a str, timestamp: &'a str) -> Self {
		Self { method, path, body, timestamp }
	}

	/// Block-encoded SHA-1 of the body.
	pub fn content_hash(&self) -> String {
		hash_and_join(self.body.as_bytes())
	}

	/// Builds the five-line string to sign for `user_id`; lines are `\n`-joined with no
	/// trailing newline.
	pub fn canonical_string(&self, user_id: &str) -> String {
		format!(
			"Method:{}\nHashed Path:{}\nX-Ops-Content-Hash:{}\nX-Ops-Timestamp:{}\nX-Ops-UserId:{}",
			self.method,
			hash_and_join(self.path.as_bytes()),
			self.content_hash(),
			self.timestamp,
			user_id,
		)
	}
}

/// Raw request signature as ordered 60-column base64 lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(Vec<String>);
impl Signature {
	/// Block-encodes a raw signature.
	pub fn from_raw(raw: &[u8]) -> Self {
		Self(block_encode(raw))
	}

	/// Lines in header order.
	pub fn lines(&self) -> &[String] {
		&self.0
	}

	/// Yields `(X-Ops-Authorization-{i}, line)` pairs, 1-indexed.
	pub fn headers(&self) -> impl Iterator<Item = (String, &str)> {
		self.0
			.iter()
			.enumerate()
			.map(|(idx, line)| (format!("{HEADER_AUTHORIZATION_PREFIX}{}", idx + 1), line.as_str()))
	}
}

/// Ordered header names and values to merge into an outbound request.
///
/// Lookups ignore ASCII case; insertion order is preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HeaderSet(Vec<(String, String)>);
impl HeaderSet {
	/// Appends a header, replacing any existing value with the same name.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();

		match self.0.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(&name)) {
			Some(entry) => entry.1 = value,
			None => self.0.push((name, value)),
		}
	}

	/// Returns the value stored under `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(existing, _)| existing.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Iterates `(name, value)` pairs in insertion order.
	pub fn iter(&self) -> Iter<'_, (String, String)> {
		self.0.iter()
	}

	/// Header names in insertion order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|(name, _)| name.as_str())
	}

	/// Number of headers.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the set is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Reassembles the numbered authorization headers, in index order, stopping at the first
	/// missing index.
	pub fn authorization_lines(&self) -> Vec<&str> {
		(1..)
			.map_while(|idx| self.get(&format!("{HEADER_AUTHORIZATION_PREFIX}{idx}")))
			.collect()
	}
}
impl<'a> IntoIterator for &'a HeaderSet {
	type IntoIter = Iter<'a, (String, String)>;
	type Item = &'a (String, String);

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
impl IntoIterator for HeaderSet {
	type IntoIter = std::vec::IntoIter<(String, String)>;
	type Item = (String, String);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Signs requests for one user with one key.
#[derive(Clone, Copy, Debug)]
pub struct RequestAuthorizer<'a> {
	key: &'a PrivateKey,
	user_id: &'a str,
	version: &'a str,
}
impl<'a> RequestAuthorizer<'a> {
	/// Creates an authorizer for `user_id`, advertising `version` in `x-chef-version`.
	pub fn new(key: &'a PrivateKey, user_id: &'a str, version: &'a str) -> Self {
		Self { key, user_id, version }
	}

	/// Signs the canonical string for `input`.
	pub fn sign(&self, input: &SigningInput) -> Result<Signature, SignError> {
		let canonical = input.canonical_string(self.user_id);
		let raw = private_encrypt(self.key, canonical.as_bytes())?;

		Ok(Signature::from_raw(&raw))
	}

	/// Builds the complete header set for `input`.
	pub fn headers(&self, input: &SigningInput) -> Result<HeaderSet, SignError> {
		const OPERATION: Operation = Operation::Sign;

		let _span = OperationSpan::new(OPERATION, "headers").entered();

		obs::record_outcome(OPERATION, OperationOutcome::Attempt);

		let result = self.sign(input).map(|signature| {
			let mut headers = HeaderSet::default();

			headers.insert(HEADER_ACCEPT, ACCEPT_JSON);
			headers.insert(HEADER_CHEF_VERSION, self.version);
			headers.insert(HEADER_TIMESTAMP, input.timestamp);
			headers.insert(HEADER_USER_ID, self.user_id);
			headers.insert(HEADER_SIGN, SIGN_VERSION);
			headers.insert(HEADER_CONTENT_HASH, input.content_hash());

			for (name, line) in signature.headers() {
				headers.insert(name, line);
			}

			headers
		});

		obs::record_outcome(OPERATION, OperationOutcome::of(&result));

		result
	}

	/// Stamps the request with `clock` and builds its header set.
	pub fn headers_now(
		&self,
		method: &str,
		path: &str,
		body: &str,
		clock: &dyn Clock,
	) -> Result<HeaderSet, SignError> {
		let timestamp = current_timestamp(clock)?;

		self.headers(&SigningInput::new(method, path, body, &timestamp))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, auth::FixedClock};

	const PATH: &str = "organizations/test/nodes";

	fn fixture_headers(input: &SigningInput) -> HeaderSet {
		let key = test_key();

		RequestAuthorizer::new(&key, "tester", "12.0.0")
			.headers(input)
			.expect("Fixture request should sign.")
	}

	#[test]
	fn canonical_string_has_five_fixed_lines() {
		let input = SigningInput::new("GET", PATH, "", TEST_TIMESTAMP);

		assert_eq!(
			input.canonical_string("tester"),
			"Method:GET\n\
			 Hashed Path:q88eshw+SnvElhyBrKVF7yyhrBA=\n\
			 X-Ops-Content-Hash:2jmj7l5rSw0yVb/vlWAYkK/YBwk=\n\
			 X-Ops-Timestamp:2024-01-02T15:04:05Z\n\
			 X-Ops-UserId:tester"
		);
	}

	#[test]
	fn end_to_end_header_set_matches_wire_contract() {
		let headers = fixture_headers(&SigningInput::new("GET", PATH, "", TEST_TIMESTAMP));
		let names = headers.names().collect::<Vec<_>>();

		assert_eq!(headers.get("x-ops-content-hash"), Some("2jmj7l5rSw0yVb/vlWAYkK/YBwk="));
		assert_eq!(headers.get("accept"), Some("application/json"));
		assert_eq!(headers.get("x-chef-version"), Some("12.0.0"));
		assert_eq!(headers.get("x-ops-timestamp"), Some(TEST_TIMESTAMP));
		assert_eq!(headers.get("x-ops-userid"), Some("tester"));
		assert_eq!(headers.get("x-ops-sign"), Some("version=1.0"));
		assert_eq!(&names[..6], &[
			"accept",
			"x-chef-version",
			"x-ops-timestamp",
			"x-ops-userid",
			"x-ops-sign",
			"x-ops-content-hash",
		]);
		assert_eq!(&names[6..], &[
			"X-Ops-Authorization-1",
			"X-Ops-Authorization-2",
			"X-Ops-Authorization-3",
			"X-Ops-Authorization-4",
			"X-Ops-Authorization-5",
			"X-Ops-Authorization-6",
		]);
		assert_eq!(headers.authorization_lines(), TEST_SIGNATURE.lines().collect::<Vec<_>>());
	}

	#[test]
	fn headers_are_deterministic() {
		let input = SigningInput::new("POST", PATH, "name=web01", TEST_TIMESTAMP);

		assert_eq!(fixture_headers(&input), fixture_headers(&input));
	}

	#[test]
	fn every_signed_field_changes_the_signature() {
		let key = test_key();
		let authorizer = RequestAuthorizer::new(&key, "tester", "12.0.0");
		let base = SigningInput::new("GET", PATH, "", TEST_TIMESTAMP);
		let baseline = authorizer.sign(&base).expect("Baseline should sign.");
		let variants = [
			SigningInput { method: "PUT", ..base },
			SigningInput { path: "organizations/test/roles", ..base },
			SigningInput { body: "{}", ..base },
			SigningInput { timestamp: "2024-01-02T15:04:06Z", ..base },
		];

		for variant in variants {
			assert_ne!(authorizer.sign(&variant).expect("Variant should sign."), baseline);
		}

		let other_user = RequestAuthorizer::new(&key, "someone-else", "12.0.0");

		assert_ne!(other_user.sign(&base).expect("Other user should sign."), baseline);
	}

	#[test]
	fn headers_now_reads_the_injected_clock() {
		let key = test_key();
		let clock = FixedClock::parse(TEST_TIMESTAMP).expect("Fixture should parse.");
		let headers = RequestAuthorizer::new(&key, "tester", "12.0.0")
			.headers_now("GET", PATH, "", &clock)
			.expect("Fixture request should sign.");

		assert_eq!(headers, fixture_headers(&SigningInput::new("GET", PATH, "", TEST_TIMESTAMP)));
	}

	#[test]
	fn oversized_canonical_strings_fail_without_headers() {
		let key = test_key();
		let long_user = "u".repeat(200);
		let result = RequestAuthorizer::new(&key, &long_user, "12.0.0")
			.headers(&SigningInput::new("GET", PATH, "", TEST_TIMESTAMP));

		assert!(matches!(result, Err(SignError::ContentTooLong { .. })));
	}

	#[test]
	fn header_set_lookups_ignore_case_and_replace() {
		let mut headers = HeaderSet::default();

		headers.insert("X-Ops-Sign", "old");
		headers.insert("x-ops-sign", SIGN_VERSION);

		assert_eq!(headers.len(), 1);
		assert_eq!(headers.get("X-OPS-SIGN"), Some(SIGN_VERSION));
		assert!(headers.authorization_lines().is_empty());
	}
}

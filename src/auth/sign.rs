//! Raw RSA "private encrypt" over PKCS#1 v1.5 type-1 padded blocks.
//!
//! The Chef server verifies X-Ops signatures with the matching raw public-decrypt
//! operation, so the content is padded and exponentiated directly rather than passed
//! through a digest-info signature scheme. Output is the minimal big-endian encoding of
//! the result; leading zero bytes are not preserved.
//!
//! The exponentiation is neither blinded nor constant-time, so timing may leak key bits to an
//! observer who can submit chosen content and measure signing latency.

// crates.io
use rsa::BigUint;
// self
use crate::{auth::PrivateKey, error::SignError};

/// Bytes of each block reserved for the `00 01 FF.. 00` framing.
pub const PADDING_OVERHEAD: usize = 11;

/// Signs `content` with the raw private-key transform of `key`.
///
/// Fails with [`SignError::ContentTooLong`] when `content` exceeds `k - 11` bytes.
pub fn private_encrypt(key: &PrivateKey, content: &[u8]) -> Result<Vec<u8>, SignError> {
	let k = key.size();
	let max = k.saturating_sub(PADDING_OVERHEAD);

	if k < PADDING_OVERHEAD || content.len() > max {
		return Err(SignError::ContentTooLong { len: content.len(), max });
	}

	let block = BigUint::from_bytes_be(&encode_block(k, content));

	Ok(raw_transform(key, &block)?.to_bytes_be())
}

/// Lays out `00 01 FF..FF 00 content` across exactly `k` bytes.
fn encode_block(k: usize, content: &[u8]) -> Vec<u8> {
	let split = k - content.len();
	let mut em = vec![0xFF; k];

	em[0] = 0x00;
	em[1] = 0x01;
	em[split - 1] = 0x00;
	em[split..].copy_from_slice(content);

	em
}

/// Computes `c^D mod N`, through the CRT when the key carries precomputed values.
pub(crate) fn raw_transform(key: &PrivateKey, c: &BigUint) -> Result<BigUint, SignError> {
	let n = key.modulus();

	if c >= n {
		return Err(SignError::RepresentativeOutOfRange);
	}

	let Some(crt) = key.crt() else {
		return Ok(c.modpow(key.private_exponent(), n));
	};
	let primes = key.primes();
	let (p, q) = (&primes[0], &primes[1]);
	let m1 = c.modpow(&crt.dp, p);
	let m2 = c.modpow(&crt.dq, q);
	let h = (&crt.qinv * &sub_mod(&m1, &m2, p)) % p;
	let mut m = &m2 + &(&h * q);

	for (prime, values) in primes[2..].iter().zip(&crt.extra) {
		let mi = c.modpow(&values.exp, prime);
		let h = (&values.coeff * &sub_mod(&mi, &m, prime)) % prime;

		m += &h * &values.r;
	}

	Ok(m)
}

// `(a - b) mod modulus` without leaving the unsigned domain.
fn sub_mod(a: &BigUint, b: &BigUint, modulus: &BigUint) -> BigUint {
	let a = a % modulus;
	let b = b % modulus;

	if a >= b { a - b } else { modulus - &b + &a }
}

//! SHA-1 content hashing and the 60-column base64 block encoding used by X-Ops headers.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use sha1::{Digest, Sha1};

/// Width of each base64 block line.
pub const BLOCK_WIDTH: usize = 60;

/// Base64-encodes `content` and splits the text into consecutive [`BLOCK_WIDTH`]-character
/// lines; the final line may be shorter.
pub fn block_encode(content: &[u8]) -> Vec<String> {
	let encoded = STANDARD.encode(content);

	(0..encoded.len())
		.step_by(BLOCK_WIDTH)
		.map(|start| encoded[start..(start + BLOCK_WIDTH).min(encoded.len())].to_owned())
		.collect()
}

/// Hashes `content` with SHA-1 and block-encodes the digest.
///
/// Always yields at least one line, including for empty input.
pub fn digest_blocks(content: &[u8]) -> Vec<String> {
	block_encode(&Sha1::digest(content))
}

/// [`digest_blocks`] joined with `\n`.
pub fn hash_and_join(content: &[u8]) -> String {
	digest_blocks(content).join("\n")
}

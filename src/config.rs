//! knife.rb / client.rb connection settings.
//!
//! Only the three settings needed to reach a server are recognized: `node_name`,
//! `client_key`, and `chef_server_url`. Each must sit on its own line as a bare
//! `key value` pair; any other line is ignored, so Ruby logic in the file is skipped rather
//! than evaluated.

// std
use std::fs;
// self
use crate::{_prelude::*, error::ConfigError};

/// Connection settings read from a knife-style configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnifeConfig {
	/// Client or user name sent as `x-ops-userid`.
	pub node_name: Option<String>,
	/// Path to the client's PEM private key.
	pub client_key: Option<PathBuf>,
	/// Base URL of the Chef server (optionally including an organization path).
	pub chef_server_url: Option<String>,
}
impl KnifeConfig {
	/// Reads and parses the file at `path`.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();

		if !path.is_file() {
			return Err(ConfigError::NotFound { path: path.to_path_buf() });
		}

		let contents = fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

		Ok(Self::parse(&contents))
	}

	/// Parses configuration text; later assignments override earlier ones.
	pub fn parse(contents: &str) -> Self {
		let mut config = Self::default();

		for line in contents.lines() {
			let mut tokens = line.split_whitespace();
			let (Some(key), Some(value), None) = (tokens.next(), tokens.next(), tokens.next())
			else {
				continue;
			};
			let value = filter_quotes(value);

			match key {
				"node_name" => config.node_name = Some(value.to_owned()),
				"client_key" => config.client_key = Some(PathBuf::from(value)),
				"chef_server_url" => config.chef_server_url = Some(value.to_owned()),
				_ => {},
			}
		}

		config
	}
}
impl FromStr for KnifeConfig {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::parse(s))
	}
}

// Drops one surrounding quote character from each end.
fn filter_quotes(value: &str) -> &str {
	let value = value.strip_prefix(['\'', '"']).unwrap_or(value);

	value.strip_suffix(['\'', '"']).unwrap_or(value)
}

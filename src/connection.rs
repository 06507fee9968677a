//! Resolved connection parameters shared by every request issued to one Chef server.

// self
use crate::{
	_prelude::*,
	auth::{Clock, HeaderSet, PrivateKey, RequestAuthorizer, SystemClock},
	config::KnifeConfig,
	error::ConfigError,
	obs::{self, Operation, OperationOutcome, OperationSpan},
};

/// Read-only connection state: server location, identity, key, and TLS policy.
///
/// Contexts are built once and may be shared across threads; signing only reads the key.
#[derive(Clone)]
pub struct ConnectionContext {
	/// Server host name.
	pub host: String,
	/// Server port, explicit or derived from the URL scheme.
	pub port: u16,
	/// Base URL that endpoints are appended to.
	pub url: Url,
	/// Value advertised in `x-chef-version`.
	pub version: String,
	/// Client or user name sent as `x-ops-userid`.
	pub user_id: String,
	/// Private key that signs every request.
	pub key: Arc<PrivateKey>,
	/// Skip TLS certificate verification when dispatching.
	pub tls_skip_verify: bool,
	/// Clock stamping `x-ops-timestamp`.
	pub clock: Arc<dyn Clock>,
}
impl ConnectionContext {
	/// Creates a context from an already-loaded key.
	pub fn new(
		url: Url,
		version: impl Into<String>,
		user_id: impl Into<String>,
		key: impl Into<Arc<PrivateKey>>,
	) -> Result<Self> {
		let (host, port) = endpoint(&url)?;

		Ok(Self {
			host,
			port,
			url,
			version: version.into(),
			user_id: user_id.into(),
			key: key.into(),
			tls_skip_verify: false,
			clock: Arc::new(SystemClock),
		})
	}

	/// Connects to `host:port`; port 443 selects `https`, port 80 selects `http`, and any
	/// other port is reached over `https` with the port spelled out.
	///
	/// `key` is inline PEM or a path to a PEM file.
	pub fn connect_credentials(
		host: &str,
		port: u16,
		version: &str,
		user_id: &str,
		key: &str,
	) -> Result<Self> {
		let url = match port {
			443 => format!("https://{host}"),
			80 => format!("http://{host}"),
			_ => format!("https://{host}:{port}"),
		};

		Self::connect_url(&url, version, user_id, key)
	}

	/// Connects to a full server URL, e.g. `https://chef.example.com/organizations/test`.
	///
	/// `key` is inline PEM or a path to a PEM file.
	pub fn connect_url(url: &str, version: &str, user_id: &str, key: &str) -> Result<Self> {
		observe_connect("connect_url", || {
			let url = Url::parse(url).map_err(ConfigError::from)?;
			let key = PrivateKey::load(key)?;

			Self::new(url, version, user_id, key)
		})
	}

	/// Builds a context from knife settings, reading the key from `client_key`.
	pub fn from_knife(config: &KnifeConfig, version: &str) -> Result<Self> {
		observe_connect("from_knife", || {
			let user_id = config
				.node_name
				.as_deref()
				.ok_or(ConfigError::MissingField { field: "node_name" })?;
			let key_path = config
				.client_key
				.as_deref()
				.ok_or(ConfigError::MissingField { field: "client_key" })?;
			let url = config
				.chef_server_url
				.as_deref()
				.ok_or(ConfigError::MissingField { field: "chef_server_url" })?;
			let url = Url::parse(url).map_err(ConfigError::from)?;
			let key = PrivateKey::from_file(key_path)?;

			Self::new(url, version, user_id, key)
		})
	}

	/// Loads `path` with [`KnifeConfig::load`] and builds a context from it.
	pub fn from_knife_file(path: impl AsRef<Path>, version: &str) -> Result<Self> {
		let config = KnifeConfig::load(path)?;

		Self::from_knife(&config, version)
	}

	/// Toggles TLS certificate verification for dispatchers built from this context.
	pub fn with_tls_skip_verify(mut self, skip: bool) -> Self {
		self.tls_skip_verify = skip;

		self
	}

	/// Replaces the clock stamping requests.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Authorizer bound to this context's key, user, and version.
	pub fn authorizer(&self) -> RequestAuthorizer<'_> {
		RequestAuthorizer::new(&self.key, &self.user_id, &self.version)
	}

	/// Signs a request at the clock's current instant.
	pub fn headers(&self, method: &str, path: &str, body: &str) -> Result<HeaderSet> {
		Ok(self.authorizer().headers_now(method, path, body, self.clock.as_ref())?)
	}

	/// Joins `endpoint` onto the base URL with a single `/`.
	pub fn request_url(&self, endpoint: &str) -> Result<Url> {
		let base = self.url.as_str().trim_end_matches('/');
		let endpoint = endpoint.trim_start_matches('/');

		Ok(Url::parse(&format!("{base}/{endpoint}")).map_err(ConfigError::from)?)
	}
}
impl Debug for ConnectionContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConnectionContext")
			.field("url", &self.url.as_str())
			.field("version", &self.version)
			.field("user_id", &self.user_id)
			.field("key", &self.key)
			.field("tls_skip_verify", &self.tls_skip_verify)
			.finish_non_exhaustive()
	}
}

fn endpoint(url: &Url) -> Result<(String, u16), ConfigError> {
	let host = url
		.host_str()
		.filter(|host| !host.is_empty())
		.ok_or_else(|| ConfigError::InvalidHostFormat { url: url.to_string() })?;
	let port = match (url.port(), url.scheme()) {
		(Some(port), _) => port,
		(None, "https") => 443,
		(None, "http") => 80,
		(None, scheme) =>
			return Err(ConfigError::UnsupportedScheme { scheme: scheme.to_owned() }),
	};

	Ok((host.to_owned(), port))
}

fn observe_connect<T>(stage: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
	const OPERATION: Operation = Operation::Connect;

	let _span = OperationSpan::new(OPERATION, stage).entered();

	obs::record_outcome(OPERATION, OperationOutcome::Attempt);

	let result = f();

	if result.is_err() {
		obs::trace_event(OPERATION, "connection bootstrap failed");
	}

	obs::record_outcome(OPERATION, OperationOutcome::of(&result));

	result
}

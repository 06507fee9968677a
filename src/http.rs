//! reqwest dispatcher that signs every Chef server request with its connection context.
//!
//! Parameters travel form-encoded and sorted by key. For `GET` the encoded form becomes the
//! query string and the signed body is empty; every other method sends the form as the
//! request body and signs exactly those bytes. The signed path is always the URL path, so the
//! query never feeds the signature.

// crates.io
use reqwest::{
	Method, Request as ReqwestRequest, Response as ReqwestResponse,
	header::{CONTENT_TYPE, HeaderValue},
};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	connection::ConnectionContext,
	error::{ConfigError, TransportError},
	ext::{ReqwestHeaderSigner, RequestSignerExt},
	obs::{self, Operation, OperationOutcome, OperationSpan},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Chef server client pairing a shared [`ConnectionContext`] with a [`ReqwestClient`].
///
/// Cloning is cheap; clones share the context and the underlying connection pool.
#[derive(Clone, Debug)]
pub struct ChefClient {
	context: Arc<ConnectionContext>,
	http: ReqwestClient,
	signer: ReqwestHeaderSigner,
}
impl ChefClient {
	/// Builds a client whose TLS verification follows
	/// [`ConnectionContext::tls_skip_verify`].
	pub fn new(context: impl Into<Arc<ConnectionContext>>) -> Result<Self> {
		let context = context.into();
		let http = ReqwestClient::builder()
			.danger_accept_invalid_certs(context.tls_skip_verify)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self::with_client(context, http))
	}

	/// Wraps an existing reqwest [`ReqwestClient`]; its TLS policy is used as-is.
	pub fn with_client(context: impl Into<Arc<ConnectionContext>>, http: ReqwestClient) -> Self {
		Self { context: context.into(), http, signer: ReqwestHeaderSigner }
	}

	/// Connection context shared by every request.
	pub fn context(&self) -> &ConnectionContext {
		&self.context
	}

	/// Builds a signed request for `endpoint` relative to the context's base URL.
	pub fn generate_request(
		&self,
		method: Method,
		endpoint: &str,
		params: &BTreeMap<String, String>,
	) -> Result<ReqwestRequest> {
		let mut url = self.context.request_url(endpoint)?;
		let form = encode_form(params);
		let body = if method == Method::GET { "" } else { form.as_str() };
		let headers = self.context.headers(method.as_str(), url.path(), body)?;

		if method == Method::GET && !params.is_empty() {
			url.query_pairs_mut().extend_pairs(params);
		}

		let send_body = method != Method::GET && !form.is_empty();
		let mut request = ReqwestRequest::new(method, url);

		if send_body {
			request.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
			*request.body_mut() = Some(form.into());
		}

		self.signer.attach_headers(request, &headers)
	}

	/// Sends a signed `GET` for `endpoint`.
	pub async fn get(&self, endpoint: &str) -> Result<ReqwestResponse> {
		self.send(Method::GET, endpoint, &BTreeMap::new()).await
	}

	/// Sends a signed `GET` with `params` as the query string.
	pub async fn get_with_params(
		&self,
		endpoint: &str,
		params: &BTreeMap<String, String>,
	) -> Result<ReqwestResponse> {
		self.send(Method::GET, endpoint, params).await
	}

	/// Sends a signed `POST` with `params` as the form body.
	pub async fn post(
		&self,
		endpoint: &str,
		params: &BTreeMap<String, String>,
	) -> Result<ReqwestResponse> {
		self.send(Method::POST, endpoint, params).await
	}

	/// Sends a signed `PUT` with `params` as the form body.
	pub async fn put(
		&self,
		endpoint: &str,
		params: &BTreeMap<String, String>,
	) -> Result<ReqwestResponse> {
		self.send(Method::PUT, endpoint, params).await
	}

	/// Sends a signed `DELETE` with `params` as the form body.
	pub async fn delete(
		&self,
		endpoint: &str,
		params: &BTreeMap<String, String>,
	) -> Result<ReqwestResponse> {
		self.send(Method::DELETE, endpoint, params).await
	}

	/// Dispatches an already-built request. Any HTTP status counts as success here; use
	/// [`response_body`] to enforce a 2xx answer.
	pub async fn execute(&self, request: ReqwestRequest) -> Result<ReqwestResponse> {
		const OPERATION: Operation = Operation::Request;

		let span = OperationSpan::new(OPERATION, "execute");

		obs::record_outcome(OPERATION, OperationOutcome::Attempt);

		let result = span
			.instrument(self.http.execute(request))
			.await
			.map_err(|e| Error::from(TransportError::from(e)));

		if result.is_err() {
			obs::trace_event(OPERATION, "request dispatch failed");
		}

		obs::record_outcome(OPERATION, OperationOutcome::of(&result));

		result
	}

	async fn send(
		&self,
		method: Method,
		endpoint: &str,
		params: &BTreeMap<String, String>,
	) -> Result<ReqwestResponse> {
		let request = self.generate_request(method, endpoint, params)?;

		self.execute(request).await
	}
}

/// Reads the full body of a 2xx response; any other status becomes [`Error::HttpStatus`].
pub async fn response_body(response: ReqwestResponse) -> Result<Vec<u8>> {
	let status = response.status();

	if !status.is_success() {
		return Err(Error::HttpStatus {
			status: status.as_u16(),
			text: status.canonical_reason().unwrap_or(status.as_str()).to_owned(),
		});
	}

	let bytes = response.bytes().await.map_err(TransportError::from)?;

	Ok(bytes.to_vec())
}

// `BTreeMap` iteration keeps the pairs sorted by key.
fn encode_form(params: &BTreeMap<String, String>) -> String {
	Serializer::new(String::new()).extend_pairs(params).finish()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::{HEADER_CONTENT_HASH, hash_and_join},
	};

	fn client() -> ChefClient {
		ChefClient::new(test_context("https://chef.example.com/organizations/test"))
			.expect("Client should build.")
	}

	fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	fn header<'a>(request: &'a ReqwestRequest, name: &str) -> Option<&'a str> {
		request.headers().get(name).and_then(|value| value.to_str().ok())
	}

	#[test]
	fn form_encoding_sorts_keys_and_escapes_values() {
		assert_eq!(encode_form(&params(&[("z", "1"), ("a", "b c&d")])), "a=b+c%26d&z=1");
		assert_eq!(encode_form(&BTreeMap::new()), "");
	}

	#[test]
	fn get_params_go_to_the_query_after_signing() {
		let request = client()
			.generate_request(Method::GET, "nodes", &params(&[("rows", "5"), ("q", "name:*")]))
			.expect("Request should build.");
		let expected = client()
			.context()
			.headers("GET", "/organizations/test/nodes", "")
			.expect("Headers should sign.");

		assert_eq!(request.url().path(), "/organizations/test/nodes");
		assert_eq!(request.url().query(), Some("q=name%3A*&rows=5"));
		assert!(request.body().is_none());
		assert_eq!(header(&request, HEADER_CONTENT_HASH), Some(hash_and_join(b"").as_str()));

		for (name, value) in &expected {
			assert_eq!(header(&request, name), Some(value.as_str()));
		}
	}

	#[test]
	fn non_get_params_are_signed_and_sent_as_the_body() {
		let request = client()
			.generate_request(Method::POST, "/roles", &params(&[("name", "web")]))
			.expect("Request should build.");

		assert_eq!(request.url().query(), None);
		assert_eq!(
			request.body().and_then(|body| body.as_bytes()),
			Some(&b"name=web"[..])
		);
		assert_eq!(header(&request, "content-type"), Some(FORM_CONTENT_TYPE));
		assert_eq!(
			header(&request, HEADER_CONTENT_HASH),
			Some(hash_and_join(b"name=web").as_str())
		);
	}

	#[test]
	fn bodiless_deletes_sign_an_empty_body() {
		let request = client()
			.generate_request(Method::DELETE, "nodes/web01", &BTreeMap::new())
			.expect("Request should build.");

		assert!(request.body().is_none());
		assert!(request.headers().get("content-type").is_none());
		assert_eq!(header(&request, HEADER_CONTENT_HASH), Some(hash_and_join(b"").as_str()));
	}
}

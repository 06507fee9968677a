//! Request signing contracts that merge a [`HeaderSet`] into an outbound request.

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	Request as ReqwestRequest,
	header::{HeaderName, HeaderValue},
};
// self
use crate::auth::HeaderSet;
#[cfg(feature = "reqwest")] use crate::{_prelude::*, error::ConfigError};

/// Describes how to attach a signed [`HeaderSet`] to an outbound request without
/// constraining the HTTP client type.
///
/// The trait is generic over both the request and error types so implementers can
/// integrate with any client builder while keeping this crate free of those dependencies.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the request and returns it with every header in `headers` attached,
	/// replacing existing values of the same name.
	fn attach_headers(&self, request: Request, headers: &HeaderSet) -> Result<Request, Error>;
}

/// [`RequestSignerExt`] for [`reqwest::Request`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestHeaderSigner;
#[cfg(feature = "reqwest")]
impl RequestSignerExt<ReqwestRequest, Error> for ReqwestHeaderSigner {
	fn attach_headers(
		&self,
		mut request: ReqwestRequest,
		headers: &HeaderSet,
	) -> Result<ReqwestRequest> {
		let target = request.headers_mut();

		for (name, value) in headers {
			let header_name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|e| ConfigError::invalid_header(name, e))?;
			let header_value =
				HeaderValue::from_str(value).map_err(|e| ConfigError::invalid_header(name, e))?;

			target.insert(header_name, header_value);
		}

		Ok(request)
	}
}

//! Remote data API client.
//!
//! [`RemoteApiClient`] performs authenticated calls against an OData-style data API. Every
//! request carries the caller's bearer credential plus the protocol version headers the API
//! expects. Responses are classified into the broker's [`Error`] taxonomy: transport failures,
//! non-success statuses, and payloads that lack the expected identifier each map to a distinct
//! variant so the HTTP surface can report them separately.

// crates.io
use reqwest::header::ACCEPT;
// self
use crate::{
	_prelude::*,
	auth::{Credential, UserId},
	descriptor::ServiceDescriptor,
	error::ConfigError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Relative path of the identity endpoint.
pub const WHO_AM_I_PATH: &str = "WhoAmI";

const ODATA_MAX_VERSION: &str = "OData-MaxVersion";
const ODATA_VERSION: &str = "OData-Version";
const ODATA_PROTOCOL: &str = "4.0";

/// Thin wrapper around [`ReqwestClient`] bound to one remote API base address.
///
/// Calls are never retried; a failed call surfaces immediately to the caller.
#[derive(Clone, Debug)]
pub struct RemoteApiClient {
	client: ReqwestClient,
	base: Url,
}
impl RemoteApiClient {
	/// Builds a client whose requests are bounded by the descriptor's API timeout.
	pub fn from_descriptor(descriptor: &ServiceDescriptor) -> Result<Self> {
		let client = ReqwestClient::builder()
			.timeout(descriptor.api_timeout)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self::with_client(client, descriptor.api_base.clone()))
	}

	/// Wraps an existing [`ReqwestClient`]; `base` is used as-is for joining endpoint paths.
	pub fn with_client(client: ReqwestClient, base: Url) -> Self {
		Self { client, base }
	}

	/// Base address endpoint paths are joined onto.
	pub fn base(&self) -> &Url {
		&self.base
	}

	/// Resolves the identity of the principal the credential was issued to.
	pub async fn who_am_i(&self, credential: &Credential) -> Result<UserId> {
		let span = FlowSpan::new(FlowKind::RemoteCall, "who_am_i");

		span.record(FlowOutcome::Attempt);

		let result = span.instrument(self.call_who_am_i(credential)).await;

		match &result {
			Ok(_) => span.record(FlowOutcome::Success),
			Err(_e) => {
				span.record(FlowOutcome::Failure);
				obs::event!(warn, error = %_e, "Remote identity call failed.");
			},
		}

		result
	}

	async fn call_who_am_i(&self, credential: &Credential) -> Result<UserId> {
		let endpoint = self
			.base
			.join(WHO_AM_I_PATH)
			.map_err(|source| ConfigError::InvalidEndpoint { path: WHO_AM_I_PATH, source })?;
		let response = self
			.client
			.get(endpoint)
			.bearer_auth(credential.access_token.expose())
			.header(ODATA_MAX_VERSION, ODATA_PROTOCOL)
			.header(ODATA_VERSION, ODATA_PROTOCOL)
			.header(ACCEPT, "application/json")
			.send()
			.await?;
		let status = response.status();

		if !status.is_success() {
			return Err(Error::RemoteCallFailed {
				status: status.as_u16(),
				reason: status.canonical_reason().unwrap_or("Unknown Status").into(),
			});
		}

		let body = response.bytes().await?;

		parse_who_am_i(&body)
	}
}

#[derive(Deserialize)]
struct WhoAmIResponse {
	#[serde(rename = "UserId")]
	user_id: UserId,
}

fn parse_who_am_i(body: &[u8]) -> Result<UserId> {
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize::<_, WhoAmIResponse>(&mut de)
		.map(|response| response.user_id)
		.map_err(|e| Error::MalformedResponse {
			reason: format!("{} at `{}`", e.inner(), e.path()),
		})
}

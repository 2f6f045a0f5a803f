// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet},
	descriptor::ServiceDescriptor,
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DescriptorError {
	/// Authority address is required.
	#[error("Missing authority endpoint.")]
	MissingAuthority,
	/// Redirect target is required.
	#[error("Missing redirect URI.")]
	MissingRedirectUri,
	/// Remote API base address is required.
	#[error("Missing remote API base address.")]
	MissingApiBase,
	/// At least one scope must be requested.
	#[error("Descriptor must request at least one scope.")]
	EmptyScope,
	/// Endpoints must use HTTPS unless they point at the local machine.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The remote API base cannot have relative paths joined onto it.
	#[error("Remote API base address cannot be used as a base: {url}.")]
	InvalidApiBase {
		/// Offending URL.
		url: String,
	},
	/// Network bounds must be positive.
	#[error("The {which} timeout must be greater than zero.")]
	ZeroTimeout {
		/// Which timeout failed validation.
		which: &'static str,
	},
}

/// Builder for [`ServiceDescriptor`] values.
#[derive(Debug)]
pub struct ServiceDescriptorBuilder {
	/// Client identifier for the descriptor being constructed.
	pub client_id: ClientId,
	/// Authority (issuer) base address.
	pub authority: Option<Url>,
	/// Redirect target for the consent step.
	pub redirect_uri: Option<Url>,
	/// Requested scopes.
	pub scope: ScopeSet,
	/// Remote API base address.
	pub api_base: Option<Url>,
	/// Bound for remote API calls.
	pub api_timeout: StdDuration,
	/// Bound for silent acquisitions.
	pub silent_timeout: StdDuration,
}
impl ServiceDescriptorBuilder {
	/// Creates a new builder seeded with the provided client identifier.
	pub fn new(client_id: ClientId) -> Self {
		Self {
			client_id,
			authority: None,
			redirect_uri: None,
			scope: ScopeSet::default(),
			api_base: None,
			api_timeout: ServiceDescriptor::DEFAULT_TIMEOUT,
			silent_timeout: ServiceDescriptor::DEFAULT_TIMEOUT,
		}
	}

	/// Sets the authority address.
	pub fn authority(mut self, url: Url) -> Self {
		self.authority = Some(url);

		self
	}

	/// Sets the redirect target used by the consent step.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Sets the requested scopes.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Sets the remote API base address.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the remote API call bound (defaults to two minutes).
	pub fn api_timeout(mut self, timeout: StdDuration) -> Self {
		self.api_timeout = timeout;

		self
	}

	/// Overrides the silent acquisition bound (defaults to two minutes).
	pub fn silent_timeout(mut self, timeout: StdDuration) -> Self {
		self.silent_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ServiceDescriptor, DescriptorError> {
		let authority = self.authority.ok_or(DescriptorError::MissingAuthority)?;
		let redirect_uri = self.redirect_uri.ok_or(DescriptorError::MissingRedirectUri)?;
		let api_base = self.api_base.ok_or(DescriptorError::MissingApiBase)?;
		let descriptor = ServiceDescriptor {
			client_id: self.client_id,
			authority,
			redirect_uri,
			scope: self.scope,
			api_base: with_trailing_slash(api_base),
			api_timeout: self.api_timeout,
			silent_timeout: self.silent_timeout,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ServiceDescriptor {
	fn validate(&self) -> Result<(), DescriptorError> {
		if self.scope.is_empty() {
			return Err(DescriptorError::EmptyScope);
		}
		if self.api_base.cannot_be_a_base() {
			return Err(DescriptorError::InvalidApiBase { url: self.api_base.to_string() });
		}

		validate_endpoint("authority", &self.authority)?;
		validate_endpoint("redirect", &self.redirect_uri)?;
		validate_endpoint("remote API", &self.api_base)?;

		if self.api_timeout.is_zero() {
			return Err(DescriptorError::ZeroTimeout { which: "remote API" });
		}
		if self.silent_timeout.is_zero() {
			return Err(DescriptorError::ZeroTimeout { which: "silent acquisition" });
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), DescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(DescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url
}

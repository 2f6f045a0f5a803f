//! Validated static configuration for the broker.
//!
//! A [`ServiceDescriptor`] captures everything fixed at process start: the client registered
//! with the authority, where consent returns to, which scopes are requested, where the remote
//! API lives, and the bounds applied to short-lived network steps. Build one through
//! [`ServiceDescriptor::builder`]; invalid combinations are rejected up front.

/// Builder API for assembling service descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet},
	authority::AuthorityConfig,
};

/// Immutable configuration consumed by the manager and the remote API client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
	/// Client identifier registered with the authority.
	pub client_id: ClientId,
	/// Authority (issuer) base address.
	pub authority: Url,
	/// Redirect target the consent step returns to.
	pub redirect_uri: Url,
	/// Scopes requested for every acquisition.
	pub scope: ScopeSet,
	/// Base address of the remote data API (always ends with `/`).
	pub api_base: Url,
	/// Bound applied to each remote API call.
	pub api_timeout: StdDuration,
	/// Bound applied to each silent acquisition.
	pub silent_timeout: StdDuration,
}
impl ServiceDescriptor {
	/// Default bound for remote API calls and silent acquisitions.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(120);

	/// Creates a new builder for the provided client identifier.
	pub fn builder(client_id: ClientId) -> ServiceDescriptorBuilder {
		ServiceDescriptorBuilder::new(client_id)
	}

	/// Static settings handed to the authorization capability.
	pub fn authority_config(&self) -> AuthorityConfig {
		AuthorityConfig {
			client_id: self.client_id.clone(),
			authority: self.authority.clone(),
			redirect_uri: self.redirect_uri.clone(),
			scope: self.scope.clone(),
		}
	}
}

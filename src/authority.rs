//! Authorization capability contract consumed by the token manager.
//!
//! The broker never speaks the authorization handshake itself. An implementation of
//! [`AuthorizationCapability`] wraps whatever identity library performs the grant (browser
//! consent, device code, refresh exchange) and exposes exactly two operations: a silent
//! attempt that may reuse an existing grant, and an interactive attempt that may suspend until
//! the end user finishes a consent step. [`ScriptedAuthority`] is a deterministic stand-in for
//! tests and demos.

pub mod scripted;

pub use scripted::ScriptedAuthority;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, Credential, PrincipalHint, ScopeSet},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed future returned by [`AuthorizationCapability`] operations.
pub type AuthorizationFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Credential, AuthorizationError>> + 'a + Send>>;

/// External capability that mints credentials for the configured client.
pub trait AuthorizationCapability
where
	Self: 'static + Send + Sync,
{
	/// Attempts to obtain a credential without user interaction.
	///
	/// `known_principals` lists accounts previously granted to the calling session, followed by
	/// any hints the operator shares across sessions, so a matching grant can be reused. Implementations return [`AuthorizationError::ConsentRequired`] when
	/// no usable grant exists or it has been revoked.
	fn try_silent<'a>(
		&'a self,
		known_principals: &'a [PrincipalHint],
		scope: &'a ScopeSet,
	) -> AuthorizationFuture<'a>;

	/// Obtains a credential through a user-facing consent step.
	///
	/// The returned future may stay pending for as long as the user takes; callers that need a
	/// bound must wrap the whole acquisition in their own timeout.
	fn interactive<'a>(&'a self, scope: &'a ScopeSet) -> AuthorizationFuture<'a>;
}

/// Failures reported by an [`AuthorizationCapability`].
#[derive(Debug, ThisError)]
pub enum AuthorizationError {
	/// No reusable grant exists; an interactive consent step is needed.
	#[error("User consent is required: {reason}.")]
	ConsentRequired {
		/// Authority-supplied explanation.
		reason: String,
	},
	/// The authority refused to issue a token.
	#[error("Authority rejected the request: {reason}.")]
	Rejected {
		/// Authority-supplied explanation.
		reason: String,
	},
	/// The user dismissed or abandoned the consent step.
	#[error("User cancelled the consent step.")]
	Cancelled,
	/// The authority did not answer within the configured bound.
	#[error("Authority did not respond in time.")]
	TimedOut,
	/// Transport failure while talking to the authority.
	#[error("Transport error occurred while contacting the authority.")]
	Transport {
		/// Underlying transport failure.
		#[source]
		source: BoxError,
	},
}
impl AuthorizationError {
	/// Shorthand for [`AuthorizationError::ConsentRequired`].
	pub fn consent_required(reason: impl Into<String>) -> Self {
		Self::ConsentRequired { reason: reason.into() }
	}

	/// Shorthand for [`AuthorizationError::Rejected`].
	pub fn rejected(reason: impl Into<String>) -> Self {
		Self::Rejected { reason: reason.into() }
	}

	/// Wraps a transport-specific failure.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Returns `true` when the error asks for an interactive fallback.
	pub fn is_consent_required(&self) -> bool {
		matches!(self, Self::ConsentRequired { .. })
	}
}

/// Static settings an authorization capability is configured with at process start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityConfig {
	/// Client identifier registered with the authority.
	pub client_id: ClientId,
	/// Authority (issuer) base address.
	pub authority: Url,
	/// Redirect target the consent step returns to.
	pub redirect_uri: Url,
	/// Scopes requested for every acquisition.
	pub scope: ScopeSet,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn consent_required_is_the_only_fallback_signal() {
		assert!(AuthorizationError::consent_required("no account").is_consent_required());
		assert!(!AuthorizationError::rejected("invalid_client").is_consent_required());
		assert!(!AuthorizationError::Cancelled.is_consent_required());
		assert!(!AuthorizationError::TimedOut.is_consent_required());
	}
}

//! Immutable bearer credentials and their validity rule.

// self
use crate::{
	_prelude::*,
	auth::{PrincipalHint, TokenSecret},
};

/// Issued access token plus the instant after which it must not be reused.
///
/// Credentials are never mutated; a refresh produces a new value that supersedes the old one.
/// Validity is the only local admissibility check, token contents are never inspected.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Bearer secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Absolute UTC expiry instant.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_on: OffsetDateTime,
	/// Account the authority granted the token for, when it reported one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub principal: Option<PrincipalHint>,
}
impl Credential {
	/// Creates a credential for the provided token and expiry.
	pub fn new(access_token: impl Into<String>, expires_on: OffsetDateTime) -> Self {
		Self { access_token: TokenSecret::new(access_token), expires_on, principal: None }
	}

	/// Attaches the principal hint reported by the authority.
	pub fn with_principal(mut self, principal: PrincipalHint) -> Self {
		self.principal = Some(principal);

		self
	}

	/// Returns `true` when the credential may still be used at `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_on > instant
	}

	/// Convenience helper that checks validity against the current UTC clock.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("expires_on", &self.expires_on)
			.field("principal", &self.principal)
			.finish()
	}
}

//! Request-scoped [`CredentialCache`] over a client-held cookie slot.
//!
//! The cache never touches an HTTP response. Reads come from the cookie value the client sent
//! with the current request; writes are recorded as an explicit [`CachePut`] effect that the
//! transport layer turns into a `Set-Cookie` header once the handler finishes.

// self
use crate::{
	_prelude::*,
	auth::{Credential, SessionKey},
	cache::{CacheError, CacheFuture, CredentialCache, codec},
};

/// Largest `name=value` pair accepted for a cookie slot.
pub const COOKIE_SIZE_LIMIT: usize = 4096;

/// Static attributes of the credential cookie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieSettings {
	/// Cookie name.
	pub name: String,
	/// Cookie path attribute.
	pub path: String,
	/// Whether the cookie carries the `Secure` attribute.
	pub secure: bool,
}
impl CookieSettings {
	/// Default name of the credential cookie.
	pub const DEFAULT_NAME: &'static str = "AuthToken";

	/// Overrides the cookie name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();

		self
	}

	/// Toggles the `Secure` attribute (disable only for plain-HTTP local development).
	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = secure;

		self
	}
}
impl Default for CookieSettings {
	fn default() -> Self {
		Self { name: Self::DEFAULT_NAME.into(), path: "/".into(), secure: true }
	}
}

/// Cookie the transport layer must attach to the response.
///
/// The cookie is always `HttpOnly` so client-side script can neither read nor modify it, and it
/// expires together with the credential it carries.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingCookie {
	/// Cookie name.
	pub name: String,
	/// Encoded credential.
	pub value: String,
	/// Expiry instant (equal to the credential's expiry).
	pub expires: OffsetDateTime,
	/// Cookie path attribute.
	pub path: String,
	/// Whether the `Secure` attribute is set.
	pub secure: bool,
	/// Whether the `HttpOnly` attribute is set.
	pub http_only: bool,
}
impl Debug for PendingCookie {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingCookie")
			.field("name", &self.name)
			.field("value", &"<redacted>")
			.field("expires", &self.expires)
			.field("path", &self.path)
			.field("secure", &self.secure)
			.field("http_only", &self.http_only)
			.finish()
	}
}

/// Write effect produced by [`CookieCache::put`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachePut {
	/// Session the write belongs to.
	pub session: SessionKey,
	/// Credential that was stored.
	pub credential: Credential,
	/// Cookie that persists the credential on the client.
	pub cookie: PendingCookie,
}

/// Cookie-backed cache bound to the session of a single inbound request.
#[derive(Debug)]
pub struct CookieCache {
	session: SessionKey,
	settings: CookieSettings,
	inbound: Option<String>,
	pending: Mutex<Option<CachePut>>,
}
impl CookieCache {
	/// Creates a cache for `session` seeded with the cookie value sent by the client, if any.
	pub fn new(session: SessionKey, settings: CookieSettings, inbound: Option<String>) -> Self {
		Self { session, settings, inbound, pending: Mutex::new(None) }
	}

	/// Session this cache is bound to.
	pub fn session(&self) -> &SessionKey {
		&self.session
	}

	/// Cookie attributes used for writes.
	pub fn settings(&self) -> &CookieSettings {
		&self.settings
	}

	/// Returns a copy of the pending write, if any.
	pub fn pending(&self) -> Option<CachePut> {
		self.pending.lock().clone()
	}

	/// Removes and returns the pending write so the transport can apply it.
	pub fn take_pending(&self) -> Option<CachePut> {
		self.pending.lock().take()
	}

	fn build_put(&self, credential: Credential) -> Result<CachePut, CacheError> {
		let value = codec::encode_cookie_value(&credential)?;
		let size = self.settings.name.len() + 1 + value.len();

		if size > COOKIE_SIZE_LIMIT {
			return Err(CacheError::EntryTooLarge { size, limit: COOKIE_SIZE_LIMIT });
		}

		let cookie = PendingCookie {
			name: self.settings.name.clone(),
			value,
			expires: credential.expires_on,
			path: self.settings.path.clone(),
			secure: self.settings.secure,
			http_only: true,
		};

		Ok(CachePut { session: self.session.clone(), credential, cookie })
	}
}
impl CredentialCache for CookieCache {
	fn get<'a>(&'a self, session: &'a SessionKey) -> CacheFuture<'a, Option<Credential>> {
		let result = if session != &self.session {
			None
		} else if let Some(put) = self.pending.lock().as_ref() {
			Some(put.credential.clone())
		} else {
			self.inbound.as_deref().and_then(codec::decode_cookie_value)
		};

		Box::pin(async move { Ok(result) })
	}

	fn put<'a>(&'a self, session: &'a SessionKey, credential: Credential) -> CacheFuture<'a, ()> {
		let result = if session != &self.session {
			Err(CacheError::SessionMismatch)
		} else {
			self.build_put(credential).map(|put| {
				*self.pending.lock() = Some(put);
			})
		};

		Box::pin(async move { result })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn session(value: &str) -> SessionKey {
		SessionKey::new(value).expect("Session fixture should be valid.")
	}

	#[tokio::test]
	async fn reads_inbound_cookie_value() {
		let credential = Credential::new("T0", macros::datetime!(2030-01-01 00:00 UTC));
		let inbound = codec::encode_cookie_value(&credential).expect("Credential should encode.");
		let key = session("s-1");
		let cache = CookieCache::new(key.clone(), CookieSettings::default(), Some(inbound));

		assert_eq!(cache.get(&key).await.expect("Cookie reads never fail."), Some(credential));
		assert_eq!(
			cache.get(&session("other")).await.expect("Cookie reads never fail."),
			None,
			"Foreign sessions must never see this client's cookie."
		);
	}

	#[tokio::test]
	async fn tampered_cookie_reads_as_miss() {
		let key = session("s-1");
		let cache =
			CookieCache::new(key.clone(), CookieSettings::default(), Some("e30garbage".into()));

		assert_eq!(cache.get(&key).await.expect("Cookie reads never fail."), None);
	}

	#[tokio::test]
	async fn put_records_http_only_effect_expiring_with_credential() {
		let key = session("s-1");
		let cache = CookieCache::new(key.clone(), CookieSettings::default(), None);
		let expires = macros::datetime!(2030-01-01 00:00 UTC);
		let credential = Credential::new("T1", expires);

		cache.put(&key, credential.clone()).await.expect("Put should succeed.");

		let put = cache.pending().expect("Put should leave a pending effect.");

		assert_eq!(put.session, key);
		assert_eq!(put.credential, credential);
		assert_eq!(put.cookie.name, "AuthToken");
		assert_eq!(put.cookie.expires, expires);
		assert!(put.cookie.http_only);
		assert!(put.cookie.secure);
		assert_eq!(codec::decode_cookie_value(&put.cookie.value), Some(credential.clone()));
		assert_eq!(
			cache.get(&key).await.expect("Cookie reads never fail."),
			Some(credential),
			"Pending writes must be visible to later reads."
		);
		assert!(cache.take_pending().is_some());
		assert!(cache.take_pending().is_none());
	}

	#[tokio::test]
	async fn put_rejects_foreign_session_and_oversized_entries() {
		let key = session("s-1");
		let cache = CookieCache::new(key.clone(), CookieSettings::default(), None);
		let expires = macros::datetime!(2030-01-01 00:00 UTC);

		assert_eq!(
			cache.put(&session("s-2"), Credential::new("T1", expires)).await,
			Err(CacheError::SessionMismatch)
		);
		assert!(matches!(
			cache.put(&key, Credential::new("x".repeat(COOKIE_SIZE_LIMIT), expires)).await,
			Err(CacheError::EntryTooLarge { limit: COOKIE_SIZE_LIMIT, .. })
		));
		assert!(cache.pending().is_none());
	}
}

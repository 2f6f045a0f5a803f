//! Credential cache contract and built-in cache implementations.
//!
//! A cache maps one [`SessionKey`] to at most one serialized [`Credential`]; the last write
//! wins. Reads are fail-soft: an entry that cannot be decoded is reported as absent so a
//! tampered or stale slot never blocks acquisition.

pub mod codec;
pub mod cookie;
pub mod memory;

pub use cookie::{CachePut, CookieCache, CookieSettings, PendingCookie};
pub use memory::MemoryCache;

// self
use crate::{
	_prelude::*,
	auth::{Credential, SessionKey},
};

/// Boxed future returned by [`CredentialCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage contract for session-scoped credentials.
pub trait CredentialCache
where
	Self: Send + Sync,
{
	/// Returns the credential stored for `session`, or `None` when absent or unreadable.
	fn get<'a>(&'a self, session: &'a SessionKey) -> CacheFuture<'a, Option<Credential>>;

	/// Stores `credential` for `session`, replacing any previous entry.
	fn put<'a>(&'a self, session: &'a SessionKey, credential: Credential) -> CacheFuture<'a, ()>;
}

/// Error type produced by [`CredentialCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// The credential could not be serialized.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage slot.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The encoded entry does not fit into the storage slot.
	#[error("Encoded entry is {size} bytes, above the {limit} byte limit.")]
	EntryTooLarge {
		/// Encoded size in bytes.
		size: usize,
		/// Maximum size accepted by the slot.
		limit: usize,
	},
	/// A request-scoped cache was asked about a session it is not bound to.
	#[error("Cache is bound to a different session.")]
	SessionMismatch,
}

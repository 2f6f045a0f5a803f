//! Thread-safe in-memory [`CredentialCache`] keyed by server-side session identifiers.

// self
use crate::{
	_prelude::*,
	auth::{Credential, SessionKey},
	cache::{CacheFuture, CredentialCache, codec},
};

type EntryMap = Arc<RwLock<HashMap<SessionKey, String>>>;

/// Server-side cache holding one serialized credential per session.
///
/// Entries are stored in their serialized form so reads go through the same fail-soft decoding
/// path as client-held slots.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(EntryMap);
impl MemoryCache {
	/// Number of sessions with a stored entry.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no session has a stored entry.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Stores a raw entry without validation; useful for seeding corrupted slots in tests.
	pub fn insert_raw(&self, session: SessionKey, raw: impl Into<String>) {
		self.0.write().insert(session, raw.into());
	}

	/// Drops the entry for `session`, returning `true` if one existed.
	pub fn remove(&self, session: &SessionKey) -> bool {
		self.0.write().remove(session).is_some()
	}
}
impl CredentialCache for MemoryCache {
	fn get<'a>(&'a self, session: &'a SessionKey) -> CacheFuture<'a, Option<Credential>> {
		let raw = self.0.read().get(session).cloned();

		Box::pin(async move { Ok(raw.as_deref().and_then(codec::decode_entry)) })
	}

	fn put<'a>(&'a self, session: &'a SessionKey, credential: Credential) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			let raw = codec::encode_entry(&credential)?;

			self.0.write().insert(session.to_owned(), raw);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::Duration;
	// self
	use super::*;

	fn session(value: &str) -> SessionKey {
		SessionKey::new(value).expect("Session fixture should be valid.")
	}

	#[tokio::test]
	async fn put_replaces_previous_entry() {
		let cache = MemoryCache::default();
		let key = session("s-1");
		let expires = OffsetDateTime::now_utc() + Duration::hours(1);

		cache.put(&key, Credential::new("T1", expires)).await.expect("First put should succeed.");
		cache.put(&key, Credential::new("T2", expires)).await.expect("Second put should succeed.");

		let stored = cache
			.get(&key)
			.await
			.expect("Memory cache reads never fail.")
			.expect("Entry should be present after put.");

		assert_eq!(stored.access_token.expose(), "T2");
		assert_eq!(cache.len(), 1);
	}

	#[tokio::test]
	async fn corrupted_entry_reads_as_miss() {
		let cache = MemoryCache::default();
		let key = session("s-corrupt");

		cache.insert_raw(key.clone(), "{\"access_token\":");

		assert!(cache.get(&key).await.expect("Memory cache reads never fail.").is_none());
	}

	#[tokio::test]
	async fn sessions_do_not_interfere() {
		let cache = MemoryCache::default();
		let alice = session("alice");
		let bob = session("bob");
		let expires = OffsetDateTime::now_utc() + Duration::hours(1);
		let (a, b) = tokio::join!(
			cache.put(&alice, Credential::new("TA", expires)),
			cache.put(&bob, Credential::new("TB", expires)),
		);

		a.expect("Alice put should succeed.");
		b.expect("Bob put should succeed.");

		let alice_token = cache.get(&alice).await.expect("Read should succeed.").map(|c| c.access_token);
		let bob_token = cache.get(&bob).await.expect("Read should succeed.").map(|c| c.access_token);

		assert_eq!(alice_token.as_ref().map(|t| t.expose()), Some("TA"));
		assert_eq!(bob_token.as_ref().map(|t| t.expose()), Some("TB"));
		assert!(cache.remove(&alice));
		assert!(cache.get(&alice).await.expect("Read should succeed.").is_none());
	}
}

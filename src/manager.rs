//! Token lifecycle orchestration: cache-first reuse, silent refresh, interactive fallback.
//!
//! [`TokenManager::acquire`] decides, for one session, whether a cached credential can be
//! reused or a new one must be obtained from the [`AuthorizationCapability`]. Silent
//! acquisition always runs first; only a [`AuthorizationError::ConsentRequired`] answer opens
//! the interactive path, every other silent failure ends the call. A freshly obtained
//! credential is written back to the cache before it is returned so the next request for the
//! same session takes the fast path.
//!
//! Principal hints never cross sessions. The hint offered to silent acquisition is the principal
//! recorded on the session's own expired cache entry, followed by any hints the operator shared
//! explicitly through [`TokenManager::with_shared_principals`].
//!
//! With singleflight enabled (the default) concurrent acquisitions for one session queue behind
//! a per-session guard and re-check the cache once they hold it; unrelated sessions never wait
//! on each other. The guard entry is released when its last holder finishes or is dropped.

mod metrics;

pub use metrics::AcquireMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credential, PrincipalHint, ScopeSet, SessionKey},
	authority::{AuthorizationCapability, AuthorizationError},
	cache::CredentialCache,
	descriptor::ServiceDescriptor,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

type GuardMap = Arc<Mutex<HashMap<SessionKey, FlowSlot>>>;

/// Orchestrates credential reuse and acquisition for interactive sessions.
pub struct TokenManager<A>
where
	A: ?Sized + AuthorizationCapability,
{
	/// Capability that mints new credentials.
	pub authority: Arc<A>,
	/// Scopes requested for every acquisition.
	pub scope: ScopeSet,
	/// Cache chosen at construction; `None` means every call acquires.
	pub cache: Option<Arc<dyn CredentialCache>>,
	/// Shared counters describing acquisition outcomes.
	pub metrics: Arc<AcquireMetrics>,
	silent_timeout: StdDuration,
	singleflight: bool,
	shared_principals: Arc<[PrincipalHint]>,
	flow_guards: GuardMap,
}
impl<A> TokenManager<A>
where
	A: ?Sized + AuthorizationCapability,
{
	/// Creates a manager without a cache, using the default silent bound.
	pub fn new(authority: impl Into<Arc<A>>, scope: ScopeSet) -> Self {
		Self {
			authority: authority.into(),
			scope,
			cache: None,
			metrics: Default::default(),
			silent_timeout: ServiceDescriptor::DEFAULT_TIMEOUT,
			singleflight: true,
			shared_principals: Arc::new([]),
			flow_guards: Default::default(),
		}
	}

	/// Creates a manager configured from a validated descriptor.
	pub fn from_descriptor(authority: impl Into<Arc<A>>, descriptor: &ServiceDescriptor) -> Self {
		Self::new(authority, descriptor.scope.clone())
			.with_silent_timeout(descriptor.silent_timeout)
	}

	/// Attaches the cache used by [`TokenManager::acquire`].
	pub fn with_cache(mut self, cache: Arc<dyn CredentialCache>) -> Self {
		self.cache = Some(cache);

		self
	}

	/// Overrides the bound applied to silent acquisition.
	pub fn with_silent_timeout(mut self, timeout: StdDuration) -> Self {
		self.silent_timeout = timeout;

		self
	}

	/// Enables or disables collapsing of concurrent same-session acquisitions.
	pub fn with_singleflight(mut self, enabled: bool) -> Self {
		self.singleflight = enabled;

		self
	}

	/// Principal hints offered to every session's silent acquisition, after its own hint.
	///
	/// Any session may be granted a credential for these principals, so only share hints when
	/// the process serves a single user.
	pub fn with_shared_principals<I>(mut self, principals: I) -> Self
	where
		I: IntoIterator<Item = PrincipalHint>,
	{
		let mut shared = Vec::new();

		for principal in principals {
			if !shared.contains(&principal) {
				shared.push(principal);
			}
		}

		self.shared_principals = shared.into();

		self
	}

	/// Principal hints offered to every session.
	pub fn shared_principals(&self) -> &[PrincipalHint] {
		&self.shared_principals
	}

	/// Returns a valid credential for `session`, using the configured cache.
	pub async fn acquire(&self, session: &SessionKey) -> Result<Credential> {
		self.acquire_with(session, self.cache.as_deref()).await
	}

	/// Returns a valid credential for `session`, using a caller-provided (request-scoped) cache.
	pub async fn acquire_with(
		&self,
		session: &SessionKey,
		cache: Option<&dyn CredentialCache>,
	) -> Result<Credential> {
		let span = FlowSpan::for_session(FlowKind::Cache, "acquire", &session.fingerprint());
		let flow = &span;

		span.instrument(async move {
			self.metrics.record_attempt();
			flow.record(FlowOutcome::Attempt);

			let principal = match self.lookup(session, cache, flow).await {
				Lookup::Hit(credential) => return Ok(credential),
				Lookup::Miss { principal } => principal,
			};

			flow.record(FlowOutcome::Failure);

			let result = if self.singleflight {
				self.acquire_guarded(session, cache, principal, flow).await
			} else {
				self.acquire_fresh(session, cache, principal).await
			};

			match &result {
				Ok(_) => self.metrics.record_success(),
				Err(_) => self.metrics.record_failure(),
			}

			result
		})
		.await
	}

	async fn acquire_guarded(
		&self,
		session: &SessionKey,
		cache: Option<&dyn CredentialCache>,
		principal: Option<PrincipalHint>,
		flow: &FlowSpan,
	) -> Result<Credential> {
		let guard = self.flow_guard(session);
		let _singleflight = guard.lock().await;

		match self.lookup(session, cache, flow).await {
			Lookup::Hit(credential) => Ok(credential),
			Lookup::Miss { principal: latest } =>
				self.acquire_fresh(session, cache, latest.or(principal)).await,
		}
	}

	async fn lookup(
		&self,
		session: &SessionKey,
		cache: Option<&dyn CredentialCache>,
		flow: &FlowSpan,
	) -> Lookup {
		let Some(cache) = cache else {
			return Lookup::Miss { principal: None };
		};
		let now = OffsetDateTime::now_utc();

		match cache.get(session).await {
			Ok(Some(credential)) if credential.is_valid_at(now) => {
				self.metrics.record_cache_hit();
				flow.record(FlowOutcome::Success);
				obs::event!(debug, session = %session, "Credential served from cache.");

				Lookup::Hit(credential)
			},
			Ok(Some(expired)) => {
				obs::event!(debug, session = %session, "Cached credential has expired.");

				Lookup::Miss { principal: expired.principal }
			},
			Ok(None) => Lookup::Miss { principal: None },
			Err(_e) => {
				obs::event!(
					warn,
					session = %session,
					error = %_e,
					"Cache read failed; treating it as a miss."
				);

				Lookup::Miss { principal: None }
			},
		}
	}

	async fn acquire_fresh(
		&self,
		session: &SessionKey,
		cache: Option<&dyn CredentialCache>,
		principal: Option<PrincipalHint>,
	) -> Result<Credential> {
		let credential = match self.try_silent(session, principal).await {
			Ok(credential) => credential,
			Err(e) if e.is_consent_required() => {
				obs::event!(
					info,
					session = %session,
					reason = %e,
					"Silent acquisition needs consent; falling back to interactive."
				);

				self.try_interactive(session).await?
			},
			Err(e) => {
				obs::event!(warn, session = %session, error = %e, "Silent acquisition failed.");

				return Err(Error::AcquisitionFailed { stage: FlowKind::Silent, source: e });
			},
		};

		// The stored entry carries the principal, which is where the next silent call finds it.
		if let Some(cache) = cache {
			if let Err(_e) = cache.put(session, credential.clone()).await {
				obs::event!(
					warn,
					session = %session,
					error = %_e,
					"Failed to store the acquired credential."
				);
			}
		}

		Ok(credential)
	}

	async fn try_silent(
		&self,
		session: &SessionKey,
		principal: Option<PrincipalHint>,
	) -> Result<Credential, AuthorizationError> {
		let span = FlowSpan::for_session(FlowKind::Silent, "try_silent", &session.fingerprint());
		let hints = self.silent_hints(principal);

		self.metrics.record_silent();
		span.record(FlowOutcome::Attempt);

		let result = span
			.instrument(tokio::time::timeout(
				self.silent_timeout,
				self.authority.try_silent(&hints, &self.scope),
			))
			.await
			.unwrap_or(Err(AuthorizationError::TimedOut));

		match &result {
			Ok(_) => {
				span.record(FlowOutcome::Success);
				obs::event!(info, session = %session, "Credential acquired silently.");
			},
			Err(_) => span.record(FlowOutcome::Failure),
		}

		result
	}

	async fn try_interactive(&self, session: &SessionKey) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Interactive;

		let span = FlowSpan::for_session(KIND, "try_interactive", &session.fingerprint());

		self.metrics.record_interactive();
		span.record(FlowOutcome::Attempt);

		match span.instrument(self.authority.interactive(&self.scope)).await {
			Ok(credential) => {
				span.record(FlowOutcome::Success);
				obs::event!(info, session = %session, "Credential acquired interactively.");

				Ok(credential)
			},
			Err(e) => {
				span.record(FlowOutcome::Failure);
				obs::event!(warn, session = %session, error = %e, "Interactive acquisition failed.");

				Err(Error::AcquisitionFailed { stage: KIND, source: e })
			},
		}
	}

	fn silent_hints(&self, principal: Option<PrincipalHint>) -> Vec<PrincipalHint> {
		let mut hints = Vec::from_iter(principal);

		for shared in self.shared_principals.iter() {
			if !hints.contains(shared) {
				hints.push(shared.clone());
			}
		}

		hints
	}

	fn flow_guard(&self, session: &SessionKey) -> FlowGuard {
		let mutex = {
			let mut guards = self.flow_guards.lock();
			let slot = guards
				.entry(session.clone())
				.or_insert_with(|| FlowSlot { mutex: Arc::new(AsyncMutex::new(())), holders: 0 });

			slot.holders += 1;

			slot.mutex.clone()
		};

		FlowGuard { guards: self.flow_guards.clone(), session: session.clone(), mutex }
	}

	#[cfg(test)]
	fn pending_guards(&self) -> usize {
		self.flow_guards.lock().len()
	}
}
impl<A> Clone for TokenManager<A>
where
	A: ?Sized + AuthorizationCapability,
{
	fn clone(&self) -> Self {
		Self {
			authority: self.authority.clone(),
			scope: self.scope.clone(),
			cache: self.cache.clone(),
			metrics: self.metrics.clone(),
			silent_timeout: self.silent_timeout,
			singleflight: self.singleflight,
			shared_principals: self.shared_principals.clone(),
			flow_guards: self.flow_guards.clone(),
		}
	}
}
impl<A> Debug for TokenManager<A>
where
	A: ?Sized + AuthorizationCapability,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("scope", &self.scope)
			.field("cache_set", &self.cache.is_some())
			.field("silent_timeout", &self.silent_timeout)
			.field("singleflight", &self.singleflight)
			.field("shared_principals", &self.shared_principals.len())
			.finish()
	}
}

enum Lookup {
	Hit(Credential),
	Miss { principal: Option<PrincipalHint> },
}

struct FlowSlot {
	mutex: Arc<AsyncMutex<()>>,
	holders: usize,
}

/// Handle on a session's singleflight slot; the last handle to drop removes the slot.
struct FlowGuard {
	guards: GuardMap,
	session: SessionKey,
	mutex: Arc<AsyncMutex<()>>,
}
impl FlowGuard {
	async fn lock(&self) -> async_lock::MutexGuard<'_, ()> {
		self.mutex.lock().await
	}
}
impl Drop for FlowGuard {
	fn drop(&mut self) {
		let mut guards = self.guards.lock();

		if let Some(slot) = guards.get_mut(&self.session) {
			slot.holders = slot.holders.saturating_sub(1);

			if slot.holders == 0 {
				guards.remove(&self.session);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::Duration;
	// self
	use super::*;
	use crate::{authority::ScriptedAuthority, cache::MemoryCache};

	fn scope() -> ScopeSet {
		ScopeSet::new(["user_impersonation"]).expect("Scope fixture should be valid.")
	}

	fn session(value: &str) -> SessionKey {
		SessionKey::new(value).expect("Session fixture should be valid.")
	}

	fn hint(value: &str) -> PrincipalHint {
		PrincipalHint::new(value).expect("Principal fixture should be valid.")
	}

	fn fresh(token: &str) -> Credential {
		Credential::new(token, OffsetDateTime::now_utc() + Duration::hours(1))
	}

	#[tokio::test]
	async fn principal_hints_stay_with_their_session() {
		let authority = Arc::new(
			ScriptedAuthority::new()
				.with_silent(Ok(fresh("T-alice").with_principal(hint("alice@contoso.example"))))
				.with_silent(Ok(fresh("T-bob")))
				.with_silent(Ok(fresh("T-alice-2"))),
		);
		let cache = Arc::new(MemoryCache::default());
		let manager =
			<TokenManager<ScriptedAuthority>>::new(authority.clone(), scope()).with_cache(cache.clone());
		let alice = session("s-alice");
		let bob = session("s-bob");

		manager.acquire(&alice).await.expect("Silent acquisition should succeed.");
		manager.acquire(&bob).await.expect("Silent acquisition should succeed.");
		cache
			.put(
				&alice,
				Credential::new("T-alice-old", OffsetDateTime::now_utc() - Duration::seconds(1))
					.with_principal(hint("alice@contoso.example")),
			)
			.await
			.expect("Memory cache writes never fail.");
		manager.acquire(&alice).await.expect("Silent refresh should succeed.");

		assert_eq!(
			authority.seen_principals(),
			vec![vec![], vec![], vec![hint("alice@contoso.example")]],
			"Bob must never be offered Alice's principal."
		);
	}

	#[tokio::test]
	async fn shared_principals_follow_the_session_hint() {
		let authority = Arc::new(ScriptedAuthority::new().with_silent(Ok(fresh("T1"))));
		let cache = Arc::new(MemoryCache::default());
		let manager = <TokenManager<ScriptedAuthority>>::new(authority.clone(), scope())
			.with_cache(cache.clone())
			.with_shared_principals([
				hint("ops@contoso.example"),
				hint("alice@contoso.example"),
				hint("ops@contoso.example"),
			]);
		let key = session("s-1");

		cache
			.put(
				&key,
				Credential::new("T0", OffsetDateTime::now_utc() - Duration::seconds(1))
					.with_principal(hint("alice@contoso.example")),
			)
			.await
			.expect("Memory cache writes never fail.");
		manager.acquire(&key).await.expect("Silent acquisition should succeed.");

		assert_eq!(manager.shared_principals().len(), 2);
		assert_eq!(
			authority.seen_principals(),
			vec![vec![hint("alice@contoso.example"), hint("ops@contoso.example")]]
		);
	}

	#[tokio::test]
	async fn silent_timeout_fails_without_interactive_fallback() {
		let authority = Arc::new(
			ScriptedAuthority::new()
				.with_delay(StdDuration::from_millis(200))
				.with_silent(Ok(fresh("late"))),
		);
		let manager = <TokenManager<ScriptedAuthority>>::new(authority.clone(), scope())
			.with_silent_timeout(StdDuration::from_millis(20));
		let err = manager
			.acquire(&session("s-timeout"))
			.await
			.expect_err("Silent acquisition past its bound must fail.");

		assert!(matches!(
			err,
			Error::AcquisitionFailed { stage: FlowKind::Silent, source: AuthorizationError::TimedOut }
		));
		assert_eq!(authority.interactive_calls(), 0);
	}

	#[tokio::test]
	async fn singleflight_guards_are_released_after_use() {
		let authority = Arc::new(ScriptedAuthority::new().with_silent(Ok(fresh("T1"))));
		let manager = <TokenManager<ScriptedAuthority>>::new(authority, scope())
			.with_cache(Arc::new(MemoryCache::default()));

		manager.acquire(&session("s-1")).await.expect("Silent acquisition should succeed.");

		assert_eq!(manager.pending_guards(), 0);
	}

	#[tokio::test]
	async fn cancelled_acquisitions_release_their_guards() {
		let authority = Arc::new(
			ScriptedAuthority::new()
				.with_delay(StdDuration::from_millis(200))
				.with_silent(Ok(fresh("T1")))
				.with_silent(Ok(fresh("T2")))
				.with_silent(Ok(fresh("T3")))
				.with_silent(Ok(fresh("T4")))
				.with_silent(Ok(fresh("T5"))),
		);
		let manager = <TokenManager<ScriptedAuthority>>::new(authority, scope())
			.with_cache(Arc::new(MemoryCache::default()));

		for i in 0..5 {
			let key = session(&format!("s-cancel-{i}"));
			let outcome =
				tokio::time::timeout(StdDuration::from_millis(50), manager.acquire(&key)).await;

			assert!(outcome.is_err(), "Acquisition should still be waiting on the authority.");
		}

		assert_eq!(manager.pending_guards(), 0);
	}

	#[tokio::test]
	async fn waiting_holder_keeps_the_guard_until_it_finishes() {
		let authority = Arc::new(
			ScriptedAuthority::new()
				.with_delay(StdDuration::from_millis(100))
				.with_silent(Ok(fresh("T1"))),
		);
		let manager = <TokenManager<ScriptedAuthority>>::new(authority.clone(), scope())
			.with_cache(Arc::new(MemoryCache::default()));
		let key = session("s-shared");
		let leader = {
			let manager = manager.clone();
			let key = key.clone();

			tokio::spawn(async move { manager.acquire(&key).await })
		};

		tokio::time::sleep(StdDuration::from_millis(20)).await;

		// A follower gives up while the leader still holds the slot.
		let follower =
			tokio::time::timeout(StdDuration::from_millis(10), manager.acquire(&key)).await;

		assert!(follower.is_err());
		assert_eq!(manager.pending_guards(), 1);

		leader
			.await
			.expect("Leader task should not panic.")
			.expect("Leader acquisition should succeed.");

		assert_eq!(manager.pending_guards(), 0);
		assert_eq!(authority.silent_calls(), 1);
	}

	#[tokio::test]
	async fn metrics_track_each_step() {
		let authority = Arc::new(
			ScriptedAuthority::new()
				.with_silent(Err(AuthorizationError::consent_required("no account")))
				.with_interactive(Ok(fresh("T2"))),
		);
		let manager = <TokenManager<ScriptedAuthority>>::new(authority, scope())
			.with_cache(Arc::new(MemoryCache::default()));
		let key = session("s-metrics");

		manager.acquire(&key).await.expect("Interactive fallback should succeed.");
		manager.acquire(&key).await.expect("Second call should hit the cache.");

		assert_eq!(manager.metrics.attempts(), 2);
		assert_eq!(manager.metrics.cache_hits(), 1);
		assert_eq!(manager.metrics.silent_calls(), 1);
		assert_eq!(manager.metrics.interactive_calls(), 1);
		assert_eq!(manager.metrics.successes(), 1);
		assert_eq!(manager.metrics.failures(), 0);
	}
}

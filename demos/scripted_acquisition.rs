//! Walks the token manager through its lifecycle with a scripted authority and an in-memory
//! cache: a cold start, a warm hit, and a recovery after the cached credential has expired.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use time::{Duration, OffsetDateTime};
// self
use bearer_broker::{
	auth::{Credential, ScopeSet, SessionKey},
	authority::{AuthorizationError, ScriptedAuthority},
	cache::{CredentialCache, MemoryCache},
	manager::TokenManager,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let now = OffsetDateTime::now_utc();
	let authority = Arc::new(
		ScriptedAuthority::new()
			.with_silent(Ok(Credential::new("T1", now + Duration::hours(1))))
			.with_silent(Err(AuthorizationError::consent_required("grant expired")))
			.with_interactive(Ok(Credential::new("T2", now + Duration::hours(1)))),
	);
	let cache = Arc::new(MemoryCache::default());
	let manager = <TokenManager<ScriptedAuthority>>::new(
		authority.clone(),
		ScopeSet::new(["https://org.example.com/user_impersonation"])?,
	)
	.with_cache(cache.clone());
	let session = SessionKey::generate();
	let cold = manager.acquire(&session).await?;
	let warm = manager.acquire(&session).await?;

	println!("cold start:  {cold:?}");
	println!("warm hit:    {warm:?} (calls so far: {})", authority.total_calls());

	cache.put(&session, Credential::new("T0", now - Duration::seconds(1))).await?;

	let recovered = manager.acquire(&session).await?;

	println!("after expiry: {recovered:?}");
	println!(
		"silent calls: {}, interactive calls: {}, cache hits: {}",
		authority.silent_calls(),
		authority.interactive_calls(),
		manager.metrics.cache_hits()
	);

	Ok(())
}

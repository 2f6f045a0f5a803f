//! Identity lookup composed from the token manager and the remote API client.

// self
use crate::{
	_prelude::*,
	api::RemoteApiClient,
	auth::{SessionKey, UserId},
	authority::AuthorizationCapability,
	cache::CredentialCache,
	manager::TokenManager,
	obs,
};

/// Resolves the signed-in user's identifier for a session.
pub struct UserIdService<A>
where
	A: ?Sized + AuthorizationCapability,
{
	/// Manager supplying credentials.
	pub manager: TokenManager<A>,
	/// Client for the remote data API.
	pub api: RemoteApiClient,
}
impl<A> UserIdService<A>
where
	A: ?Sized + AuthorizationCapability,
{
	/// Pairs a manager with a remote API client.
	pub fn new(manager: TokenManager<A>, api: RemoteApiClient) -> Self {
		Self { manager, api }
	}

	/// Fetches the user identifier using the manager's own cache.
	pub async fn fetch_user_id(&self, session: &SessionKey) -> Result<UserId> {
		self.fetch_user_id_with(session, self.manager.cache.as_deref()).await
	}

	/// Fetches the user identifier using a caller-provided (request-scoped) cache.
	///
	/// A failed remote call is returned as-is; the credential is not re-acquired within the
	/// same call.
	pub async fn fetch_user_id_with(
		&self,
		session: &SessionKey,
		cache: Option<&dyn CredentialCache>,
	) -> Result<UserId> {
		let credential = self.manager.acquire_with(session, cache).await?;
		let user_id = self.api.who_am_i(&credential).await?;

		obs::event!(debug, session = %session, user_id = %user_id, "Resolved user identity.");

		Ok(user_id)
	}
}
impl<A> Clone for UserIdService<A>
where
	A: ?Sized + AuthorizationCapability,
{
	fn clone(&self) -> Self {
		Self { manager: self.manager.clone(), api: self.api.clone() }
	}
}
impl<A> Debug for UserIdService<A>
where
	A: ?Sized + AuthorizationCapability,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserIdService")
			.field("manager", &self.manager)
			.field("api", &self.api)
			.finish()
	}
}

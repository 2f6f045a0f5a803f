//! HTTP surface exposing the identity lookup.
//!
//! The router serves `GET /api/{resource}/fetchUserId`. Each request is bound to a session
//! through the session cookie (minted on first contact). Depending on [`CacheMode`], the
//! credential is cached in a client-held cookie, in server memory, or not at all. Failures
//! answer `500` with a short plain-text reason that never carries token values.
//!
//! With the `tabular` feature the router also converts spreadsheets:
//! `POST /api/excel/read` takes XLSX bytes and answers the first sheet as a JSON grid, and
//! `POST /api/excel/export?filename=` takes a JSON grid and answers an XLSX attachment. Empty
//! input answers `400`; conversion failures answer `500`.

// crates.io
use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
#[cfg(feature = "tabular")]
use axum::{
	body::Bytes,
	extract::Query,
	http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
	routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
// self
use crate::{
	_prelude::*,
	auth::{SessionKey, UserId},
	authority::AuthorizationCapability,
	cache::{CachePut, CookieCache, CookieSettings, MemoryCache},
	obs,
	service::UserIdService,
};
#[cfg(feature = "tabular")] use crate::tabular::{self, Grid};

/// Path of the spreadsheet import route.
#[cfg(feature = "tabular")]
pub const EXCEL_READ_ROUTE: &str = "/api/excel/read";
/// Path of the spreadsheet export route.
#[cfg(feature = "tabular")]
pub const EXCEL_EXPORT_ROUTE: &str = "/api/excel/export";

/// Where credentials are cached between requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheMode {
	/// Client-held cookie slot (the default).
	#[default]
	Cookie,
	/// Server-side [`MemoryCache`] keyed by the session cookie.
	Server,
	/// No caching; every request acquires a credential.
	Disabled,
}

/// Options for the HTTP surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
	/// Resource segment of the route (`/api/{resource}/fetchUserId`).
	pub resource: String,
	/// Attributes of the credential cookie.
	pub credential_cookie: CookieSettings,
	/// Name of the session cookie.
	pub session_cookie: String,
	/// Cache strategy chosen at construction.
	pub cache_mode: CacheMode,
}
impl ServerConfig {
	/// Default resource segment.
	pub const DEFAULT_RESOURCE: &'static str = "dataverse";
	/// Default session cookie name.
	pub const DEFAULT_SESSION_COOKIE: &'static str = "session_id";

	/// Overrides the resource segment.
	pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = resource.into();

		self
	}

	/// Overrides the cache strategy.
	pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
		self.cache_mode = mode;

		self
	}

	/// Toggles the `Secure` attribute on both cookies (disable only for plain-HTTP development).
	pub fn with_secure_cookies(mut self, secure: bool) -> Self {
		self.credential_cookie.secure = secure;

		self
	}

	/// Path served by the identity route.
	pub fn route(&self) -> String {
		format!("/api/{}/fetchUserId", self.resource)
	}
}
impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			resource: Self::DEFAULT_RESOURCE.into(),
			credential_cookie: CookieSettings::default(),
			session_cookie: Self::DEFAULT_SESSION_COOKIE.into(),
			cache_mode: CacheMode::default(),
		}
	}
}

/// Shared state handed to every request.
pub struct AppState<A>
where
	A: ?Sized + AuthorizationCapability,
{
	/// Identity lookup service.
	pub service: UserIdService<A>,
	/// HTTP surface options.
	pub config: Arc<ServerConfig>,
}
impl<A> AppState<A>
where
	A: ?Sized + AuthorizationCapability,
{
	/// Builds the state; [`CacheMode::Server`] installs a [`MemoryCache`] when the manager has
	/// no cache yet.
	pub fn new(mut service: UserIdService<A>, config: ServerConfig) -> Self {
		if config.cache_mode == CacheMode::Server && service.manager.cache.is_none() {
			service.manager.cache = Some(Arc::new(MemoryCache::default()));
		}

		Self { service, config: Arc::new(config) }
	}
}
impl<A> Clone for AppState<A>
where
	A: ?Sized + AuthorizationCapability,
{
	fn clone(&self) -> Self {
		Self { service: self.service.clone(), config: self.config.clone() }
	}
}

/// JSON body returned on success.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdResponse {
	/// Identifier of the signed-in user.
	#[serde(rename = "UserId")]
	pub user_id: UserId,
}

/// Query string accepted by the export route.
#[cfg(feature = "tabular")]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExportQuery {
	/// Download name; blank or absent falls back to [`tabular::DEFAULT_FILENAME`].
	pub filename: Option<String>,
}

/// Builds the router serving the identity route (and the spreadsheet routes when enabled).
pub fn router<A>(state: AppState<A>) -> Router
where
	A: ?Sized + AuthorizationCapability,
{
	let route = state.config.route();
	let router = Router::new().route(&route, get(fetch_user_id::<A>));
	#[cfg(feature = "tabular")]
	let router = router
		.route(EXCEL_READ_ROUTE, post(read_spreadsheet))
		.route(EXCEL_EXPORT_ROUTE, post(export_spreadsheet));

	router.with_state(state)
}

async fn fetch_user_id<A>(State(state): State<AppState<A>>, jar: CookieJar) -> Response
where
	A: ?Sized + AuthorizationCapability,
{
	let config = &state.config;
	let (session, minted) = session_from(&jar, &config.session_cookie);
	let mut jar = jar;

	if minted {
		jar = jar.add(session_cookie(config, &session));
	}

	let result = match config.cache_mode {
		CacheMode::Cookie => {
			let inbound = jar.get(&config.credential_cookie.name).map(|c| c.value().to_owned());
			let cache =
				CookieCache::new(session.clone(), config.credential_cookie.clone(), inbound);
			let result = state.service.fetch_user_id_with(&session, Some(&cache)).await;

			if let Some(put) = cache.take_pending() {
				jar = jar.add(credential_cookie(put));
			}

			result
		},
		CacheMode::Server => state.service.fetch_user_id(&session).await,
		CacheMode::Disabled => state.service.fetch_user_id_with(&session, None).await,
	};

	match result {
		Ok(user_id) => (jar, Json(UserIdResponse { user_id })).into_response(),
		Err(e) => {
			obs::event!(error, session = %session, error = ?e, "Identity lookup failed.");

			(jar, (StatusCode::INTERNAL_SERVER_ERROR, e.public_message())).into_response()
		},
	}
}

#[cfg(feature = "tabular")]
async fn read_spreadsheet(body: Bytes) -> Response {
	if body.is_empty() {
		return (StatusCode::BAD_REQUEST, "No file uploaded.").into_response();
	}

	match tabular::import(&body) {
		Ok(grid) => Json(grid).into_response(),
		Err(e) => {
			obs::event!(error, error = %e, "Spreadsheet import failed.");

			(StatusCode::INTERNAL_SERVER_ERROR, e.public_message()).into_response()
		},
	}
}

#[cfg(feature = "tabular")]
async fn export_spreadsheet(
	Query(query): Query<ExportQuery>,
	Json(grid): Json<Grid>,
) -> Response {
	if grid.is_empty() {
		return (StatusCode::BAD_REQUEST, "No data provided.").into_response();
	}

	match tabular::export(&grid) {
		Ok(bytes) => {
			let headers = [
				(CONTENT_TYPE, tabular::CONTENT_TYPE.to_owned()),
				(CONTENT_DISPOSITION, attachment(query.filename.as_deref())),
			];

			(headers, bytes).into_response()
		},
		Err(e) => {
			obs::event!(error, error = %e, "Spreadsheet export failed.");

			(StatusCode::INTERNAL_SERVER_ERROR, e.public_message()).into_response()
		},
	}
}

#[cfg(feature = "tabular")]
fn attachment(filename: Option<&str>) -> String {
	let name = filename
		.unwrap_or_default()
		.chars()
		.filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
		.collect::<String>();
	let name = name.trim();
	let name = if name.is_empty() { tabular::DEFAULT_FILENAME } else { name };

	format!("attachment; filename=\"{name}\"")
}

fn session_from(jar: &CookieJar, name: &str) -> (SessionKey, bool) {
	match jar.get(name).map(|c| SessionKey::new(c.value())) {
		Some(Ok(session)) => (session, false),
		Some(Err(_e)) => {
			obs::event!(debug, error = %_e, "Ignoring malformed session cookie.");

			(SessionKey::generate(), true)
		},
		None => (SessionKey::generate(), true),
	}
}

fn session_cookie(config: &ServerConfig, session: &SessionKey) -> Cookie<'static> {
	Cookie::build((config.session_cookie.clone(), String::from(session.clone())))
		.http_only(true)
		.secure(config.credential_cookie.secure)
		.same_site(SameSite::Lax)
		.path("/")
		.build()
}

fn credential_cookie(put: CachePut) -> Cookie<'static> {
	let pending = put.cookie;

	Cookie::build((pending.name, pending.value))
		.http_only(pending.http_only)
		.secure(pending.secure)
		.same_site(SameSite::Lax)
		.path(pending.path)
		.expires(pending.expires)
		.build()
}

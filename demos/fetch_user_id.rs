//! Serves the identity route against a mocked data API and calls it twice with the same cookie
//! jar, showing the credential cookie being issued on the first request and reused on the second.
//!
//! Run with `RUST_LOG=bearer_broker=debug` to see the acquisition spans.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
use tracing_subscriber::EnvFilter;
// self
use bearer_broker::{
	api::RemoteApiClient,
	auth::{ClientId, Credential, PrincipalHint, ScopeSet},
	authority::{AuthorizationError, ScriptedAuthority},
	descriptor::ServiceDescriptor,
	manager::TokenManager,
	reqwest::{Client, header},
	server::{self, AppState, ServerConfig},
	service::UserIdService,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let remote = MockServer::start_async().await;
	let who_am_i = remote
		.mock_async(|when, then| {
			when.method(GET).path("/api/data/v9.2/WhoAmI").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"UserId\":\"3fa85f64-5717-4562-b3fc-2c963f66afa6\"}");
		})
		.await;
	let descriptor = ServiceDescriptor::builder(ClientId::new("demo-client")?)
		.authority(Url::parse("https://login.example.com/organizations")?)
		.redirect_uri(Url::parse("http://localhost")?)
		.scope(ScopeSet::new(["https://org.example.com/user_impersonation"])?)
		.api_base(Url::parse(&remote.url("/api/data/v9.2"))?)
		.build()?;
	let registration = descriptor.authority_config();

	println!(
		"authority: {} (redirect {}, {} scope(s))",
		registration.authority,
		registration.redirect_uri,
		registration.scope.len()
	);

	// First visit: no account is cached yet, so consent is collected interactively.
	let authority = Arc::new(
		ScriptedAuthority::new()
			.with_silent(Err(AuthorizationError::consent_required("no cached account")))
			.with_interactive(Ok(Credential::new(
				"demo-access",
				OffsetDateTime::now_utc() + Duration::hours(1),
			)
			.with_principal(PrincipalHint::new("alice@contoso.example")?))),
	);
	let manager = <TokenManager<ScriptedAuthority>>::from_descriptor(authority.clone(), &descriptor);
	let api = RemoteApiClient::from_descriptor(&descriptor)?;
	let state = AppState::new(
		UserIdService::new(manager, api),
		ServerConfig::default().with_secure_cookies(false),
	);
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
	let address = listener.local_addr()?;
	let app = server::router(state);

	tokio::spawn(async move { axum::serve(listener, app).await });

	let endpoint = format!("http://{address}{}", ServerConfig::default().route());
	let client = Client::new();
	let first = client.get(&endpoint).send().await?;
	let cookies = first
		.headers()
		.get_all(header::SET_COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.filter_map(|cookie| cookie.split(';').next())
		.collect::<Vec<_>>()
		.join("; ");

	println!("first:  {} {}", first.status(), first.text().await?);

	let second = client.get(&endpoint).header(header::COOKIE, cookies).send().await?;

	println!("second: {} {}", second.status(), second.text().await?);
	println!(
		"authority calls: silent={}, interactive={}",
		authority.silent_calls(),
		authority.interactive_calls()
	);

	who_am_i.assert_calls_async(2).await;

	Ok(())
}

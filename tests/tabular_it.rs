#![cfg(all(feature = "server", feature = "tabular"))]

// std
use std::sync::Arc;
// crates.io
use axum::{
	Router,
	body::{self, Body, Bytes},
	http::{Request, Response, StatusCode, header},
};
use tower::ServiceExt;
// self
use bearer_broker::{
	api::RemoteApiClient,
	auth::ScopeSet,
	authority::ScriptedAuthority,
	manager::TokenManager,
	server::{self, AppState, EXCEL_EXPORT_ROUTE, EXCEL_READ_ROUTE, ServerConfig},
	service::UserIdService,
	tabular,
	url::Url,
};

fn app() -> Router {
	let scope = ScopeSet::new(["https://org.example.com/user_impersonation"])
		.expect("Scope fixture should be valid.");
	let manager =
		<TokenManager<ScriptedAuthority>>::new(Arc::new(ScriptedAuthority::new()), scope);
	let api = RemoteApiClient::with_client(
		bearer_broker::reqwest::Client::new(),
		Url::parse("http://127.0.0.1:9/api/").expect("API base fixture should parse."),
	);

	server::router(AppState::new(UserIdService::new(manager, api), ServerConfig::default()))
}

fn export_request(query: &str, grid: &str) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(format!("{EXCEL_EXPORT_ROUTE}{query}"))
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(grid.to_owned()))
		.expect("Request fixture should build.")
}

fn read_request(bytes: impl Into<Bytes>) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(EXCEL_READ_ROUTE)
		.header(header::CONTENT_TYPE, tabular::CONTENT_TYPE)
		.body(Body::from(bytes.into()))
		.expect("Request fixture should build.")
}

async fn body_bytes(response: Response<Body>) -> Bytes {
	body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.")
}

fn header_value<'a>(response: &'a Response<Body>, name: header::HeaderName) -> &'a str {
	response
		.headers()
		.get(name)
		.and_then(|value| value.to_str().ok())
		.expect("Header should be present.")
}

#[tokio::test]
async fn exported_workbook_reads_back_as_the_same_grid() {
	let app = app();
	let grid = r#"[["Name","Count"],["alice","42"],["bob","7"]]"#;
	let exported = app
		.clone()
		.oneshot(export_request("?filename=report.xlsx", grid))
		.await
		.expect("Router should answer.");

	assert_eq!(exported.status(), StatusCode::OK);
	assert_eq!(header_value(&exported, header::CONTENT_TYPE), tabular::CONTENT_TYPE);
	assert_eq!(
		header_value(&exported, header::CONTENT_DISPOSITION),
		"attachment; filename=\"report.xlsx\""
	);

	let workbook = body_bytes(exported).await;
	let read = app.oneshot(read_request(workbook)).await.expect("Router should answer.");

	assert_eq!(read.status(), StatusCode::OK);

	let parsed = serde_json::from_slice::<Vec<Vec<String>>>(&body_bytes(read).await)
		.expect("Read route should answer a JSON grid.");

	assert_eq!(parsed, serde_json::from_str::<Vec<Vec<String>>>(grid).expect("Grid fixture."));
}

#[tokio::test]
async fn export_without_filename_uses_default_name() {
	let response =
		app().oneshot(export_request("", r#"[["only"]]"#)).await.expect("Router should answer.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		header_value(&response, header::CONTENT_DISPOSITION),
		"attachment; filename=\"export.xlsx\""
	);
}

#[tokio::test]
async fn empty_inputs_are_rejected_with_400() {
	let app = app();
	let read = app.clone().oneshot(read_request(Bytes::new())).await.expect("Router should answer.");

	assert_eq!(read.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_bytes(read).await, "No file uploaded.");

	let export = app.oneshot(export_request("", "[]")).await.expect("Router should answer.");

	assert_eq!(export.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_bytes(export).await, "No data provided.");
}

#[tokio::test]
async fn unreadable_workbook_answers_500() {
	let response = app()
		.oneshot(read_request(&b"not a spreadsheet"[..]))
		.await
		.expect("Router should answer.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body_bytes(response).await, "Spreadsheet conversion failed.");
}

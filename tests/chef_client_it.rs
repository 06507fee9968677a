// std
use std::{collections::BTreeMap, sync::Arc};
// crates.io
use httpmock::prelude::*;
// self
use chef_api::{
	auth::{FixedClock, HeaderSet},
	connection::ConnectionContext,
	error::{Error, TransportError},
	http::{ChefClient, response_body},
};

const KEY_PEM: &str = include_str!("fixtures/client.pem");
const TIMESTAMP: &str = "2024-01-02T15:04:05Z";

fn context(server: &MockServer) -> ConnectionContext {
	let clock = FixedClock::parse(TIMESTAMP).expect("Timestamp fixture should parse.");

	ConnectionContext::connect_url(
		&server.url("/organizations/test"),
		"12.0.0",
		"tester",
		KEY_PEM,
	)
	.expect("Mock server context should build.")
	.with_clock(Arc::new(clock))
}

fn expected_headers(ctx: &ConnectionContext, method: &str, path: &str, body: &str) -> HeaderSet {
	ctx.headers(method, path, body).expect("Expected headers should sign.")
}

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
	pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
}

#[tokio::test]
async fn get_carries_every_signed_header() {
	let server = MockServer::start_async().await;
	let ctx = context(&server);
	let expected = expected_headers(&ctx, "GET", "/organizations/test/nodes", "");
	let mock = server
		.mock_async(|when, then| {
			let mut when = when.method(GET).path("/organizations/test/nodes");

			for (name, value) in &expected {
				when = when.header(name.to_ascii_lowercase(), value.clone());
			}

			then.status(200).header("content-type", "application/json").body("{\"web01\":\"\"}");
		})
		.await;
	let client = ChefClient::new(ctx).expect("Client should build.");
	let response = client.get("nodes").await.expect("GET should dispatch.");
	let body = response_body(response).await.expect("2xx body should be returned.");

	mock.assert_async().await;

	assert_eq!(body, b"{\"web01\":\"\"}");
}

#[tokio::test]
async fn get_params_travel_in_the_query() {
	let server = MockServer::start_async().await;
	let ctx = context(&server);
	let content_hash = expected_headers(&ctx, "GET", "/organizations/test/search/node", "")
		.get("x-ops-content-hash")
		.map(ToOwned::to_owned)
		.expect("Content hash should be present.");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/organizations/test/search/node")
				.query_param("q", "role:web")
				.query_param("rows", "10")
				.header("x-ops-content-hash", content_hash.as_str());
			then.status(200).body("{}");
		})
		.await;
	let client = ChefClient::new(ctx).expect("Client should build.");
	let response = client
		.get_with_params("search/node", &params(&[("rows", "10"), ("q", "role:web")]))
		.await
		.expect("GET should dispatch.");

	mock.assert_async().await;

	assert!(response.status().is_success());
}

#[tokio::test]
async fn post_sends_the_signed_form_body() {
	let server = MockServer::start_async().await;
	let ctx = context(&server);
	let expected = expected_headers(&ctx, "POST", "/organizations/test/roles", "name=web&run=1");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/organizations/test/roles")
				.header("content-type", "application/x-www-form-urlencoded")
				.header(
					"x-ops-content-hash",
					expected.get("x-ops-content-hash").expect("Content hash should be present."),
				)
				.header("x-ops-authorization-1", expected.authorization_lines()[0])
				.body("name=web&run=1");
			then.status(201).body("{\"uri\":\"roles/web\"}");
		})
		.await;
	let client = ChefClient::new(ctx).expect("Client should build.");
	let response = client
		.post("roles", &params(&[("run", "1"), ("name", "web")]))
		.await
		.expect("POST should dispatch.");

	mock.assert_async().await;

	assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn non_success_statuses_become_http_status_errors() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/organizations/test/nodes/missing");
			then.status(404).body("{\"error\":[\"not found\"]}");
		})
		.await;
	let client = ChefClient::new(context(&server)).expect("Client should build.");
	let response =
		client.delete("nodes/missing", &BTreeMap::new()).await.expect("DELETE should dispatch.");
	let err = response_body(response).await.expect_err("404 should surface as an error.");

	mock.assert_async().await;

	assert!(matches!(err, Error::HttpStatus { status: 404, ref text } if text == "Not Found"));
}

#[tokio::test]
async fn put_reaches_the_server_with_skip_verify_clients() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(PUT).path("/organizations/test/nodes/web01").body("env=prod");
			then.status(200).body("{}");
		})
		.await;
	let client = ChefClient::new(context(&server).with_tls_skip_verify(true))
		.expect("Client should build.");
	let response = client
		.put("/nodes/web01", &params(&[("env", "prod")]))
		.await
		.expect("PUT should dispatch.");

	mock.assert_async().await;

	assert!(client.context().tls_skip_verify);
	assert!(response_body(response).await.is_ok());
}

#[tokio::test]
async fn unreachable_servers_surface_transport_errors() {
	let ctx = ConnectionContext::connect_url("http://127.0.0.1:1", "12.0.0", "tester", KEY_PEM)
		.expect("Context should build.");
	let client = ChefClient::new(ctx).expect("Client should build.");
	let err = client.get("nodes").await.expect_err("Closed port should fail.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
}

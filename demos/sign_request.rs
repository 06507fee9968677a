//! Demonstrates signing a Chef server request against a mock server, printing the X-Ops
//! headers the server would verify.

// std
use std::collections::BTreeMap;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use chef_api::{
	connection::ConnectionContext,
	http::{ChefClient, response_body},
	reqwest::Method,
};

const KEY_PEM: &str = include_str!("../tests/fixtures/client.pem");

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let nodes_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/organizations/demo/nodes")
				.header_exists("x-ops-authorization-1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"web01\":\"https://chef.example.com/organizations/demo/nodes/web01\"}");
		})
		.await;
	let context = ConnectionContext::connect_url(
		&server.url("/organizations/demo"),
		"12.0.0",
		"demo-client",
		KEY_PEM,
	)?;
	let client = ChefClient::new(context)?;
	let preview = client.generate_request(Method::GET, "nodes", &BTreeMap::new())?;

	for (name, value) in preview.headers() {
		println!("{name}: {}", value.to_str()?);
	}

	let body = response_body(client.execute(preview).await?).await?;

	println!("Nodes: {}.", String::from_utf8_lossy(&body));

	nodes_mock.assert_async().await;

	Ok(())
}

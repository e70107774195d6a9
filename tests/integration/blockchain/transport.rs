use mockito::{Matcher, Server};
use serde_json::json;

use router_watcher::{
	services::blockchain::{
		BlockchainTransport, ChainClient, EvmClient, HttpTransportClient, TransportError,
	},
	utils::tests::{builders::chain::ChainConfigBuilder, create_no_retry_http_client},
};

fn chain_with_endpoints(primary: &str, fallback: Option<&str>) -> router_watcher::models::ChainConfig {
	let mut builder = ChainConfigBuilder::new()
		.rpc_urls(vec![])
		.add_rpc_url(primary, "rpc", 100);
	if let Some(fallback) = fallback {
		builder = builder.add_rpc_url(fallback, "rpc", 50);
	}
	builder.build()
}

#[tokio::test]
async fn test_send_raw_request_posts_json_rpc() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({
			"jsonrpc": "2.0",
			"method": "eth_blockNumber",
			"params": []
		})))
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#)
		.create_async()
		.await;

	let chain = chain_with_endpoints(&server.url(), None);
	let transport = HttpTransportClient::new_with_client(&chain, create_no_retry_http_client()).unwrap();

	let response = transport.send_raw_request("eth_blockNumber", None).await.unwrap();
	assert_eq!(response["result"], "0x10");
	mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limited_endpoint_rotates_to_fallback() {
	let mut primary = Server::new_async().await;
	let mut fallback = Server::new_async().await;

	let limited = primary
		.mock("POST", "/")
		.with_status(429)
		.expect(1)
		.create_async()
		.await;
	let served = fallback
		.mock("POST", "/")
		.with_status(200)
		.with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x38"}"#)
		.expect(1)
		.create_async()
		.await;

	let chain = chain_with_endpoints(&primary.url(), Some(&fallback.url()));
	let transport = HttpTransportClient::new_with_client(&chain, create_no_retry_http_client()).unwrap();

	assert_eq!(transport.get_current_url().await, primary.url());
	let response = transport.send_raw_request("eth_chainId", None).await.unwrap();

	assert_eq!(response["result"], "0x38");
	assert_eq!(transport.get_current_url().await, fallback.url());
	limited.assert_async().await;
	served.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_not_rotated() {
	let mut primary = Server::new_async().await;
	let mut fallback = Server::new_async().await;

	primary
		.mock("POST", "/")
		.with_status(500)
		.with_body("boom")
		.create_async()
		.await;
	let untouched = fallback
		.mock("POST", "/")
		.expect(0)
		.create_async()
		.await;

	let chain = chain_with_endpoints(&primary.url(), Some(&fallback.url()));
	let transport = HttpTransportClient::new_with_client(&chain, create_no_retry_http_client()).unwrap();

	let result = transport.send_raw_request("eth_chainId", None).await;
	match result {
		Err(TransportError::Http { status_code, body, .. }) => {
			assert_eq!(status_code.as_u16(), 500);
			assert_eq!(body, "boom");
		}
		other => panic!("expected HTTP error, got {:?}", other),
	}
	assert_eq!(transport.get_current_url().await, primary.url());
	untouched.assert_async().await;
}

#[tokio::test]
async fn test_all_endpoints_rate_limited() {
	let mut primary = Server::new_async().await;
	let mut fallback = Server::new_async().await;
	primary.mock("POST", "/").with_status(429).create_async().await;
	fallback.mock("POST", "/").with_status(429).create_async().await;

	let chain = chain_with_endpoints(&primary.url(), Some(&fallback.url()));
	let transport = HttpTransportClient::new_with_client(&chain, create_no_retry_http_client()).unwrap();

	assert!(matches!(
		transport.send_raw_request("eth_chainId", None).await,
		Err(TransportError::Http { .. })
	));
}

#[tokio::test]
async fn test_invalid_json_response() {
	let mut server = Server::new_async().await;
	server
		.mock("POST", "/")
		.with_status(200)
		.with_body("not json")
		.create_async()
		.await;

	let chain = chain_with_endpoints(&server.url(), None);
	let transport = HttpTransportClient::new_with_client(&chain, create_no_retry_http_client()).unwrap();

	assert!(matches!(
		transport.send_raw_request("eth_chainId", None).await,
		Err(TransportError::ResponseParse(_))
	));
}

#[tokio::test]
async fn test_evm_client_over_http() {
	let mut server = Server::new_async().await;
	server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "eth_getBlockByNumber"})))
		.with_status(200)
		.with_body(
			json!({
				"jsonrpc": "2.0",
				"id": 1,
				"result": {
					"number": "0x3039",
					"timestamp": "0x6500",
					"transactions": []
				}
			})
			.to_string(),
		)
		.create_async()
		.await;
	server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "eth_chainId"})))
		.with_status(200)
		.with_body(r#"{"jsonrpc":"2.0","id":2,"result":"0x2105"}"#)
		.create_async()
		.await;

	let chain = chain_with_endpoints(&server.url(), None);
	let transport = HttpTransportClient::new_with_client(&chain, create_no_retry_http_client()).unwrap();
	let client = EvmClient::new_with_transport(transport);

	assert_eq!(client.get_chain_id().await.unwrap(), 8453);
	let block = client.get_block_by_number(Some(12345)).await.unwrap();
	assert_eq!(block.number(), Some(12345));
	assert!(block.transactions.is_empty());
}

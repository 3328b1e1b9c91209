//! JSON-RPC faucet contract against an in-process mock node

use axum::{extract::State, routing::post, Json, Router};
use claim_faucet::address::Address;
use claim_faucet::contract::{encode_claim_funds, FaucetSigner, RpcContractConnector};
use claim_faucet::{ClaimDispatcher, ContractConnector, FaucetError, NetworkConfig, NetworkRegistry};
use ethabi::Token;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PRIVATE_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";
const CHAIN_ID: u64 = 31337;

#[derive(Default)]
struct MockNode {
    calls: Mutex<Vec<String>>,
    raw_txs: Mutex<Vec<String>>,
    receipt_polls: AtomicUsize,
    /// Receipt lookups answered with `null` before the transaction is mined
    pending_polls: usize,
    receipt_status: &'static str,
    estimate_revert: Option<String>,
    estimate_unsupported: bool,
}

fn revert_data(reason: &str) -> String {
    let mut bytes = vec![0x08, 0xc3, 0x79, 0xa0];
    bytes.extend(ethabi::encode(&[Token::String(reason.to_string())]));
    format!("0x{}", hex::encode(bytes))
}

fn rpc_error(id: Value, code: i64, message: &str, data: Option<String>) -> Json<Value> {
    Json(json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message, "data": data }
    }))
}

async fn rpc_handler(State(node): State<Arc<MockNode>>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default().to_string();

    let result = match method.as_str() {
        "eth_getTransactionCount" => json!("0x7"),
        "eth_gasPrice" => json!("0x3b9aca00"),
        "eth_estimateGas" => {
            if let Some(reason) = &node.estimate_revert {
                node.calls.lock().unwrap().push(method.clone());
                return rpc_error(id, 3, "execution reverted", Some(revert_data(reason)));
            }
            if node.estimate_unsupported {
                node.calls.lock().unwrap().push(method.clone());
                return rpc_error(id, -32601, "the method eth_estimateGas does not exist", None);
            }
            json!("0x15f90")
        }
        "eth_sendRawTransaction" => {
            let raw = request["params"][0].as_str().unwrap_or_default().to_string();
            node.raw_txs.lock().unwrap().push(raw);
            json!(TX_HASH)
        }
        "eth_getTransactionReceipt" => {
            let poll = node.receipt_polls.fetch_add(1, Ordering::SeqCst) + 1;
            if poll <= node.pending_polls {
                node.calls.lock().unwrap().push(format!("{}:pending", method));
                return Json(json!({ "jsonrpc": "2.0", "id": id, "result": null }));
            }
            node.calls.lock().unwrap().push(format!("{}:mined", method));
            return Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": { "transactionHash": TX_HASH, "status": node.receipt_status }
            }));
        }
        _ => return rpc_error(id, -32601, "method not found", None),
    };

    node.calls.lock().unwrap().push(method.clone());
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

async fn spawn_node(node: Arc<MockNode>) -> String {
    let app = Router::new().route("/", post(rpc_handler)).with_state(node);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn contract_address() -> Address {
    Address::from_slice(&[0xfa; 20])
}

fn local_network(rpc_url: String) -> NetworkConfig {
    NetworkConfig {
        chain_id: CHAIN_ID,
        name: "local".to_string(),
        rpc_url,
        contract_address: Some(format!("0x{}", "fa".repeat(20))),
        contract_address_env: None,
    }
}

fn connector() -> RpcContractConnector {
    let signer = Arc::new(FaucetSigner::from_hex(PRIVATE_KEY).unwrap());
    RpcContractConnector::new(signer, None).with_poll_interval(Duration::from_millis(10))
}

fn mock_node() -> MockNode {
    MockNode {
        pending_polls: 2,
        receipt_status: "0x1",
        ..Default::default()
    }
}

#[tokio::test]
async fn test_claim_submits_signed_transaction() {
    let node = Arc::new(mock_node());
    let url = spawn_node(node.clone()).await;
    let recipient = Address::from_slice(&[0x11; 20]);

    let contract = connector().connect(&local_network(url), contract_address()).unwrap();
    let handle = contract.claim_funds(recipient).await.unwrap();
    assert_eq!(handle.id, TX_HASH);

    let raw_txs = node.raw_txs.lock().unwrap().clone();
    assert_eq!(raw_txs.len(), 1);
    let bytes = hex::decode(raw_txs[0].trim_start_matches("0x")).unwrap();
    let tx = rlp::Rlp::new(&bytes);

    assert_eq!(tx.val_at::<u64>(0).unwrap(), 7);
    assert_eq!(tx.val_at::<u64>(1).unwrap(), 1_000_000_000);
    assert_eq!(tx.val_at::<u64>(2).unwrap(), 90_000);
    assert_eq!(tx.val_at::<Vec<u8>>(3).unwrap(), vec![0xfa; 20]);
    assert!(tx.val_at::<Vec<u8>>(4).unwrap().is_empty());
    assert_eq!(tx.val_at::<Vec<u8>>(5).unwrap(), encode_claim_funds(recipient));
    let v: u64 = tx.val_at(6).unwrap();
    assert!(v == CHAIN_ID * 2 + 35 || v == CHAIN_ID * 2 + 36);

    handle.wait_for_confirmation().await.unwrap();
    assert_eq!(node.receipt_polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_estimate_revert_reason_is_reported() {
    let node = Arc::new(MockNode {
        estimate_revert: Some("Faucet: too soon".to_string()),
        ..mock_node()
    });
    let url = spawn_node(node.clone()).await;

    let contract = connector().connect(&local_network(url), contract_address()).unwrap();
    let err = contract
        .claim_funds(Address::from_slice(&[0x22; 20]))
        .await
        .unwrap_err();

    assert_eq!(err.best_reason(), "Faucet: too soon");
    assert!(node.raw_txs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_estimate_unsupported_uses_fallback_gas_limit() {
    let node = Arc::new(MockNode {
        estimate_unsupported: true,
        ..mock_node()
    });
    let url = spawn_node(node.clone()).await;

    let contract = connector().connect(&local_network(url), contract_address()).unwrap();
    contract.claim_funds(Address::from_slice(&[0x33; 20])).await.unwrap();

    let raw = node.raw_txs.lock().unwrap()[0].clone();
    let bytes = hex::decode(raw.trim_start_matches("0x")).unwrap();
    assert_eq!(rlp::Rlp::new(&bytes).val_at::<u64>(2).unwrap(), 100_000);
}

#[tokio::test]
async fn test_reverted_receipt_fails_confirmation() {
    let node = Arc::new(MockNode {
        pending_polls: 0,
        receipt_status: "0x0",
        ..Default::default()
    });
    let url = spawn_node(node.clone()).await;

    let contract = connector().connect(&local_network(url), contract_address()).unwrap();
    let handle = contract.claim_funds(Address::from_slice(&[0x44; 20])).await.unwrap();

    let err = handle.wait_for_confirmation().await.unwrap_err();
    assert_eq!(err.best_reason(), "transaction reverted");
}

#[tokio::test]
async fn test_unreachable_node_is_claim_error() {
    let network = local_network("http://127.0.0.1:1".to_string());
    let dispatcher = ClaimDispatcher::new(NetworkRegistry::new([network]), Arc::new(connector()));

    let err = dispatcher
        .submit(Address::from_slice(&[0x55; 20]), CHAIN_ID)
        .await
        .unwrap_err();

    assert!(matches!(err, FaucetError::Claim(ref reason) if reason.starts_with("Request failed")));
}

#[tokio::test]
async fn test_dispatcher_waits_for_receipt_between_claims() {
    let node = Arc::new(MockNode {
        pending_polls: 1,
        ..mock_node()
    });
    let url = spawn_node(node.clone()).await;
    let dispatcher = ClaimDispatcher::new(
        NetworkRegistry::new([local_network(url)]),
        Arc::new(connector()),
    );

    let (first, second) = tokio::join!(
        dispatcher.submit(Address::from_slice(&[0x66; 20]), CHAIN_ID),
        dispatcher.submit(Address::from_slice(&[0x77; 20]), CHAIN_ID)
    );
    assert_eq!(first.unwrap().transaction_id, TX_HASH);
    assert_eq!(second.unwrap().transaction_id, TX_HASH);

    let calls = node.calls.lock().unwrap().clone();
    let nonce_lookups: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| c.as_str() == "eth_getTransactionCount")
        .map(|(i, _)| i)
        .collect();
    let first_mined = calls
        .iter()
        .position(|c| c == "eth_getTransactionReceipt:mined")
        .unwrap();

    assert_eq!(nonce_lookups.len(), 2);
    assert!(nonce_lookups[0] < first_mined);
    assert!(first_mined < nonce_lookups[1]);
}

// tests/chain_tests.rs
use daisy_chain::metrics::MetricsRegistry;
use daisy_chain::node::{ChainNode, LookupResponse, MemoryStore, Role, REQUEST_ID_HEADER};
use daisy_chain::parent::ParentClient;
use daisy_chain::server::{bind_tcp, RequestHandler, ServerBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Boot a node on an ephemeral loopback port and return its address.
async fn spawn_node(role: Role, parent: Option<SocketAddr>) -> SocketAddr {
    let listener = bind_tcp("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let parent = parent.map(|p| ParentClient::new(p, Duration::from_secs(2)).unwrap());
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let node = ChainNode::new(role, addr, Arc::new(MemoryStore::new(role.as_str())), parent)
        .with_metrics(metrics);
    node.init();

    let server = ServerBuilder::new(addr)
        .with_listener(listener)
        .with_handler(RequestHandler::new(Arc::new(node)));
    tokio::spawn(server.serve());

    addr
}

/// root(one) <- middle(two) <- leaf(three)
async fn spawn_chain() -> (SocketAddr, SocketAddr, SocketAddr) {
    let root = spawn_node(Role::One, None).await;
    let middle = spawn_node(Role::Two, Some(root)).await;
    let leaf = spawn_node(Role::Three, Some(middle)).await;
    (root, middle, leaf)
}

async fn lookup(addr: SocketAddr, value: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("http://{}/", addr))
        .query(&[("value", value)])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_leaf_answers_its_own_keys() {
    let (_, _, leaf) = spawn_chain().await;

    let body: LookupResponse = lookup(leaf, "a").await.json().await.unwrap();

    assert_eq!(body.url, leaf.to_string());
    assert_eq!(body.value, "a value");
}

#[tokio::test]
async fn test_lookup_walks_up_the_chain() {
    let (_, _, leaf) = spawn_chain().await;

    let from_middle: LookupResponse = lookup(leaf, "b").await.json().await.unwrap();
    let from_root: LookupResponse = lookup(leaf, "c").await.json().await.unwrap();

    assert_eq!(from_middle.value, "b value");
    assert_eq!(from_root.value, "c value");
    // The answering node always reports itself, not the node that held the key.
    assert_eq!(from_root.url, leaf.to_string());
}

#[tokio::test]
async fn test_key_missing_everywhere_is_empty() {
    let (_, _, leaf) = spawn_chain().await;

    let response = lookup(leaf, "d").await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "URL": leaf.to_string(), "Value": "" }));
}

#[tokio::test]
async fn test_bad_value_is_rejected() {
    let (_, _, leaf) = spawn_chain().await;

    assert_eq!(lookup(leaf, "ab").await.status(), 400);

    let missing = reqwest::get(format!("http://{}/", leaf)).await.unwrap();
    assert_eq!(missing.status(), 400);
    let body: serde_json::Value = missing.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_dead_parent_is_bad_gateway() {
    // Bind then drop to get a port nobody listens on.
    let dead = {
        let listener = bind_tcp("127.0.0.1:0".parse().unwrap()).await.unwrap();
        listener.local_addr().unwrap()
    };
    let orphan = spawn_node(Role::Three, Some(dead)).await;

    assert_eq!(lookup(orphan, "a").await.status(), 200);
    assert_eq!(lookup(orphan, "b").await.status(), 502);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (_, _, leaf) = spawn_chain().await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/", leaf))
        .query(&[("value", "c")])
        .header(REQUEST_ID_HEADER, "trace-42")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-42");
}

#[tokio::test]
async fn test_health_and_metrics_endpoints() {
    let (root, _, leaf) = spawn_chain().await;
    lookup(leaf, "c").await;

    let health = reqwest::get(format!("http://{}/health", root)).await.unwrap();
    assert_eq!(health.status(), 200);
    assert_eq!(health.text().await.unwrap(), "OK");

    let metrics = reqwest::get(format!("http://{}/metrics", leaf))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains(r#"chain_lookups_total{outcome="parent_hit"} 1"#));
    assert!(metrics.contains(r#"chain_parent_requests_total{status="success"} 1"#));
    assert!(metrics.contains("chain_store_entries 1"));
}

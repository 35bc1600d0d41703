#![allow(clippy::unwrap_used)]
// Integration tests for `ZabbixClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use macrosync_api::{Error, HostMacro, MacroType, TransportConfig, ZabbixClient};

// ── Helpers ─────────────────────────────────────────────────────────

const RPC_PATH: &str = "/api_jsonrpc.php";

async fn setup() -> (MockServer, ZabbixClient) {
    let server = MockServer::start().await;
    let token = SecretString::from("zbx-token".to_string());
    let client = ZabbixClient::new(&server.uri(), &token, &TransportConfig::default()).unwrap();
    (server, client)
}

fn rpc_ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": 1
    }))
}

// ── Endpoint handling ───────────────────────────────────────────────

#[test]
fn test_endpoint_normalization() {
    let c = ZabbixClient::with_client("https://zbx.example.com/zabbix", reqwest::Client::new())
        .unwrap();
    assert_eq!(
        c.endpoint().as_str(),
        "https://zbx.example.com/zabbix/api_jsonrpc.php"
    );

    let c = ZabbixClient::with_client(
        "https://zbx.example.com/api_jsonrpc.php",
        reqwest::Client::new(),
    )
    .unwrap();
    assert_eq!(c.endpoint().as_str(), "https://zbx.example.com/api_jsonrpc.php");
}

// ── Macro tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_host_macros() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(header("Authorization", "Bearer zbx-token"))
        .and(body_partial_json(json!({
            "method": "host.get",
            "params": {"hostids": ["10084"], "selectMacros": "extend"}
        })))
        .respond_with(rpc_ok(json!([{
            "hostid": "10084",
            "macros": [
                {"hostmacroid": "1", "macro": "{$A}", "value": "1", "type": "0", "description": "keep"},
                {"hostmacroid": "2", "macro": "{$S}", "type": "1", "description": ""}
            ]
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let macros = client.get_host_macros("10084").await.unwrap();

    assert_eq!(macros.len(), 2);
    assert_eq!(macros[0].name, "{$A}");
    assert_eq!(macros[0].description, "keep");
    assert_eq!(macros[1].macro_type, MacroType::Secret);
    assert_eq!(macros[0].hostmacroid.as_deref(), Some("1"));
    assert_eq!(macros[1].value, None);
}

#[tokio::test]
async fn test_get_host_macros_unknown_host() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(rpc_ok(json!([])))
        .mount(&server)
        .await;

    let err = client.get_host_macros("404").await.unwrap_err();
    assert!(err.is_not_found(), "got: {err:?}");
}

#[tokio::test]
async fn test_set_host_macros_sends_full_set() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_partial_json(json!({
            "method": "host.update",
            "params": {
                "hostid": "10084",
                "macros": [
                    {"macro": "{$A}", "value": "2", "type": "0", "description": "Updated"},
                    {"macro": "{$B}", "value": "x", "type": "2", "description": ""}
                ]
            }
        })))
        .respond_with(rpc_ok(json!({"hostids": ["10084"]})))
        .expect(1)
        .mount(&server)
        .await;

    let macros = vec![
        HostMacro {
            hostmacroid: None,
            name: "{$A}".into(),
            value: Some("2".into()),
            macro_type: MacroType::Text,
            description: "Updated".into(),
        },
        HostMacro {
            hostmacroid: None,
            name: "{$B}".into(),
            value: Some("x".into()),
            macro_type: MacroType::Vault,
            description: String::new(),
        },
    ];
    client.set_host_macros("10084", &macros).await.unwrap();
}

// ── Item / history tests ────────────────────────────────────────────

#[tokio::test]
async fn test_get_item_ids_filters_by_name() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_partial_json(json!({"method": "item.get", "params": {"host": "macrosync"}})))
        .respond_with(rpc_ok(json!([
            {"itemid": "501", "name": "error"},
            {"itemid": "502", "name": "cpu load"},
            {"itemid": "503", "name": "uptime"}
        ])))
        .mount(&server)
        .await;

    let ids = client
        .get_item_ids("macrosync", &["error", "update_true", "uptime"])
        .await
        .unwrap();

    assert_eq!(ids.len(), 2);
    assert_eq!(ids["error"], "501");
    assert_eq!(ids["uptime"], "503");
}

#[tokio::test]
async fn test_push_history() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_partial_json(json!({
            "method": "history.push",
            "params": [{"itemid": "503", "value": 12}]
        })))
        .respond_with(rpc_ok(json!({"response": "success", "data": [{"itemid": "503"}]})))
        .expect(1)
        .mount(&server)
        .await;

    client.push_history("503", 12).await.unwrap();
}

#[tokio::test]
async fn test_push_history_item_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(rpc_ok(json!({
            "response": "success",
            "data": [{"error": "Item is disabled."}]
        })))
        .mount(&server)
        .await;

    let result = client.push_history("503", "msg").await;
    assert!(
        matches!(result, Err(Error::JsonRpc { ref message, .. }) if message == "Item is disabled."),
        "got: {result:?}"
    );
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_rpc_error_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32500, "message": "Application error.", "data": "No permissions."},
            "id": 1
        })))
        .mount(&server)
        .await;

    match client.get_host_macros("1").await {
        Err(Error::JsonRpc {
            code,
            message,
            data,
        }) => {
            assert_eq!(code, -32500);
            assert_eq!(message, "Application error.");
            assert_eq!(data.as_deref(), Some("No permissions."));
        }
        other => panic!("expected JsonRpc error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_rpc_not_authorised_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32602, "message": "Invalid params.", "data": "Not authorized."},
            "id": 1
        })))
        .mount(&server)
        .await;

    let result = client.get_host_macros("1").await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "got: {result:?}"
    );
}

#![allow(clippy::unwrap_used)]
// Integration tests for `NetBoxClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use macrosync_api::{Error, NetBoxClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, NetBoxClient) {
    let server = MockServer::start().await;
    let token = SecretString::from("nb-token".to_string());
    let client = NetBoxClient::new(&server.uri(), &token, &TransportConfig::default()).unwrap();
    (server, client)
}

fn device_body() -> serde_json::Value {
    json!({
        "id": 17,
        "name": "edge-rtr-01",
        "tenant": {"id": 4, "name": "Acme"},
        "site": {"id": 42, "name": "AMS1"},
        "status": {"value": "active", "label": "Active"},
        "custom_fields": {"zabbix_hostid": "10084"},
        "config_context": {
            "HCP-Vault": {
                "zbx_macros": {
                    "{$SNMP_COMMUNITY}": "secret/-TENENT_ID-/-DEVICE_ID-",
                    "{$SITE}": "-SITE_ID-"
                }
            }
        }
    })
}

// ── URL handling ────────────────────────────────────────────────────

#[test]
fn test_base_url_gets_api_suffix() {
    let client = NetBoxClient::with_client("https://netbox.example.com", reqwest::Client::new())
        .unwrap();
    assert_eq!(client.base_url().as_str(), "https://netbox.example.com/api/");

    let client =
        NetBoxClient::with_client("https://netbox.example.com/api/", reqwest::Client::new())
            .unwrap();
    assert_eq!(client.base_url().as_str(), "https://netbox.example.com/api/");
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_device_sends_token_and_decodes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/17/"))
        .and(header("Authorization", "Token nb-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_body()))
        .expect(1)
        .mount(&server)
        .await;

    let device = client.get_device(17).await.unwrap();

    assert_eq!(device.id, 17);
    assert_eq!(device.name.as_deref(), Some("edge-rtr-01"));
    assert_eq!(device.tenant_id(), Some(4));
    assert_eq!(device.site_id(), Some(42));
    assert_eq!(device.custom_field_str("zabbix_hostid").unwrap(), "10084");
    assert!(device.extra.contains_key("status"));

    let template = device.macro_template("HCP-Vault", "zbx_macros").unwrap();
    assert_eq!(template.len(), 2);
    assert_eq!(template["{$SITE}"], "-SITE_ID-");
}

#[tokio::test]
async fn test_get_device_without_tenant() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/5/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "tenant": null,
            "site": {"id": 1},
            "custom_fields": {},
            "config_context": {}
        })))
        .mount(&server)
        .await;

    let device = client.get_device(5).await.unwrap();
    assert_eq!(device.tenant_id(), None);
    assert!(matches!(
        device.custom_field_str("zabbix_hostid"),
        Err(Error::MissingField { .. })
    ));
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_device_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/999/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let err = client.get_device(999).await.unwrap_err();
    assert!(err.is_not_found(), "expected not found, got: {err:?}");
}

#[tokio::test]
async fn test_invalid_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "Invalid token"})),
        )
        .mount(&server)
        .await;

    let result = client.get_device(1).await;
    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("Invalid token"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let result = client.get_device(1).await;
    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body.contains("proxy")),
        "expected Deserialization error, got: {result:?}"
    );
}

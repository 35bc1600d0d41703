#![allow(clippy::unwrap_used)]
// End-to-end driver runs over the real NetBox/Zabbix adapters, with both
// services mocked by wiremock.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use macrosync_api::{NetBoxClient, TransportConfig, ZabbixClient};
use macrosync_core::{
    DriverSettings, Monitoring, NetBoxInventory, NullNotifier, Outcome, ReconciliationDriver,
    StatusSignal, TemplateLocation, WebhookEvent, ZabbixMonitoring,
};

fn rpc_ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "result": result, "id": 1}))
}

async fn mount_device(netbox: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/17/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 17,
            "name": "sw1",
            "tenant": {"id": 4, "name": "acme"},
            "site": {"id": 42, "name": "dc1"},
            "custom_fields": {"zabbix_hostid": "10084"},
            "config_context": {
                "HCP-Vault": {"zbx_macros": {"{$SNMP_COMMUNITY}": "kv/-TENENT_ID-/-SITE_ID-:community"}}
            }
        })))
        .expect(1)
        .mount(netbox)
        .await;
}

fn token(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

#[tokio::test]
async fn test_tag_event_updates_zabbix_host() {
    let netbox = MockServer::start().await;
    let zabbix = MockServer::start().await;
    mount_device(&netbox).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "host.get"})))
        .respond_with(rpc_ok(json!([{
            "hostid": "10084",
            "macros": [{"macro": "{$KEEP}", "value": "1", "type": "0", "description": "manual"}]
        }])))
        .mount(&zabbix)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "host.update",
            "params": {
                "hostid": "10084",
                "macros": [
                    {"macro": "{$SNMP_COMMUNITY}", "value": "kv/4/42:community", "type": "0"},
                    {"macro": "{$KEEP}", "value": "1", "type": "0", "description": "manual"}
                ]
            }
        })))
        .respond_with(rpc_ok(json!({"hostids": ["10084"]})))
        .expect(1)
        .mount(&zabbix)
        .await;

    let transport = TransportConfig::default();
    let inventory = NetBoxInventory::new(
        NetBoxClient::new(&netbox.uri(), &token("nb"), &transport).unwrap(),
        TemplateLocation::default(),
    );
    let monitoring = ZabbixMonitoring::new(ZabbixClient::new(&zabbix.uri(), &token("zbx"), &transport).unwrap());

    let driver = ReconciliationDriver::new(
        Arc::new(inventory),
        Arc::new(monitoring),
        Arc::new(NullNotifier),
        DriverSettings::default(),
    );

    let event: WebhookEvent = serde_json::from_value(json!({
        "Snapshots": {"Prechange Tags": "core", "Postchange Tags": "core, HCP-Gold"},
        "Data": [{"ID": 17}]
    }))
    .unwrap();

    let report = driver.process(&event).await.unwrap();

    assert!(
        matches!(report.outcome, Outcome::Applied { ref added, .. } if added == &["{$SNMP_COMMUNITY}".to_owned()]),
        "got: {:?}",
        report.outcome
    );
}

#[tokio::test]
async fn test_resolve_signal_items_and_push() {
    let zabbix = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "item.get", "params": {"host": "macrosync-app"}})))
        .respond_with(rpc_ok(json!([
            {"itemid": "900", "name": "update_true"},
            {"itemid": "901", "name": "uptime"}
        ])))
        .mount(&zabbix)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "history.push",
            "params": [{"itemid": "901", "value": 3}]
        })))
        .respond_with(rpc_ok(json!({"response": "success", "data": [{"itemid": "901"}]})))
        .expect(1)
        .mount(&zabbix)
        .await;

    let client =
        ZabbixClient::new(&zabbix.uri(), &token("zbx"), &TransportConfig::default()).unwrap();
    let monitoring = ZabbixMonitoring::resolve(client, "macrosync-app").await.unwrap();

    assert_eq!(monitoring.item_id(StatusSignal::UpdateTrue), Some("900"));
    assert_eq!(monitoring.item_id(StatusSignal::Error), None);

    monitoring
        .push_signal(StatusSignal::Uptime, json!(3))
        .await
        .unwrap();
    // Unresolved item: silently skipped, no request sent.
    monitoring
        .push_signal(StatusSignal::Error, json!("boom"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_hidden_secret_is_written_back_without_value() {
    let netbox = MockServer::start().await;
    let zabbix = MockServer::start().await;
    mount_device(&netbox).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "host.get"})))
        .respond_with(rpc_ok(json!([{
            "hostid": "10084",
            "macros": [
                {"hostmacroid": "7", "macro": "{$DB_PASS}", "type": "1", "description": "db"}
            ]
        }])))
        .mount(&zabbix)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "host.update"})))
        .respond_with(rpc_ok(json!({"hostids": ["10084"]})))
        .expect(1)
        .mount(&zabbix)
        .await;

    let transport = TransportConfig::default();
    let driver = ReconciliationDriver::new(
        Arc::new(NetBoxInventory::new(
            NetBoxClient::new(&netbox.uri(), &token("nb"), &transport).unwrap(),
            TemplateLocation::default(),
        )),
        Arc::new(ZabbixMonitoring::new(
            ZabbixClient::new(&zabbix.uri(), &token("zbx"), &transport).unwrap(),
        )),
        Arc::new(NullNotifier),
        DriverSettings::default(),
    );

    let event: WebhookEvent = serde_json::from_value(json!({
        "Snapshots": {"Prechange Tags": "", "Postchange Tags": "HCP-Gold"},
        "Data": [{"ID": 17}]
    }))
    .unwrap();
    driver.process(&event).await.unwrap();

    let requests = zabbix.received_requests().await.unwrap();
    let update = requests
        .iter()
        .map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).unwrap())
        .find(|b| b["method"] == "host.update")
        .unwrap();
    let secret = update["params"]["macros"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["macro"] == "{$DB_PASS}")
        .unwrap();

    assert_eq!(secret["hostmacroid"], "7");
    assert_eq!(secret["type"], "1");
    assert!(secret.get("value").is_none(), "secret value was sent: {secret}");
}

use super::*;
use crate::api::test_helpers::{
    assert_layout_round_trips, assert_single_field_updates, configure, dynamic, Method,
    RecordingApi,
};
use crate::util::section::check_translation;
use serde_json::json;
use std::sync::Arc;
use tfplug::types::{has_errors, ClientCapabilities, Dynamic, DynamicValue};
use tfplug::ChangeSet;

fn dns_server() -> DynamicValue {
    dynamic(json!({
        "name": "vs-dns",
        "protocol": "dns",
        "port": 50,
        "pool": "dns-pool",
        "request_rules": ["ruleOne", "ruleTwo"],
        "http2": [{"enabled": true, "max_frame_size": 20000}],
        "ssl": [{
            "ocsp_enable": true,
            "ocsp_issuers": [
                {"issuer": "issuerName", "aia": true, "nonce": "strict", "required": "optional"},
                {"issuer": "issuerName2", "aia": false, "nonce": "on", "required": "none"}
            ]
        }]
    }))
}

async fn resource_with(api: Arc<RecordingApi>) -> VirtualServerResource {
    let mut resource = VirtualServerResource::new();
    configure(&mut resource, api).await;
    resource
}

fn ssl_of(state: &DynamicValue) -> std::collections::HashMap<String, Dynamic> {
    let blocks = state.get_list(&AttributePath::new("ssl")).unwrap();
    blocks[0].as_map().unwrap().clone()
}

fn issuers(ssl: &std::collections::HashMap<String, Dynamic>) -> Vec<(String, String, String)> {
    ssl["ocsp_issuers"]
        .elements()
        .unwrap()
        .iter()
        .map(|row| {
            let row = row.as_map().unwrap();
            let field = |name: &str| row[name].as_str().unwrap().to_string();
            (field("issuer"), field("nonce"), field("required"))
        })
        .collect()
}

async fn validate(config: serde_json::Value) -> Vec<String> {
    VirtualServerResource::new()
        .validate(ValidateResourceConfigRequest {
            type_name: TYPE_NAME.to_string(),
            config: dynamic(config),
            client_capabilities: ClientCapabilities::default(),
        })
        .await
        .diagnostics
        .into_iter()
        .map(|d| d.summary)
        .collect()
}

#[test]
fn sections_translate_one_to_one() {
    for section in LAYOUT.sections {
        check_translation(section.fields)
            .unwrap_or_else(|e| panic!("{}: {}", section.remote, e));
    }
    assert_eq!(CONNECTION.remote, "connection");
    assert_eq!(
        SSL.remote_field("server_cert_host_mapping").unwrap().name,
        "ssl_server_cert_host_mapping"
    );
}

#[test]
fn schema_has_a_block_per_section() {
    let schema = VirtualServerResource::schema_static();
    for section in &LAYOUT.sections[1..] {
        let block = section.block.unwrap();
        assert!(schema.block.nested_block(block).is_some(), "{}", block);
    }
    assert_eq!(
        schema.block.attribute("port").unwrap().r#type,
        AttributeType::Number
    );
    let ssl = schema.block.nested_block("ssl").unwrap();
    assert!(ssl
        .block
        .nested_block("ocsp_issuers")
        .unwrap()
        .block
        .attribute("issuer")
        .unwrap()
        .required);
}

#[tokio::test]
async fn validators_use_their_messages() {
    let summaries = validate(json!({
        "name": "vs",
        "protocol": "SOME_INVALID_PROTOCOL",
        "ssl_client_cert_headers": "INVALID",
        "gzip": [{"compress_level": 50}],
        "http2": [{"data_frame_size": 50}],
        "vs_connection": [{"max_client_buffer": 1}],
        "ssl": [{
            "ssl_support_ssl2": "INVALID",
            "ocsp_issuers": [{"issuer": "i", "nonce": "INVALID"}]
        }]
    }))
    .await;

    assert_eq!(summaries.len(), 7, "{:?}", summaries);
    for expected in [
        "SSL Client Cert Header must be one of all, none or simple",
        "Compression level must be a value within 1-9",
        "data_frame_size must be a value within 100-16777206",
        "buffer size must be within 1024-16777216",
        "must be one of use_default, disabled or enabled",
        "must be one of off, on or strict",
    ] {
        assert!(summaries.iter().any(|s| s == expected), "missing {}", expected);
    }
    assert!(summaries.iter().any(|s| s.contains("udpstreaming")));
}

#[test]
fn every_section_round_trips() {
    assert_layout_round_trips(&LAYOUT);
}

#[test]
fn single_field_changes_touch_one_section() {
    assert_single_field_updates(&LAYOUT);
}

#[tokio::test]
async fn missing_name_fails_before_any_call() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;

    let planned = dynamic(json!({"protocol": "dns", "port": 50}));
    let response = resource
        .create(CreateResourceRequest {
            type_name: TYPE_NAME.to_string(),
            planned_state: planned.clone(),
            config: planned,
        })
        .await;

    assert!(has_errors(&response.diagnostics));
    assert!(response.diagnostics[0]
        .summary
        .contains("required field is not set"));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn dns_server_end_to_end() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;

    let planned = dns_server();
    let created = resource
        .create(CreateResourceRequest {
            type_name: TYPE_NAME.to_string(),
            planned_state: planned.clone(),
            config: planned,
        })
        .await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);

    let payload = api.last_create().unwrap();
    assert_eq!(payload["properties"]["basic"]["protocol"], json!("dns"));
    assert_eq!(payload["properties"]["basic"]["port"], json!(50));
    assert_eq!(
        payload["properties"]["ssl"]["ocsp_issuers"][1]["issuer"],
        json!("issuerName2")
    );

    // Read back from scratch: only the name is known
    let read = resource
        .read(ReadResourceRequest {
            type_name: TYPE_NAME.to_string(),
            current_state: dynamic(json!({"name": "vs-dns"})),
            client_capabilities: ClientCapabilities::default(),
        })
        .await;
    assert!(read.diagnostics.is_empty());
    let state = read.new_state.unwrap();
    assert_eq!(
        issuers(&ssl_of(&state)),
        vec![
            ("issuerName".into(), "strict".into(), "optional".into()),
            ("issuerName2".into(), "on".into(), "none".into()),
        ]
    );
    assert_eq!(state.get_number(&AttributePath::new("port")).unwrap(), 50.0);
    assert_eq!(
        state.get_list(&AttributePath::new("request_rules")).unwrap(),
        vec![Dynamic::String("ruleOne".into()), Dynamic::String("ruleTwo".into())]
    );

    // Flip one field inside ssl
    let mut planned = state.clone();
    if let Dynamic::Map(root) = &mut planned.value {
        let mut ssl = ssl_of(&state);
        ssl.insert("ocsp_enable".to_string(), Dynamic::Bool(false));
        root.insert("ssl".to_string(), Dynamic::List(vec![Dynamic::Map(ssl)]));
    }
    let updated = resource
        .update(UpdateResourceRequest::from_states(TYPE_NAME, state, planned))
        .await;
    assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);

    let payload = api.last_update().unwrap();
    let properties = payload["properties"].as_object().unwrap();
    assert_eq!(properties["ssl"]["ocsp_enable"], json!(false));
    assert_eq!(properties["ssl"]["ocsp_issuers"][0]["issuer"], json!("issuerName"));
    assert!(!properties.contains_key("http2"));
    assert!(!properties.contains_key("basic"));

    let ssl = ssl_of(&updated.new_state);
    assert_eq!(ssl["ocsp_enable"], Dynamic::Bool(false));
    assert_eq!(issuers(&ssl).len(), 2);
}

#[tokio::test]
async fn reordered_issuers_follow_the_state_order() {
    let api = Arc::new(RecordingApi::new());
    api.seed(
        "virtual_servers",
        "vs-dns",
        json!({"properties": {
            "basic": {"protocol": "dns", "port": 50},
            "ssl": {"ocsp_issuers": [
                {"issuer": "issuerName2", "aia": false, "nonce": "on", "required": "none"},
                {"issuer": "issuerName", "aia": true, "nonce": "strict", "required": "optional"}
            ]}
        }}),
    );
    let resource = resource_with(api).await;

    let response = resource
        .read(ReadResourceRequest {
            type_name: TYPE_NAME.to_string(),
            current_state: dns_server(),
            client_capabilities: ClientCapabilities::default(),
        })
        .await;
    let state = response.new_state.unwrap();
    let names: Vec<String> = issuers(&ssl_of(&state)).into_iter().map(|i| i.0).collect();
    assert_eq!(names, vec!["issuerName", "issuerName2"]);
}

#[tokio::test]
async fn basic_change_sends_only_that_field() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;
    let planned = dns_server();
    let prior = resource
        .create(CreateResourceRequest {
            type_name: TYPE_NAME.to_string(),
            planned_state: planned.clone(),
            config: planned,
        })
        .await
        .new_state;

    let mut planned = prior.clone();
    planned
        .set_string(&AttributePath::new("note"), "now with a note".to_string())
        .unwrap();
    let response = resource
        .update(UpdateResourceRequest::from_states(TYPE_NAME, prior, planned))
        .await;
    assert!(response.diagnostics.is_empty());

    assert_eq!(
        api.last_update().unwrap(),
        json!({"properties": {"basic": {"note": "now with a note"}}})
    );
}

#[tokio::test]
async fn remote_failure_keeps_prior_state() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;
    api.fail_next(500);

    let response = resource
        .read(ReadResourceRequest {
            type_name: TYPE_NAME.to_string(),
            current_state: dns_server(),
            client_capabilities: ClientCapabilities::default(),
        })
        .await;
    assert_eq!(response.diagnostics[0].summary, "Failed to read vtm_virtual_server");
    assert!(response.diagnostics[0].detail.contains("vs-dns"));
    assert!(response.new_state.is_some());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;

    let response = resource
        .delete(DeleteResourceRequest {
            type_name: TYPE_NAME.to_string(),
            prior_state: dns_server(),
        })
        .await;
    assert!(response.diagnostics.is_empty());
    assert_eq!(api.count(Method::Delete), 1);
}

async fn created_with_ssl(
    api: Arc<RecordingApi>,
    ssl: serde_json::Value,
) -> (VirtualServerResource, DynamicValue) {
    let resource = resource_with(api).await;
    let planned = dynamic(json!({"name": "vs-tls", "port": 443, "ssl": [ssl]}));
    let created = resource
        .create(CreateResourceRequest {
            type_name: TYPE_NAME.to_string(),
            planned_state: planned.clone(),
            config: planned,
        })
        .await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    (resource, created.new_state)
}

#[tokio::test]
async fn field_removed_from_block_is_cleared_remotely() {
    let api = Arc::new(RecordingApi::new());
    let (resource, prior) = created_with_ssl(
        api.clone(),
        json!({"ocsp_enable": true, "ocsp_max_response_age": 300}),
    )
    .await;

    let planned = dynamic(json!({"name": "vs-tls", "port": 443, "ssl": [{"ocsp_enable": true}]}));
    let updated = resource
        .update(UpdateResourceRequest::from_states(TYPE_NAME, prior, planned.clone()))
        .await;
    assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);

    let payload = api.last_update().unwrap();
    assert_eq!(payload["properties"]["ssl"]["ocsp_enable"], json!(true));
    assert_eq!(payload["properties"]["ssl"]["ocsp_max_response_age"], json!(0));
    assert_eq!(
        api.document("virtual_servers", "vs-tls").unwrap()["properties"]["ssl"]
            ["ocsp_max_response_age"],
        json!(0)
    );

    let drift = ChangeSet::between(&planned, &updated.new_state);
    assert!(drift.is_empty(), "{:?}", drift.iter().collect::<Vec<_>>());
}

#[tokio::test]
async fn removed_block_is_cleared_remotely() {
    let api = Arc::new(RecordingApi::new());
    let (resource, prior) = created_with_ssl(
        api.clone(),
        json!({"ocsp_enable": true, "ocsp_max_response_age": 300}),
    )
    .await;

    let planned = dynamic(json!({"name": "vs-tls", "port": 443}));
    let updated = resource
        .update(UpdateResourceRequest::from_states(TYPE_NAME, prior, planned.clone()))
        .await;
    assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);

    let ssl = &api.last_update().unwrap()["properties"]["ssl"];
    assert_eq!(ssl["ocsp_enable"], json!(false));
    assert_eq!(ssl["ocsp_max_response_age"], json!(0));
    assert_eq!(ssl["ocsp_issuers"], json!([]));
    assert!(updated.new_state.get(&AttributePath::new("ssl")).is_none());

    let drift = ChangeSet::between(&planned, &updated.new_state);
    assert!(drift.is_empty(), "{:?}", drift.iter().collect::<Vec<_>>());
}

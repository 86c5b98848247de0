use super::*;
use crate::api::test_helpers::{
    assert_layout_round_trips, assert_single_field_updates, configure, dynamic, Method,
    RecordingApi,
};
use crate::util::section::check_translation;
use serde_json::json;
use std::sync::Arc;
use tfplug::types::{ClientCapabilities, Dynamic, DynamicValue};
use tfplug::ChangeSet;

fn config() -> DynamicValue {
    dynamic(json!({
        "name": "tm1",
        "number_of_cpus": 4,
        "appliance_card": [
            {"name": "0000:01:00.0", "label": "eth-a", "interfaces": ["eth0", "eth1"]},
            {"name": "0000:02:00.0", "label": "eth-b", "interfaces": ["eth2"]}
        ],
        "snmp": [{"community": "private"}]
    }))
}

async fn resource_with(api: Arc<RecordingApi>) -> TrafficManagerResource {
    let mut resource = TrafficManagerResource::new();
    configure(&mut resource, api).await;
    resource
}

async fn create(resource: &TrafficManagerResource, planned: DynamicValue) -> CreateResourceResponse {
    resource
        .create(CreateResourceRequest {
            type_name: TYPE_NAME.to_string(),
            planned_state: planned.clone(),
            config: planned,
        })
        .await
}

#[test]
fn every_section_translates_one_to_one() {
    for section in LAYOUT.sections {
        check_translation(section.fields)
            .unwrap_or_else(|e| panic!("{}: {}", section.remote, e));
    }
}

#[test]
fn every_section_round_trips() {
    assert_layout_round_trips(&LAYOUT);
}

#[test]
fn single_field_changes_touch_one_section() {
    assert_single_field_updates(&LAYOUT);
}

#[test]
fn camel_case_names_round_trip() {
    for (name, remote) in [
        ("admin_master_xmlip", "adminMasterXMLIP"),
        ("admin_slave_xmlip", "adminSlaveXMLIP"),
        ("authentication_server_ip", "authenticationServerIP"),
        ("number_of_cpus", "numberOfCPUs"),
        ("rest_server_port", "restServerPort"),
        ("updater_ip", "updaterIP"),
    ] {
        assert_eq!(BASIC.field(name).unwrap().remote, remote);
        assert_eq!(BASIC.remote_field(remote).unwrap().name, name);
    }
}

#[test]
fn schema_declares_defaults_and_single_blocks() {
    let schema = TrafficManagerResource::schema_static();
    let name = schema.block.attribute("name").unwrap();
    assert!(name.required);
    assert!(name.requires_replace);

    let snmp = schema.block.nested_block("snmp").unwrap();
    assert_eq!(snmp.max_items, 1);
    assert!(snmp.block.attribute("auth_password").unwrap().sensitive);

    let appliance = schema.block.nested_block("appliance").unwrap();
    let interfaces = appliance.block.nested_block("if").unwrap();
    assert_eq!(
        interfaces.block.attribute("mtu").unwrap().default,
        Some(Dynamic::Number(1500.0))
    );
    assert!(appliance.block.attribute("hostname").unwrap().computed);
}

#[tokio::test]
async fn validate_reports_every_violation() {
    let resource = TrafficManagerResource::new();
    let response = resource
        .validate(ValidateResourceConfigRequest {
            type_name: TYPE_NAME.to_string(),
            config: dynamic(json!({
                "name": "tm1",
                "num_children": -1,
                "appliance_card": [{"name": "card", "label": "bad label!"}],
                "appliance": [{
                    "ssh_port": 70000,
                    "if": [{"name": "eth0", "bond": "team0", "speed": "25"}]
                }]
            })),
            client_capabilities: ClientCapabilities::default(),
        })
        .await;

    let summaries: Vec<&str> = response
        .diagnostics
        .iter()
        .map(|d| d.summary.as_str())
        .collect();
    assert_eq!(summaries.len(), 5, "{:?}", summaries);
    assert!(summaries.contains(&"num_children must be a positive integer"));
    assert!(summaries.contains(&"ssh_port must be a valid port number within 1-65535"));
    assert!(summaries.contains(&"speed must be one of 10, 100 or 1000"));
}

#[tokio::test]
async fn create_sends_remote_names_and_defaults() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;

    let response = create(&resource, config()).await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let payload = api.last_create().unwrap();
    let basic = &payload["properties"]["basic"];
    assert_eq!(basic["numberOfCPUs"], json!(4));
    assert_eq!(basic["adminMasterXMLIP"], json!("0.0.0.0"));
    assert_eq!(basic["num_children"], json!(0));
    assert_eq!(basic["appliance_card"][1]["interfaces"], json!(["eth2"]));
    assert!(basic.get("number_of_cpus").is_none());

    let snmp = &payload["properties"]["snmp"];
    assert_eq!(snmp["community"], json!("private"));
    assert_eq!(snmp["bind_ip"], json!("*"));
    assert_eq!(snmp["security_level"], json!("noauthnopriv"));
    assert!(payload["properties"].get("appliance").is_none());

    assert_eq!(
        response
            .new_state
            .get_number(&AttributePath::new("number_of_cpus"))
            .unwrap(),
        4.0
    );
}

#[tokio::test]
async fn missing_name_never_reaches_the_appliance() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;

    let response = create(&resource, dynamic(json!({"number_of_cpus": 2}))).await;
    assert!(tfplug::types::has_errors(&response.diagnostics));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn read_keeps_card_order_from_state() {
    let api = Arc::new(RecordingApi::new());
    api.seed(
        "traffic_managers",
        "tm1",
        json!({"properties": {"basic": {
            "numberOfCPUs": 4,
            "start_sysd": true,
            "appliance_card": [
                {"name": "0000:02:00.0", "label": "eth-b", "interfaces": ["eth2"]},
                {"name": "0000:01:00.0", "label": "eth-a", "interfaces": ["eth0", "eth1"]}
            ]
        }}}),
    );
    let resource = resource_with(api).await;

    let response = resource
        .read(ReadResourceRequest {
            type_name: TYPE_NAME.to_string(),
            current_state: config(),
            client_capabilities: ClientCapabilities::default(),
        })
        .await;
    assert!(response.diagnostics.is_empty());

    let state = response.new_state.unwrap();
    let cards = state.get_list(&AttributePath::new("appliance_card")).unwrap();
    let names: Vec<&str> = cards
        .iter()
        .map(|c| c.as_map().unwrap()["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["0000:01:00.0", "0000:02:00.0"]);
    assert!(state.get_bool(&AttributePath::new("start_sysd")).unwrap());
}

#[tokio::test]
async fn read_of_missing_manager_clears_state() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api).await;

    let response = resource
        .read(ReadResourceRequest {
            type_name: TYPE_NAME.to_string(),
            current_state: config(),
            client_capabilities: ClientCapabilities::default(),
        })
        .await;
    assert!(response.diagnostics.is_empty());
    assert!(response.new_state.is_none());
}

#[tokio::test]
async fn changing_one_snmp_field_resends_the_section() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;
    let prior = create(&resource, config()).await.new_state;

    let mut planned = prior.clone();
    if let Dynamic::Map(root) = &mut planned.value {
        root.insert(
            "snmp".to_string(),
            serde_json::from_value(json!([{"community": "private", "enabled": true}])).unwrap(),
        );
    }

    let response = resource
        .update(UpdateResourceRequest::from_states(TYPE_NAME, prior, planned))
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let payload = api.last_update().unwrap();
    let properties = payload["properties"].as_object().unwrap();
    assert_eq!(properties["snmp"]["enabled"], json!(true));
    assert_eq!(properties["snmp"]["community"], json!("private"));
    assert_eq!(properties["snmp"]["hash_algorithm"], json!("md5"));

    // Basic carries only its always-sent fields
    let basic = properties["basic"].as_object().unwrap();
    assert!(basic.contains_key("numberOfCPUs"));
    assert!(!basic.contains_key("appliance_card"));
    assert!(!properties.contains_key("appliance"));
}

#[tokio::test]
async fn unchanged_plan_skips_the_update_call() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;
    let prior = create(&resource, config()).await.new_state;

    let response = resource
        .update(UpdateResourceRequest {
            type_name: TYPE_NAME.to_string(),
            prior_state: prior.clone(),
            planned_state: prior.clone(),
            config: prior,
            changes: ChangeSet::new(),
        })
        .await;
    assert!(response.diagnostics.is_empty());
    assert_eq!(api.count(Method::Update), 0);
}

#[tokio::test]
async fn delete_twice_is_not_an_error() {
    let api = Arc::new(RecordingApi::new());
    let resource = resource_with(api.clone()).await;
    let state = create(&resource, config()).await.new_state;

    for _ in 0..2 {
        let response = resource
            .delete(DeleteResourceRequest {
                type_name: TYPE_NAME.to_string(),
                prior_state: state.clone(),
            })
            .await;
        assert!(response.diagnostics.is_empty());
    }
    assert_eq!(api.count(Method::Delete), 2);
    assert!(api.document("traffic_managers", "tm1").is_none());
}

#[tokio::test]
async fn unconfigured_resource_reports_it() {
    let resource = TrafficManagerResource::new();
    let response = create(&resource, config()).await;
    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}

#[tokio::test]
async fn import_uses_the_id_as_name() {
    let resource = TrafficManagerResource::new();
    let response = resource
        .import_state(ImportResourceStateRequest {
            type_name: TYPE_NAME.to_string(),
            id: "tm1".to_string(),
        })
        .await;
    let state = &response.imported_resources[0].state;
    assert_eq!(state.get_string(&AttributePath::new("name")).unwrap(), "tm1");
}

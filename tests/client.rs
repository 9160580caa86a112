#![allow(dead_code)]

use crate::utils::{produce_mock_path, rand_sdk_key};
use flagcore::{Client, PollingMode, User};

mod utils;

async fn build_client_with_settings(body: &str) -> (Client, mockito::ServerGuard) {
    let (sdk_key, path) = produce_mock_path();
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", path.as_str())
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = Client::builder(sdk_key.as_str())
        .base_url(server.url().as_str())
        .polling_mode(PollingMode::Manual)
        .build()
        .unwrap();
    client.refresh().await.unwrap();
    (client, server)
}

fn settings_payload() -> String {
    r#"{"f": {
        "disabledFeature": {"t": 0, "v": {"b": false}, "r": [
            {"c": [{"u": {"a": "Email", "c": 0, "l": ["a@matching.com"]}}], "s": {"v": {"b": true}}}
        ]},
        "enabledFeature": {"t": 0, "v": {"b": true}},
        "stringSetting": {"t": 1, "v": {"s": "test"}},
        "intSetting": {"t": 2, "v": {"i": 5}},
        "doubleSetting": {"t": 3, "v": {"d": 1.2}}
    }, "s": []}"#
        .to_owned()
}

#[tokio::test]
async fn default_user_flag() {
    let (client, _server) = build_client_with_settings(settings_payload().as_str()).await;
    let mut client = client;
    client.set_default_user(User::new("id1"));

    let details_without_user = client.get_flag_details("disabledFeature", None).await;
    assert_eq!("id1", details_without_user.user.unwrap().get_identifier());

    let details = client.get_flag_details("disabledFeature", Some(User::new("id2"))).await;
    assert_eq!("id2", details.user.unwrap().get_identifier());
}

#[tokio::test]
async fn default_user_bool() {
    let (client, _server) = build_client_with_settings(settings_payload().as_str()).await;
    let mut client = client;
    client.set_default_user(User::new("id1"));

    let details_without_user = client.get_value_details("disabledFeature", false, None).await;
    assert_eq!("id1", details_without_user.user.unwrap().get_identifier());

    let details = client.get_value_details("disabledFeature", false, Some(User::new("id2"))).await;
    assert_eq!("id2", details.user.unwrap().get_identifier());
}

#[tokio::test]
async fn default_user_str() {
    let (client, _server) = build_client_with_settings(settings_payload().as_str()).await;
    let mut client = client;
    client.set_default_user(User::new("id1"));

    let details_without_user = client.get_value_details("stringSetting", String::default(), None).await;
    assert_eq!("id1", details_without_user.user.unwrap().get_identifier());

    let details = client.get_value_details("stringSetting", String::default(), Some(User::new("id2"))).await;
    assert_eq!("id2", details.user.unwrap().get_identifier());
}

#[tokio::test]
async fn default_user_int() {
    let (client, _server) = build_client_with_settings(settings_payload().as_str()).await;
    let mut client = client;
    client.set_default_user(User::new("id1"));

    let details_without_user = client.get_value_details("intSetting", 0i64, None).await;
    assert_eq!("id1", details_without_user.user.unwrap().get_identifier());

    let details = client.get_value_details("intSetting", 0i64, Some(User::new("id2"))).await;
    assert_eq!("id2", details.user.unwrap().get_identifier());
}

#[tokio::test]
async fn default_user_float() {
    let (client, _server) = build_client_with_settings(settings_payload().as_str()).await;
    let mut client = client;
    client.set_default_user(User::new("id1"));

    let details_without_user = client.get_value_details("doubleSetting", 0.0f64, None).await;
    assert_eq!("id1", details_without_user.user.unwrap().get_identifier());

    let details = client.get_value_details("doubleSetting", 0.0f64, Some(User::new("id2"))).await;
    assert_eq!("id2", details.user.unwrap().get_identifier());
}

#[tokio::test]
async fn get_all_keys() {
    let (client, _server) = build_client_with_settings(settings_payload().as_str()).await;
    let mut keys = client.get_all_keys().await;
    keys.sort();
    let mut exp = vec!["stringSetting", "intSetting", "doubleSetting", "disabledFeature", "enabledFeature"];
    exp.sort();

    assert_eq!(keys, exp);
}

#[tokio::test]
async fn get_all_keys_empty() {
    let client = Client::builder(rand_sdk_key().as_str()).polling_mode(PollingMode::Manual).build().unwrap();
    let keys = client.get_all_keys().await;

    assert!(keys.is_empty());
}

#[tokio::test]
async fn get_all_values() {
    let (client, _server) = build_client_with_settings(settings_payload().as_str()).await;
    let values = client.get_all_values(None).await;

    assert!(!values["disabledFeature"].as_bool().unwrap());
    assert!(values["enabledFeature"].as_bool().unwrap());
    assert_eq!(values["stringSetting"].as_str().unwrap(), "test");
    assert_eq!(values["intSetting"].as_int().unwrap(), 5);
    assert_eq!(values["doubleSetting"].as_float().unwrap(), 1.2);
}

#[tokio::test]
async fn get_all_values_with_user() {
    let (client, _server) = build_client_with_settings(settings_payload().as_str()).await;
    let values = client.get_all_values(Some(User::new("a@matching.com").email("a@matching.com"))).await;

    assert!(values["disabledFeature"].as_bool().unwrap());
}

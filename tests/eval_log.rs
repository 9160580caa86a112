#![allow(dead_code)]

use crate::utils::{produce_mock_path, RecordingLogger};
use flagcore::{Client, PollingMode, User};
use log::set_max_level;

mod utils;

fn init() {
    set_max_level(log::LevelFilter::Info);
    _ = log::set_logger(&RecordingLogger {});
}

fn targeted_payload() -> String {
    r#"{"f": {
        "targetedFeature": {"t": 0, "v": {"b": false}, "r": [
            {"c": [{"u": {"a": "Email", "c": 0, "l": ["a@matching.com"]}}], "s": {"v": {"b": true}}}
        ]}
    }, "s": []}"#
        .to_owned()
}

async fn build_client() -> (Client, mockito::ServerGuard) {
    let (sdk_key, path) = produce_mock_path();
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", path.as_str())
        .with_status(200)
        .with_body(targeted_payload())
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

#[tokio::test]
async fn eval_log_matched_rule() {
    init();
    let (client, _server) = build_client().await;

    let details = client
        .get_flag_details("targetedFeature", Some(User::new("id1").email("a@matching.com")))
        .await;

    assert_eq!(Some(true), details.value.unwrap().as_bool());
    let logs = RecordingLogger::LOGS.take();
    assert!(logs.contains("targetedFeature"));
    assert!(logs.contains("THEN"));
}

#[tokio::test]
async fn eval_log_missing_user() {
    init();
    let (client, _server) = build_client().await;

    _ = client.get_flag_details("targetedFeature", None).await;

    let logs = RecordingLogger::LOGS.take();
    assert!(logs.contains("User Object is missing"));
}

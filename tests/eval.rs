#![allow(dead_code)]

use crate::utils::{produce_mock_path, RecordingLogger};
use flagcore::{Client, PollingMode};
use log::set_max_level;

mod utils;

fn init() {
    set_max_level(log::LevelFilter::Info);
    _ = log::set_logger(&RecordingLogger {});
}

fn circular_dependency_payload() -> String {
    r#"{"f": {
        "key1": {"t": 0, "v": {"b": false}, "r": [
            {"c": [{"p": {"f": "key1", "c": 0, "v": {"b": true}}}], "s": {"v": {"b": true}}}
        ]},
        "key2": {"t": 0, "v": {"b": false}, "r": [
            {"c": [{"p": {"f": "key3", "c": 0, "v": {"b": true}}}], "s": {"v": {"b": true}}}
        ]},
        "key3": {"t": 0, "v": {"b": false}, "r": [
            {"c": [{"p": {"f": "key2", "c": 0, "v": {"b": true}}}], "s": {"v": {"b": true}}}
        ]}
    }, "s": []}"#
        .to_owned()
}

#[tokio::test]
async fn prerequisite_circular_deps() {
    init();

    let (sdk_key, path) = produce_mock_path();
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", path.as_str())
        .with_status(200)
        .with_body(circular_dependency_payload())
        .create_async()
        .await;

    let client = Client::builder(sdk_key.as_str())
        .base_url(server.url().as_str())
        .polling_mode(PollingMode::Manual)
        .build()
        .unwrap();
    client.refresh().await.unwrap();

    for key in ["key1", "key2", "key3"] {
        _ = client.get_flag_details(key, None).await;
        let logs = RecordingLogger::LOGS.take();
        assert!(logs.contains("Circular dependency detected"));
    }
}

//! Integration test: start the gateway on a free port, GET /, assert health JSON.
//! Does not contact the WhatsApp API. The server task is left running when the test ends.

use kandar::config::Config;
use kandar::gateway;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

#[tokio::test]
async fn gateway_health_http_responds_with_running() {
    let port = free_port();

    let mut config = Config::default();
    config.server.port = port;
    config.server.bind = "127.0.0.1".to_string();

    let gateway_handle = tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let url = format!("http://127.0.0.1:{}/", port);
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let json: serde_json::Value = resp.json().await.expect("parse JSON");
                assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("running"));
                assert_eq!(
                    json.get("message").and_then(|v| v.as_str()),
                    Some("WhatsApp Bot is active")
                );
                let ts = json
                    .get("timestamp")
                    .and_then(|v| v.as_str())
                    .expect("timestamp string");
                assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "bad timestamp {ts}");
                assert!(ts.ends_with('Z'));
                gateway_handle.abort();
                return;
            }
            Ok(_) => {}
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    gateway_handle.abort();
    panic!(
        "GET {} did not return 200 with health JSON within 5s; last error: {:?}",
        url, last_err
    );
}

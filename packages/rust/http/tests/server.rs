use std::sync::Arc;

use draftdeck_gateway::{CompletionRequest, TextGenerator};
use draftdeck_http::{HttpServer, Router};
use draftdeck_shared::Result;
use draftdeck_storage::Storage;
use uuid::Uuid;

struct EchoGenerator;

impl TextGenerator for EchoGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        Ok(request.user.clone())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serves_over_tcp_until_shutdown() {
    let path = std::env::temp_dir().join(format!("dd_server_test_{}.db", Uuid::now_v7()));
    let storage = Arc::new(Storage::open(&path).await.expect("open test db"));
    let (_, token) = storage.create_user("tcp@example.com").await.unwrap();

    let server = HttpServer::bind("127.0.0.1:0").expect("bind");
    let addr = server.local_addr().expect("ip listener");
    let shutdown = server.shutdown_handle();
    let router = Router::new(storage, EchoGenerator, "https://app.example.com");
    let running = tokio::spawn(server.run(router));

    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("https://app.example.com")
    );

    let resp = client
        .post(format!("http://{addr}/projects"))
        .bearer_auth(&token)
        .json(&serde_json::json!({"topic": "EVs", "documentType": "pptx", "sections": ["Hook"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["sections"][0]["title"], "Hook");

    let resp = client
        .get(format!("http://{addr}/projects"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    shutdown.shutdown();
    running.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stalled_body_does_not_block_other_clients() {
    use tokio::io::AsyncWriteExt;

    let path = std::env::temp_dir().join(format!("dd_server_test_{}.db", Uuid::now_v7()));
    let storage = Arc::new(Storage::open(&path).await.expect("open test db"));

    let server = HttpServer::bind("127.0.0.1:0").expect("bind");
    let addr = server.local_addr().expect("ip listener");
    let shutdown = server.shutdown_handle();
    let router = Router::new(storage, EchoGenerator, "*");
    let running = tokio::spawn(server.run(router));

    // Promises a 1000-byte body and sends one byte of it.
    let mut stalled = tokio::net::TcpStream::connect(addr).await.unwrap();
    stalled
        .write_all(
            b"POST /projects HTTP/1.1\r\nHost: localhost\r\n\
              Content-Type: application/json\r\nContent-Length: 1000\r\n\r\n{",
        )
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap();
    let resp = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .expect("health answered while another body is pending");
    assert_eq!(resp.status().as_u16(), 200);

    drop(stalled);
    shutdown.shutdown();
    running.await.unwrap().unwrap();
}

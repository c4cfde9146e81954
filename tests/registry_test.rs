//! Registry client tests against canned local HTTP servers

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gemini_agent::{Error, PropertySchema, RegistryClient, Tool, ToolDefinition, ToolRoute};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Serve one canned response per expected connection, returning the captured
/// requests once all of them have been handled.
async fn serve_responses(responses: Vec<String>) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local test server");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.expect("accept connection");
            requests.push(read_request(&mut socket).await);
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            socket.shutdown().await.ok();
        }
        requests
    });

    (addr, handle)
}

/// Read one HTTP/1.1 request (headers plus declared body) off the socket
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let body_start = header_end + 4;
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
            if buf.len() >= body_start + content_length(&headers) {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn content_length(headers: &str) -> usize {
    headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

fn json_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn time_tool() -> Tool {
    Tool::new(
        ToolDefinition::builder("get_utc_now", "Returns the current UTC time.")
            .build()
            .unwrap(),
        ToolRoute::get("http://localhost:5120/api/time/now"),
    )
}

fn trades_tool() -> Tool {
    Tool::new(
        ToolDefinition::builder("trades", "Returns synthetic trades.")
            .required_property("from", PropertySchema::string())
            .build()
            .unwrap(),
        ToolRoute::get("http://localhost:5250/api/trades").with_api_key(),
    )
}

#[tokio::test]
async fn test_register_puts_tool_json_under_its_name() {
    let (addr, server) = serve_responses(vec![json_response("{}")]).await;
    let registry = RegistryClient::new(format!("http://{}", addr)).unwrap();

    registry.register(&time_tool()).await.unwrap();

    let requests = server.await.unwrap();
    let request = &requests[0];
    assert!(request.starts_with("PUT /tools/get_utc_now HTTP/1.1"));

    let body = request
        .split("\r\n\r\n")
        .nth(1)
        .expect("request should have a body");
    let sent: Tool = serde_json::from_str(body).expect("body should be a tool");
    assert_eq!(sent, time_tool());
}

#[tokio::test]
async fn test_list_round_trips_tools() {
    let tools = vec![time_tool(), trades_tool()];
    let body = serde_json::to_string(&tools).unwrap();
    let (addr, server) = serve_responses(vec![json_response(&body)]).await;
    let registry = RegistryClient::new(format!("http://{}", addr)).unwrap();

    let listed = registry.list().await.unwrap();
    assert_eq!(listed, tools);

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /tools HTTP/1.1"));
}

#[tokio::test]
async fn test_get_round_trips_one_tool() {
    let tool = trades_tool();
    let body = serde_json::to_string(&tool).unwrap();
    let (addr, server) = serve_responses(vec![json_response(&body)]).await;
    let registry = RegistryClient::new(format!("http://{}", addr)).unwrap();

    let fetched = registry.get("trades").await.unwrap();
    assert_eq!(fetched, Some(tool));

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /tools/trades HTTP/1.1"));
}

#[tokio::test]
async fn test_get_unknown_tool_is_none() {
    let response =
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string();
    let (addr, _server) = serve_responses(vec![response]).await;
    let registry = RegistryClient::new(format!("http://{}", addr)).unwrap();

    let fetched = registry.get("gone").await.unwrap();
    assert_eq!(fetched, None);
}

#[tokio::test]
async fn test_error_status_surfaces_api_error() {
    let response = "HTTP/1.1 503 Service Unavailable\r\nContent-Type: text/plain\r\nContent-Length: 13\r\nConnection: close\r\n\r\nregistry down"
        .to_string();
    let (addr, _server) = serve_responses(vec![response]).await;
    let registry = RegistryClient::new(format!("http://{}", addr)).unwrap();

    let err = registry
        .register(&time_tool())
        .await
        .expect_err("a 503 should fail the registration");
    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "registry down");
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_advertise_registers_on_an_interval_until_stopped() {
    let (addr, server) = serve_responses(vec![json_response("{}"), json_response("{}")]).await;
    let registry = RegistryClient::new(format!("http://{}", addr)).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let advertiser = {
        let registry = registry.clone();
        let stop = stop.clone();
        let tools = vec![time_tool()];
        tokio::spawn(async move {
            registry
                .advertise(&tools, Duration::from_millis(25), stop)
                .await;
        })
    };

    // Two rounds reach the server, then it goes away; the loop keeps going
    // (logging failures) until the flag stops it
    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert!(request.starts_with("PUT /tools/get_utc_now HTTP/1.1"));
    }

    stop.store(true, Ordering::SeqCst);
    tokio::time::timeout(Duration::from_secs(5), advertiser)
        .await
        .expect("advertise should exit after the flag is set")
        .expect("advertise task should not panic");
}

#[tokio::test]
async fn test_unreachable_registry_is_http_error() {
    // Port 9 (discard) is never listening
    let registry = RegistryClient::new("http://localhost:9").unwrap();

    let err = registry.list().await.expect_err("nothing is listening");
    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn test_json_shape_matches_the_wire_contract() {
    let value = serde_json::to_value(trades_tool()).unwrap();

    assert_eq!(value["definition"]["name"], json!("trades"));
    assert_eq!(value["route"]["method"], json!("GET"));
    assert_eq!(value["route"]["requiresApiKey"], json!(true));
    assert_eq!(
        value["definition"]["parameters"]["properties"]["from"]["type"],
        json!("string")
    );
    assert_eq!(value["definition"]["parameters"]["required"], json!(["from"]));
}

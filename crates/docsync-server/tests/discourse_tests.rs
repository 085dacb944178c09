//! Discourse client against a scripted local HTTP server

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use docsync_server::{ContentServer, DiscourseClient, DiscourseConfig, Error};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    api_key: Option<String>,
    body: String,
}

/// Serves one canned response per connection, in order.
struct ScriptedServer {
    url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl ScriptedServer {
    fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                let request = read_request(&stream);
                recorded.lock().unwrap().push(request);
                write_response(stream, status, body);
            }
        });

        Self { url, requests }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn client(&self) -> DiscourseClient {
        let mut config = DiscourseConfig::new(&self.url, "docs-bot", "secret").with_category(Some(41));
        config.retry_initial_interval = Duration::from_millis(5);
        config.retry_max_elapsed = Duration::from_secs(2);
        DiscourseClient::new(config).unwrap()
    }
}

fn read_request(stream: &TcpStream) -> Recorded {
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    let mut api_key = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap(),
                "api-key" => api_key = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();
    Recorded {
        method,
        path,
        api_key,
        body: String::from_utf8(body).unwrap(),
    }
}

fn write_response(mut stream: TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
}

const TOPIC: &str = r#"{"id": 12, "post_stream": {"posts": [{"id": 120}]}}"#;
const POST: &str = r##"{"id": 120, "raw": "# Overview\n\nHello."}"##;

#[test]
fn retrieve_reads_first_post_raw() {
    let server = ScriptedServer::start(vec![(200, TOPIC), (200, POST)]);
    let client = server.client();

    let content = client
        .retrieve_topic(&format!("{}/t/overview/12", server.url))
        .unwrap();

    assert_eq!(content, "# Overview\n\nHello.");
    let requests = server.requests();
    assert_eq!(requests[0].path, "/t/12.json");
    assert_eq!(requests[1].path, "/posts/120.json");
    assert_eq!(requests[0].api_key.as_deref(), Some("secret"));
}

#[test]
fn soft_deleted_topic_is_not_found() {
    let server = ScriptedServer::start(vec![(
        200,
        r#"{"deleted_at": "2024-01-01T00:00:00Z", "post_stream": {"posts": [{"id": 1}]}}"#,
    )]);

    let err = server
        .client()
        .retrieve_topic(&format!("{}/t/gone/5", server.url))
        .unwrap_err();

    assert!(err.is_not_found(), "{err}");
}

#[test]
fn create_returns_topic_url() {
    let server = ScriptedServer::start(vec![(200, r#"{"id": 300, "topic_id": 30, "topic_slug": "install"}"#)]);
    let mut client = server.client();

    let url = client.create_topic("Install", "# Install\n").unwrap();

    assert_eq!(url, format!("{}/t/install/30", server.url));
    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/posts.json");
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["title"], "Install");
    assert_eq!(body["category"], 41);
}

#[test]
fn update_puts_raw_with_reason() {
    let server = ScriptedServer::start(vec![(200, TOPIC), (200, "{}")]);
    let mut client = server.client();

    client
        .update_topic(&format!("{}/t/overview/12", server.url), "new", "docsync")
        .unwrap();

    let request = &server.requests()[1];
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/posts/120.json");
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["post"]["raw"], "new");
    assert_eq!(body["post"]["edit_reason"], "docsync");
}

#[test]
fn delete_of_missing_topic_is_not_found() {
    let server = ScriptedServer::start(vec![(404, r#"{"errors": ["not found"]}"#)]);
    let url = format!("{}/t/overview/12", server.url);

    let err = server.client().delete_topic(&url).unwrap_err();

    assert_eq!(err, Error::NotFound { url });
}

#[test]
fn rate_limit_is_retried() {
    let server = ScriptedServer::start(vec![(429, "{}"), (502, "{}"), (200, TOPIC), (200, POST)]);

    let content = server
        .client()
        .retrieve_topic(&format!("{}/t/overview/12", server.url))
        .unwrap();

    assert_eq!(content, "# Overview\n\nHello.");
    assert_eq!(server.requests().len(), 4);
}

#[test]
fn client_errors_are_not_retried() {
    let server = ScriptedServer::start(vec![(403, r#"{"errors": ["forbidden"]}"#), (200, TOPIC)]);

    let err = server
        .client()
        .retrieve_topic(&format!("{}/t/overview/12", server.url))
        .unwrap_err();

    assert!(matches!(err, Error::Http { status: 403, .. }), "{err}");
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn create_is_not_resent_after_server_error() {
    let server = ScriptedServer::start(vec![
        (502, "{}"),
        (200, r#"{"id": 300, "topic_id": 30, "topic_slug": "install"}"#),
    ]);
    let mut client = server.client();

    let err = client.create_topic("Install", "# Install\n").unwrap_err();

    assert!(matches!(err, Error::Http { status: 502, .. }), "{err}");
    let posts = server
        .requests()
        .iter()
        .filter(|r| r.method == "POST" && r.path == "/posts.json")
        .count();
    assert_eq!(posts, 1);
}

#[test]
fn create_is_retried_when_rate_limited() {
    let server = ScriptedServer::start(vec![
        (429, "{}"),
        (200, r#"{"id": 300, "topic_id": 30, "topic_slug": "install"}"#),
    ]);
    let mut client = server.client();

    let url = client.create_topic("Install", "# Install\n").unwrap();

    assert_eq!(url, format!("{}/t/install/30", server.url));
    assert_eq!(server.requests().len(), 2);
}

//! API client tests against a loopback stub server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use medidiagnose_api::{ApiClient, ApiError, SESSION_EXPIRED_REDIRECT};
use medidiagnose_core::models::{ImageUpload, UserProfile};
use medidiagnose_core::{ClientConfig, Database, SessionContext};

/// Serve exactly one request with a canned response. Joins to the raw request text.
fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut head = String::new();
        let mut content_length = 0usize;
        let mut chunked = false;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let lower = line.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
            if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
                chunked = true;
            }
            head.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }

        let mut body = Vec::new();
        if chunked {
            loop {
                let mut size_line = String::new();
                reader.read_line(&mut size_line).unwrap();
                let size = usize::from_str_radix(size_line.trim(), 16).unwrap();
                let mut chunk = vec![0u8; size + 2];
                reader.read_exact(&mut chunk).unwrap();
                if size == 0 {
                    break;
                }
                body.extend_from_slice(&chunk[..size]);
            }
        } else {
            body.resize(content_length, 0);
            reader.read_exact(&mut body).unwrap();
        }

        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        head + &String::from_utf8_lossy(&body)
    });

    (format!("http://{}", addr), handle)
}

fn session(token: Option<&str>) -> Arc<Mutex<SessionContext>> {
    let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
    let mut ctx = SessionContext::init(db).unwrap();
    if let Some(token) = token {
        ctx.sign_in(UserProfile::with_full_name("Jane Doe"), Some(token.to_string()))
            .unwrap();
    }
    Arc::new(Mutex::new(ctx))
}

fn client(url: &str, session: Arc<Mutex<SessionContext>>) -> ApiClient {
    let config = ClientConfig {
        api_base_url: url.to_string(),
        symptom_check_url: format!("{}/symptom-check", url),
        request_timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    };
    ApiClient::new(&config, session).unwrap()
}

fn photo() -> ImageUpload {
    ImageUpload::new("arm.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

#[test]
fn test_symptom_check_sends_multipart_and_parses_lists() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"diagnosis":"Eczema","causes":["Stress"],"recommendations":"Moisturize, avoid soaps"}"#,
    );
    let api = client(&url, session(None));

    let summary = api
        .symptom_check(&photo(), &["*Itching*".to_string()], "dry *itchy* patches")
        .unwrap();

    assert_eq!(summary.diagnosis, "Eczema");
    assert_eq!(summary.causes, vec!["Stress"]);
    assert_eq!(summary.recommendations, vec!["Moisturize", "avoid soaps"]);

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /symptom-check"));
    assert!(request.contains("name=\"image\"; filename=\"arm.jpg\""));
    assert!(request.contains(r#"["Itching"]"#));
    assert!(request.contains("dry itchy patches"));
    assert!(!request.to_ascii_lowercase().contains("authorization:"));
}

#[test]
fn test_bearer_token_attached() {
    let (url, server) = serve_once("200 OK", r#"{"ok":true}"#);
    let api = client(&url, session(Some("opaque-token")));

    let body: serde_json::Value = api.get("/profile").unwrap();
    assert_eq!(body["ok"], true);

    let request = server.join().unwrap();
    assert!(request.starts_with("GET /profile"));
    assert!(request.contains("authorization: Bearer opaque-token") || request.contains("Authorization: Bearer opaque-token"));
}

#[test]
fn test_put_patch_and_delete_use_their_verbs() {
    let (url, server) = serve_once("200 OK", r#"{"saved":true}"#);
    let body: serde_json::Value = client(&url, session(None))
        .put("/profile", &serde_json::json!({"name": "Jane"}))
        .unwrap();
    assert_eq!(body["saved"], true);
    let request = server.join().unwrap();
    assert!(request.starts_with("PUT /profile"));
    assert!(request.contains(r#"{"name":"Jane"}"#));

    let (url, server) = serve_once("200 OK", r#"{"saved":true}"#);
    let _: serde_json::Value = client(&url, session(None))
        .patch("/profile", &serde_json::json!({"phone": "555"}))
        .unwrap();
    assert!(server.join().unwrap().starts_with("PATCH /profile"));

    let (url, server) = serve_once("204 No Content", "");
    client(&url, session(None)).delete("/history/42").unwrap();
    assert!(server.join().unwrap().starts_with("DELETE /history/42"));
}

#[test]
fn test_upload_sends_file_field() {
    let (url, server) = serve_once("200 OK", r#"{"id":"f1"}"#);
    let body: serde_json::Value = client(&url, session(Some("opaque-token")))
        .upload("/files", &photo())
        .unwrap();
    assert_eq!(body["id"], "f1");

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /files"));
    assert!(request.contains("name=\"file\"; filename=\"arm.jpg\""));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer opaque-token"));
}

#[test]
fn test_unauthorized_tears_down_session() {
    let (url, server) = serve_once("401 Unauthorized", r#"{"message":"expired"}"#);
    let session = session(Some("opaque-token"));
    let api = client(&url, session.clone());

    let err = api.health_check().unwrap_err();
    server.join().unwrap();

    match err {
        ApiError::Unauthorized { redirect } => assert_eq!(redirect, SESSION_EXPIRED_REDIRECT),
        other => panic!("unexpected error {:?}", other),
    }
    let session = session.lock().unwrap();
    assert!(!session.session().is_signed_in);
    assert!(session.bearer_token().is_none());
}

#[test]
fn test_error_status_uses_message_field() {
    let (url, server) = serve_once("500 Internal Server Error", r#"{"message":"model offline"}"#);
    let api = client(&url, session(None));

    let err = api
        .post::<_, serde_json::Value>("/feedback", &serde_json::json!({"rating": 5}))
        .unwrap_err();
    server.join().unwrap();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "model offline");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_malformed_json_is_decode_error() {
    let (url, server) = serve_once("200 OK", "not json");
    let api = client(&url, session(None));

    let err = api.symptom_check(&photo(), &[], "rash").unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, ApiError::Decode(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_unreachable_backend_is_transport_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let api = client(&format!("http://{}", addr), session(None));

    let err = api.health_check().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

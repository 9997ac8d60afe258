//! End-to-end route tests against mocked Google endpoints.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use gmailsend::{AppState, router};
use gmailsend_core::{Config, Credentials, Services};
use gmailsend_mime::Message;
use gmailsend_mime::encoding::decode_base64url;
use gmailsend_oauth::{Provider, Token, TokenStore};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt; // for `app.oneshot()`
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "XTESTBOUNDARYX";

struct TestApp {
    _dir: TempDir,
    server: MockServer,
    config: Config,
    app: Router,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;

        let mut config = Config {
            token_path: dir.path().join("token.json"),
            upload_dir: dir.path().join("uploads"),
            gmail_api_base: server.uri(),
            ..Config::default()
        };
        adjust(&mut config);

        let credentials = Credentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/authenticate".to_string(),
        };
        let provider = Provider::new(
            "Mock",
            format!("{}/auth", server.uri()),
            format!("{}/token", server.uri()),
        )
        .unwrap()
        .with_default_scopes(vec![gmailsend_oauth::provider::GMAIL_SEND_SCOPE.to_string()]);

        let services = Services::new(&config, &credentials, provider);
        let state = AppState::new(config.clone(), services).unwrap();
        Self {
            _dir: dir,
            server,
            config,
            app: router(state),
        }
    }

    async fn sign_in(&self) {
        TokenStore::new(&self.config.token_path)
            .save(&Token::new("ya29.token", "Bearer"))
            .await
            .unwrap();
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn get(&self, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
        self.call(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, _, body) = self.get(uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn send(&self, parts: &[FormPart<'_>]) -> (StatusCode, serde_json::Value) {
        let request = Request::post("/email/send")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart(parts)))
            .unwrap();
        let (status, _, body) = self.call(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn uploads_left(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.config.upload_dir)
            .map(|dir| dir.map(|e| e.unwrap().path()).collect())
            .unwrap_or_default()
    }

    async fn mock_gmail(&self, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    async fn sent_message(&self) -> Message {
        let requests = self.server.received_requests().await.unwrap();
        let gmail = requests
            .iter()
            .find(|r| r.url.path() == "/users/me/messages/send")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&gmail.body).unwrap();
        let raw = decode_base64url(body["raw"].as_str().unwrap()).unwrap();
        Message::parse(&String::from_utf8(raw).unwrap()).unwrap()
    }
}

enum FormPart<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            FormPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
            FormPart::File(filename, content_type, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"attachments\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn fields<'a>(to: &'a str) -> Vec<FormPart<'a>> {
    vec![
        FormPart::Text("to", to),
        FormPart::Text("subject", "Hi"),
        FormPart::Text("message", "Hello"),
    ]
}

#[tokio::test]
async fn test_auth_url() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/auth-url").await;

    assert_eq!(status, StatusCode::OK);
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with(&format!("{}/auth?", app.server.uri())));
    assert!(url.contains("access_type=offline"));
    assert!(url.contains("client_id=client"));
}

#[tokio::test]
async fn test_sign_in_flow() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.fresh",
            "token_type": "Bearer",
            "expires_in": 3599,
            "refresh_token": "1//refresh"
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let (_, body) = app.get_json("/auth-status").await;
    assert_eq!(body, serde_json::json!({ "authenticated": false }));

    let (status, headers, _) = app.get("/authenticate?code=4%2Fabc").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        headers[header::LOCATION],
        "http://localhost:5173/auth-success"
    );

    let (_, body) = app.get_json("/auth-status").await;
    assert_eq!(body, serde_json::json!({ "authenticated": true }));
}

#[tokio::test]
async fn test_authenticate_failures_redirect_to_error_page() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&app.server)
        .await;

    for uri in [
        "/authenticate?code=used",
        "/authenticate",
        "/authenticate?error=access_denied",
        "/authenticate?code=a&code=b",
    ] {
        let (status, headers, _) = app.get(uri).await;
        assert_eq!(status, StatusCode::FOUND, "{uri}");
        assert_eq!(headers[header::LOCATION], "http://localhost:5173/auth-error");
    }

    let (_, body) = app.get_json("/auth-status").await;
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_unparseable_token_still_reads_as_signed_in() {
    let app = TestApp::new().await;
    std::fs::write(&app.config.token_path, "not json").unwrap();

    let (status, body) = app.get_json("/auth-status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn test_send_with_attachments() {
    let app = TestApp::new().await;
    app.sign_in().await;
    app.mock_gmail(200, serde_json::json!({ "id": "abc123" })).await;

    let mut parts = fields("a@b.com");
    parts.push(FormPart::File("notes.txt", "text/plain", b"some notes"));
    parts.push(FormPart::File("pixel.png", "image/png", &[0x89, b'P', b'N', b'G', 0, 1]));

    let (status, body) = app.send(&parts).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "message": "Email sent successfully" }));
    assert!(app.uploads_left().is_empty());

    let message = app.sent_message().await;
    assert_eq!(message.to(), Some("a@b.com"));
    assert_eq!(message.subject(), Some("Hi"));
    assert_eq!(message.text_part().unwrap(), "Hello");
    let attachments: Vec<_> = message.attachments().collect();
    assert_eq!(attachments.len(), 2);
    assert_eq!(attachments[0].filename(), Some("notes.txt"));
    assert_eq!(attachments[1].decode_body().unwrap(), vec![0x89, b'P', b'N', b'G', 0, 1]);
}

#[tokio::test]
async fn test_send_without_attachments() {
    let app = TestApp::new().await;
    app.sign_in().await;
    app.mock_gmail(200, serde_json::json!({ "id": "x" })).await;

    let (status, _) = app.send(&fields("a@b.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.sent_message().await.attachments().count(), 0);
}

#[tokio::test]
async fn test_send_provider_error_cleans_up() {
    let app = TestApp::new().await;
    app.sign_in().await;
    app.mock_gmail(
        400,
        serde_json::json!({ "error": { "code": 400, "message": "Invalid To header" } }),
    )
    .await;

    let mut parts = fields("nobody");
    parts.push(FormPart::File("a.pdf", "application/pdf", b"%PDF-1.4"));

    let (status, body) = app.send(&parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Failed to send email: Gmail API error (400): Invalid To header"
    );
    assert!(app.uploads_left().is_empty());
}

#[tokio::test]
async fn test_send_requires_sign_in() {
    let app = TestApp::new().await;

    let mut parts = fields("a@b.com");
    parts.push(FormPart::File("a.txt", "text/plain", b"x"));

    let (status, body) = app.send(&parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Failed to send email: Not authenticated with Gmail"
    );
    assert!(app.uploads_left().is_empty());
    assert!(app.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_send_rejects_disallowed_type() {
    let app = TestApp::new().await;
    app.sign_in().await;

    let mut parts = fields("a@b.com");
    parts.push(FormPart::File("ok.txt", "text/plain", b"fine"));
    parts.push(FormPart::File("setup.exe", "application/x-msdownload", b"MZ"));

    let (status, body) = app.send(&parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "File type application/x-msdownload is not allowed"
    );
    assert!(app.uploads_left().is_empty());
    assert!(app.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_send_rejects_too_many_files() {
    let app = TestApp::with_config(|c| c.max_attachments = 2).await;
    app.sign_in().await;

    let mut parts = fields("a@b.com");
    for name in ["1.txt", "2.txt", "3.txt"] {
        parts.push(FormPart::File(name, "text/plain", b"x"));
    }

    let (status, body) = app.send(&parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "at most 2 attachments are allowed");
    assert!(app.uploads_left().is_empty());
}

#[tokio::test]
async fn test_send_rejects_oversized_file() {
    let app = TestApp::with_config(|c| c.max_attachment_bytes = 8).await;
    app.sign_in().await;

    let mut parts = fields("a@b.com");
    parts.push(FormPart::File("big.txt", "text/plain", &[b'a'; 64]));

    let (status, body) = app.send(&parts).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["message"].as_str().unwrap().contains("big.txt"));
    assert!(app.uploads_left().is_empty());
}

#[tokio::test]
async fn test_send_requires_recipient() {
    let app = TestApp::new().await;
    app.sign_in().await;

    let mut parts = fields("  ");
    parts.push(FormPart::File("a.txt", "text/plain", b"x"));

    let (status, _) = app.send(&parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.uploads_left().is_empty());
}

#[tokio::test]
async fn test_pages() {
    let app = TestApp::new().await;
    for (uri, marker) in [
        ("/", "Send Email"),
        ("/auth-success", "Authentication Successful"),
        ("/auth-error", "Authentication Failed"),
    ] {
        let (status, headers, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(
            headers[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        assert!(String::from_utf8(body).unwrap().contains(marker));
    }
}

#[tokio::test]
async fn test_cors_allows_frontend_origin() {
    let app = TestApp::new().await;
    let request = Request::get("/auth-status")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();

    let (_, headers, _) = app.call(request).await;
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

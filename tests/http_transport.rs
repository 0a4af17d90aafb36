//! The blocking HTTP transport against a mock server.

use antinex_client::{AiClient, ClientConfig, HttpTransport, Status};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

/// Mock API server plus a client pointed at it.
struct MockServerFixture {
    server: ServerGuard,
}

impl MockServerFixture {
    fn new() -> Self {
        Self {
            server: Server::new(),
        }
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::new(self.server.url(), "trex", "123321").with_verbose(false)
    }

    fn client(&self) -> AiClient {
        AiClient::new(self.config()).expect("client")
    }

    fn mock_login(&mut self) -> Mock {
        self.server
            .mock("POST", "/api-token-auth/")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"username": "trex", "password": "123321"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"abc.def.ghi"}"#)
            .create()
    }

    fn mock_json(&mut self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock(method, path)
            .match_header("authorization", "JWT abc.def.ghi")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create()
    }
}

#[test]
fn test_login_and_fetch_over_http() {
    let mut fixture = MockServerFixture::new();
    let login = fixture.mock_login();
    let job = fixture.mock_json("GET", "/ml/42", 200, r#"{"id":42,"status":"running"}"#);

    let mut client = fixture.client();
    assert!(client.retry_login().unwrap().is_success());
    let res = client.get_job_by_id(42).unwrap();

    login.assert();
    job.assert();
    assert_eq!(res.status, Status::Success);
    assert_eq!(res.data.unwrap()["status"], "running");
    assert!(client.all_jobs().contains_key("42"));
}

#[test]
fn test_post_job_over_http() {
    let mut fixture = MockServerFixture::new();
    fixture.mock_login();
    let create = fixture
        .server
        .mock("POST", "/ml/")
        .match_header("authorization", "JWT abc.def.ghi")
        .match_body(Matcher::PartialJson(json!({"label": "dnn"})))
        .with_status(201)
        .with_body(r#"{"job":{"id":1,"status":"initial"},"results":{"id":2,"status":"initial"}}"#)
        .create();

    let mut client = fixture.client();
    client.retry_login().unwrap();
    let res = client.run_job(&json!({"label": "dnn", "epochs": "5"})).unwrap();

    create.assert();
    assert!(res.is_success());
    assert!(client.all_results().contains_key("2"));
}

#[test]
fn test_error_status_carries_reason_phrase() {
    let mut fixture = MockServerFixture::new();
    fixture.mock_login();
    fixture.mock_json("GET", "/mlprepare/7", 503, "down");

    let mut client = fixture.client();
    client.retry_login().unwrap();
    let res = client.get_prepare_by_id(7).unwrap();
    assert_eq!(
        res.error,
        "failed with status_code=503 text=down reason=Service Unavailable"
    );
}

#[test]
fn test_base_url_trailing_slash() {
    let mut fixture = MockServerFixture::new();
    let login = fixture.mock_login();
    let config = fixture.config();
    let config = config.clone().with_base_url(format!("{}/", config.base_url));

    let mut client = AiClient::new(config).unwrap();
    assert!(client.retry_login().unwrap().is_success());
    login.assert();
}

#[test]
fn test_connection_refused_is_a_transport_error() {
    let config = ClientConfig::new("http://127.0.0.1:9", "trex", "123321").with_verbose(false);
    let mut client = AiClient::new(config).unwrap();
    let err = client.login().unwrap_err();
    assert!(matches!(err, antinex_client::Error::Transport(_)));
}

#[test]
fn test_empty_ca_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::default().with_ca_file(dir.path());
    let err = HttpTransport::new(&config).err().expect("empty bundle");
    assert_eq!(
        err.context().and_then(|c| c.field_path.as_deref()),
        Some("ca_file")
    );
}

#[test]
fn test_missing_client_cert_file_is_an_io_error() {
    let config = ClientConfig::default().with_client_cert("/nope/client.pem", "/nope/client.key");
    let err = HttpTransport::new(&config).err().expect("missing cert");
    assert!(matches!(err, antinex_client::Error::Io(_)));
}

#[test]
fn test_garbage_client_identity_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cert = dir.path().join("client.pem");
    let key = dir.path().join("client.key");
    std::fs::write(&cert, "not a certificate").unwrap();
    std::fs::write(&key, "not a key").unwrap();

    let config = ClientConfig::default().with_client_cert(&cert, &key);
    assert!(HttpTransport::new(&config).is_err());
}

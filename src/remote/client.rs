use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{AnalysisService, IndexRequest, JobHandle, JobStatus, QueryRequest};
use crate::errors::RemoteError;

pub const DEFAULT_BASE_URL: &str = "https://api.greptile.com/v2";

const USER_AGENT: &str = concat!("namefix/", env!("CARGO_PKG_VERSION"));

/// Credentials for the analysis service, passed explicitly to the client.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub github_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("github_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

/// HTTP client for a Greptile-style analysis API.
#[derive(Debug, Clone)]
pub struct GreptileClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl GreptileClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| RemoteError::Transport {
                operation: "client setup",
                source,
            })?;
        Ok(Self::with_http(http, base_url, credentials))
    }

    /// Use an already configured `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, base_url: &str, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.credentials.api_key))
            .header("X-Github-Token", &self.credentials.github_token)
    }

    fn status_url(&self, handle: &JobHandle) -> String {
        format!(
            "{}/repositories/{}",
            self.base_url,
            encode_path_segment(handle.as_str())
        )
    }

    /// Send a request and return the body of a 2xx response.
    async fn send(
        &self,
        operation: &'static str,
        builder: reqwest::RequestBuilder,
    ) -> Result<String, RemoteError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|source| RemoteError::Transport { operation, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| RemoteError::Transport { operation, source })?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl AnalysisService for GreptileClient {
    async fn submit_index(&self, request: &IndexRequest) -> Result<(), RemoteError> {
        let url = format!("{}/repositories", self.base_url);
        info!(
            remote = %request.remote,
            repository = %request.repository,
            branch = %request.branch,
            "Submitting repository for indexing"
        );
        let body = self
            .send("index", self.http.post(&url).json(request))
            .await?;
        debug!(%body, "Indexing request accepted");
        Ok(())
    }

    async fn index_status(&self, handle: &JobHandle) -> Result<JobStatus, RemoteError> {
        let body = self
            .send("status", self.http.get(self.status_url(handle)))
            .await?;
        let parsed: StatusResponse =
            serde_json::from_str(&body).map_err(|e| RemoteError::Decode {
                operation: "status",
                message: e.to_string(),
            })?;
        Ok(JobStatus::from_wire(&parsed.status))
    }

    async fn query(&self, request: &QueryRequest) -> Result<String, RemoteError> {
        let url = format!("{}/query", self.base_url);
        info!(session = %request.session_id, genius = request.genius, "Sending query");
        self.send("query", self.http.post(&url).json(request)).await
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set, so `:` and
/// `/` in a job handle stay inside a single path segment.
pub fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::Remote;

    fn credentials() -> Credentials {
        Credentials {
            api_key: "key".to_string(),
            github_token: "ghp_token".to_string(),
        }
    }

    #[test]
    fn test_encode_path_segment_escapes_separators() {
        assert_eq!(
            encode_path_segment("github:main:owner/repo"),
            "github%3Amain%3Aowner%2Frepo"
        );
    }

    #[test]
    fn test_encode_path_segment_keeps_unreserved() {
        assert_eq!(encode_path_segment("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode_path_segment("é"), "%C3%A9");
    }

    #[test]
    fn test_status_url() {
        let client = GreptileClient::new("https://api.example.com/v2/", credentials()).unwrap();
        let handle = JobHandle::new(Remote::Github, "owner/repo", "main");
        assert_eq!(client.base_url(), "https://api.example.com/v2");
        assert_eq!(
            client.status_url(&handle),
            "https://api.example.com/v2/repositories/github%3Amain%3Aowner%2Frepo"
        );
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("ghp_token"));
        assert!(!rendered.contains("\"key\""));
        assert!(rendered.contains("redacted"));
    }

    /// Accept one connection, answer it with `status` and `body`, and hand
    /// back the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                    let length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .map_or(0, |v| v.trim().parse::<usize>().unwrap());
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}/v2", addr), server)
    }

    fn local_client(base_url: &str) -> GreptileClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        GreptileClient::with_http(http, base_url, credentials())
    }

    fn request_body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn test_index_status_sends_headers_and_encoded_handle() {
        let (base_url, server) = serve_once("200 OK", r#"{"status": "completed"}"#).await;
        let client = local_client(&base_url);
        let handle = JobHandle::new(Remote::Github, "owner/repo", "main");

        let status = client.index_status(&handle).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(status, JobStatus::Completed);
        assert!(
            request.starts_with("GET /v2/repositories/github%3Amain%3Aowner%2Frepo HTTP/1.1")
        );
        let lowered = request.to_lowercase();
        assert!(lowered.contains("authorization: bearer key\r\n"));
        assert!(lowered.contains("x-github-token: ghp_token\r\n"));
    }

    #[tokio::test]
    async fn test_submit_index_posts_repository() {
        let (base_url, server) = serve_once("200 OK", r#"{"response": "started"}"#).await;
        let client = local_client(&base_url);
        let request = IndexRequest {
            remote: Remote::Gitlab,
            repository: "team/app".to_string(),
            branch: "dev".to_string(),
        };

        client.submit_index(&request).await.unwrap();
        let raw = server.await.unwrap();

        assert!(raw.starts_with("POST /v2/repositories HTTP/1.1"));
        assert_eq!(
            request_body(&raw),
            serde_json::json!({"remote": "gitlab", "repository": "team/app", "branch": "dev"})
        );
    }

    #[tokio::test]
    async fn test_query_posts_session_and_returns_raw_body() {
        let answer = r#"{"message": "[(\"a\", \"b\", \"c.py\")]"}"#;
        let (base_url, server) = serve_once("200 OK", answer).await;
        let client = local_client(&base_url);
        let request = QueryRequest {
            messages: vec![],
            repositories: vec![],
            genius: true,
            session_id: "session-1".to_string(),
        };

        let body = client.query(&request).await.unwrap();
        let raw = server.await.unwrap();

        assert_eq!(body, answer);
        assert!(raw.starts_with("POST /v2/query HTTP/1.1"));
        let sent = request_body(&raw);
        assert_eq!(sent["sessionId"], "session-1");
        assert_eq!(sent["genius"], true);
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let (base_url, server) = serve_once("500 Internal Server Error", "boom").await;
        let client = local_client(&base_url);
        let handle = JobHandle::new(Remote::Github, "owner/repo", "main");

        let err = client.index_status(&handle).await.unwrap_err();
        server.await.unwrap();

        match err {
            RemoteError::Status {
                operation,
                status,
                body,
            } => {
                assert_eq!(operation, "status");
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_status_response_deserialize() {
        let parsed: StatusResponse =
            serde_json::from_str(r#"{"status": "completed", "filesProcessed": 12}"#).unwrap();
        assert_eq!(JobStatus::from_wire(&parsed.status), JobStatus::Completed);
    }
}

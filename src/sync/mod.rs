//! Remote synchronization against a single JSON document in a GitHub
//! repository, via the contents API.
//!
//! Both directions move the whole document: push uploads the full local
//! collection as a Sync Document, pull replaces the local store with the
//! remote one. The contract is last-writer-wins; the captured revision
//! marker (the file sha) only lets GitHub reject a stale push, nothing
//! merges. There are no retries and no mid-flight cancellation; requests
//! time out after [`REQUEST_TIMEOUT`].

use std::env;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::entity::Card;
use crate::error::{DevnavError, Result};
use crate::transfer;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_SYNC_FILE: &str = "cards.json";
const COMMIT_MESSAGE: &str = "Update cards data";
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// Unresponsive remotes would otherwise suspend a sync forever.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote document address and credential. Collected once from the
/// environment; the core only checks for non-blank values.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: String,
    pub filename: String,
}

impl SyncConfig {
    /// Read the configuration from `DEVNAV_GITHUB_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            owner: env::var("DEVNAV_GITHUB_OWNER").unwrap_or_default(),
            repo: env::var("DEVNAV_GITHUB_REPO").unwrap_or_default(),
            branch: env::var("DEVNAV_GITHUB_BRANCH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            token: env::var("DEVNAV_GITHUB_TOKEN").unwrap_or_default(),
            filename: env::var("DEVNAV_SYNC_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SYNC_FILE.to_string()),
        }
    }

    /// Owner, repo and token must be non-blank before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() || self.repo.trim().is_empty() || self.token.trim().is_empty()
        {
            return Err(DevnavError::Config(
                "sync requires DEVNAV_GITHUB_OWNER, DEVNAV_GITHUB_REPO and DEVNAV_GITHUB_TOKEN"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
}

/// Client for the remote document API.
pub struct GithubSync {
    config: SyncConfig,
    api_base: String,
    client: reqwest::blocking::Client,
}

impl GithubSync {
    pub fn new(config: SyncConfig) -> Result<Self> {
        Self::with_api_base(config, DEFAULT_API_BASE.to_string())
    }

    /// Point the client at a different API host (used by tests).
    pub fn with_api_base(config: SyncConfig, api_base: String) -> Result<Self> {
        config.validate()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            // GitHub rejects requests without a User-Agent
            .user_agent(concat!("devnav/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            config,
            api_base,
            client,
        })
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.config.owner, self.config.repo, self.config.filename
        )
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.config.token)
    }

    /// Fetch the remote document's current revision marker. Best effort:
    /// not-found means first-time creation, and any other failure is
    /// logged and treated the same, so push stays optimistic.
    fn fetch_sha(&self) -> Option<String> {
        let response = self
            .client
            .get(self.contents_url())
            .query(&[("ref", self.config.branch.as_str())])
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .send();

        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<ContentsResponse>() {
                Ok(file) => Some(file.sha),
                Err(e) => {
                    tracing::warn!("could not parse remote document metadata: {}", e);
                    None
                }
            },
            Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => {
                tracing::debug!("no remote document yet, will create it");
                None
            }
            Ok(resp) => {
                tracing::warn!("revision check failed with status {}", resp.status());
                None
            }
            Err(e) => {
                tracing::warn!("revision check failed: {}", e);
                None
            }
        }
    }

    /// Upload the full local collection, replacing the remote document in
    /// its entirety.
    pub fn push(&self, cards: &[Card]) -> Result<()> {
        tracing::info!(
            "pushing {} cards to {}/{}@{}",
            cards.len(),
            self.config.owner,
            self.config.repo,
            self.config.branch
        );

        let sha = self.fetch_sha();

        let payload = transfer::to_json(&transfer::export_document(cards))?;
        let content = STANDARD.encode(payload.as_bytes());
        let body = build_push_body(&content, &self.config.branch, sha.as_deref());

        let resp = self
            .client
            .put(self.contents_url())
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .json(&body)
            .send()?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(DevnavError::Sync(format!(
                "push rejected with status {}: {}",
                status,
                remote_reason(resp)
            )));
        }

        tracing::info!("push complete");
        Ok(())
    }

    /// Fetch and decode the remote document. The caller replaces local
    /// state only after this returns, so a failed fetch or parse leaves
    /// the store untouched.
    pub fn pull(&self) -> Result<Vec<Card>> {
        tracing::info!(
            "pulling cards from {}/{}@{}",
            self.config.owner,
            self.config.repo,
            self.config.branch
        );

        let resp = self
            .client
            .get(self.contents_url())
            .query(&[("ref", self.config.branch.as_str())])
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .send()?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DevnavError::Sync(
                "remote document not found; push first".to_string(),
            ));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(DevnavError::Sync(format!(
                "pull failed with status {}: {}",
                status,
                remote_reason(resp)
            )));
        }

        let file: ContentsResponse = resp.json()?;
        let raw = decode_content(&file.content)?;
        let doc = transfer::parse_document(&raw)?;

        tracing::info!("pulled {} cards (remote revision {})", doc.cards.len(), file.sha);
        Ok(doc.cards)
    }
}

fn build_push_body(content: &str, branch: &str, sha: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "message": COMMIT_MESSAGE,
        "content": content,
        "branch": branch,
    });
    if let Some(sha) = sha {
        body["sha"] = serde_json::Value::String(sha.to_string());
    }
    body
}

/// The contents API wraps base64 payloads across lines.
fn decode_content(content: &str) -> Result<String> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned)
        .map_err(|e| DevnavError::Format(format!("invalid base64 payload: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| DevnavError::Format(format!("payload is not UTF-8: {}", e)))
}

fn remote_reason(resp: reqwest::blocking::Response) -> String {
    resp.json::<serde_json::Value>()
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| "no error message".to_string())
}

#[cfg(test)]
mod tests {
    use std::io::{Read as _, Write as _};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use tempfile::TempDir;

    use super::*;
    use crate::entity::CardDraft;
    use crate::storage::CardStore;

    fn config() -> SyncConfig {
        SyncConfig {
            owner: "octocat".to_string(),
            repo: "bookmarks".to_string(),
            branch: "main".to_string(),
            token: "ghp_secret".to_string(),
            filename: "cards.json".to_string(),
        }
    }

    /// Serve one canned HTTP response per expected request on a loopback
    /// port, then hand back the raw requests for inspection.
    fn canned_server(responses: Vec<(&'static str, String)>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for (status_line, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                requests.push(read_request(&mut stream));
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
            requests
        });
        (base, handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:").map(str::to_string))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn contents_body(sha: &str, raw: &[u8]) -> String {
        serde_json::json!({ "sha": sha, "content": STANDARD.encode(raw) }).to_string()
    }

    #[test]
    fn test_validate_requires_owner_repo_token() {
        assert!(config().validate().is_ok());

        for blank in ["owner", "repo", "token"] {
            let mut cfg = config();
            match blank {
                "owner" => cfg.owner = "  ".to_string(),
                "repo" => cfg.repo = String::new(),
                _ => cfg.token = String::new(),
            }
            assert!(matches!(cfg.validate(), Err(DevnavError::Config(_))));
        }
    }

    #[test]
    fn test_new_rejects_blank_config_before_any_io() {
        let mut cfg = config();
        cfg.token = String::new();
        assert!(matches!(
            GithubSync::new(cfg),
            Err(DevnavError::Config(_))
        ));
    }

    #[test]
    fn test_contents_url_shape() {
        let sync = GithubSync::new(config()).unwrap();
        assert_eq!(
            sync.contents_url(),
            "https://api.github.com/repos/octocat/bookmarks/contents/cards.json"
        );
    }

    #[test]
    fn test_push_body_includes_sha_only_when_present() {
        let body = build_push_body("Zm9v", "main", None);
        assert_eq!(body["message"], "Update cards data");
        assert_eq!(body["branch"], "main");
        assert!(body.get("sha").is_none());

        let body = build_push_body("Zm9v", "main", Some("abc123"));
        assert_eq!(body["sha"], "abc123");
    }

    #[test]
    fn test_decode_content_handles_line_wrapping() {
        let payload = transfer::to_json(&transfer::export_document(&[Card::from_draft(
            CardDraft {
                title: Some("MDN".to_string()),
                ..Default::default()
            },
        )]))
        .unwrap();

        // GitHub returns base64 broken into 60-char lines
        let encoded = STANDARD.encode(payload.as_bytes());
        let wrapped: String = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");

        let decoded = decode_content(&wrapped).unwrap();
        let doc = transfer::parse_document(&decoded).unwrap();
        assert_eq!(doc.cards[0].title, "MDN");
    }

    #[test]
    fn test_decode_content_rejects_garbage() {
        assert!(matches!(
            decode_content("!!not base64!!"),
            Err(DevnavError::Format(_))
        ));
    }

    #[test]
    fn test_pull_missing_remote_is_sync_error() {
        let (base, server) = canned_server(vec![(
            "404 Not Found",
            r#"{"message":"Not Found"}"#.to_string(),
        )]);
        let sync = GithubSync::with_api_base(config(), base).unwrap();

        let err = sync.pull().unwrap_err();
        assert!(matches!(err, DevnavError::Sync(_)));
        assert!(err.to_string().contains("push first"));
        server.join().unwrap();
    }

    #[test]
    fn test_pull_failure_status_reports_remote_reason() {
        let (base, server) = canned_server(vec![(
            "401 Unauthorized",
            r#"{"message":"Bad credentials"}"#.to_string(),
        )]);
        let sync = GithubSync::with_api_base(config(), base).unwrap();

        let err = sync.pull().unwrap_err();
        match err {
            DevnavError::Sync(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("Bad credentials"));
            }
            other => panic!("expected sync error, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_pull_bad_payload_leaves_store_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = CardStore::init(tmp.path()).unwrap();
        let local = store
            .create(CardDraft {
                title: Some("Local".to_string()),
                ..Default::default()
            })
            .unwrap();

        // Valid base64, but the document inside has no cards field
        let (base, server) =
            canned_server(vec![("200 OK", contents_body("abc123", br#"{"version":"1.0"}"#))]);
        let sync = GithubSync::with_api_base(config(), base).unwrap();

        assert!(matches!(sync.pull(), Err(DevnavError::Format(_))));
        server.join().unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, local.id);
        assert_eq!(all[0].title, "Local");
    }

    #[test]
    fn test_pull_decodes_remote_document() {
        let remote = Card::from_draft(CardDraft {
            title: Some("Remote".to_string()),
            ..Default::default()
        });
        let payload = transfer::to_json(&transfer::export_document(std::slice::from_ref(&remote)))
            .unwrap();

        let (base, server) =
            canned_server(vec![("200 OK", contents_body("abc123", payload.as_bytes()))]);
        let sync = GithubSync::with_api_base(config(), base).unwrap();

        let cards = sync.pull().unwrap();
        server.join().unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, remote.id);
        assert_eq!(cards[0].title, "Remote");
    }

    #[test]
    fn test_push_first_upload_omits_sha() {
        let (base, server) = canned_server(vec![
            ("404 Not Found", r#"{"message":"Not Found"}"#.to_string()),
            ("201 Created", r#"{"content":{}}"#.to_string()),
        ]);
        let sync = GithubSync::with_api_base(config(), base).unwrap();

        sync.push(&[Card::from_draft(CardDraft {
            title: Some("MDN".to_string()),
            ..Default::default()
        })])
        .unwrap();

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("GET "));
        assert!(requests[1].starts_with("PUT "));
        assert!(requests[1].contains("/repos/octocat/bookmarks/contents/cards.json"));
        assert!(requests[1].contains(r#""branch":"main""#));
        assert!(!requests[1].contains(r#""sha""#));
    }

    #[test]
    fn test_push_resends_captured_revision() {
        let (base, server) = canned_server(vec![
            ("200 OK", contents_body("abc123", b"")),
            ("200 OK", "{}".to_string()),
        ]);
        let sync = GithubSync::with_api_base(config(), base).unwrap();

        sync.push(&[]).unwrap();

        let requests = server.join().unwrap();
        assert!(requests[1].contains(r#""sha":"abc123""#));
    }

    #[test]
    fn test_push_rejection_is_sync_error() {
        let (base, server) = canned_server(vec![
            ("200 OK", contents_body("abc123", b"")),
            ("409 Conflict", r#"{"message":"cards.json does not match"}"#.to_string()),
        ]);
        let sync = GithubSync::with_api_base(config(), base).unwrap();

        let err = sync.push(&[]).unwrap_err();
        match err {
            DevnavError::Sync(msg) => {
                assert!(msg.contains("409"));
                assert!(msg.contains("does not match"));
            }
            other => panic!("expected sync error, got {:?}", other),
        }
        server.join().unwrap();
    }
}

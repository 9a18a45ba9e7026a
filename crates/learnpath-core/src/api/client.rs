//! HTTP client for the knowledge-map service.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::{header, Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{FetchError, KnowledgeSource};
use crate::models::KnowledgePoint;

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 500;

/// The service answers either with a bare array or wrapped in `data`.
/// Points are kept as raw JSON so each one can be checked on its own.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PointsResponse {
    Bare(Vec<serde_json::Value>),
    Wrapped { data: Vec<serde_json::Value> },
}

impl PointsResponse {
    fn into_points(self) -> Vec<serde_json::Value> {
        match self {
            PointsResponse::Bare(points) => points,
            PointsResponse::Wrapped { data } => data,
        }
    }
}

/// Client for `GET {base_url}/knowledge-points`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct KnowledgeApiClient {
    client: Client,
    base_url: Url,
}

impl KnowledgeApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid knowledge API base URL: {}", base_url))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn points_url(&self, module: &str, node_id: &str) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}/knowledge-points", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.query_pairs_mut()
            .clear()
            .append_pair("module", module)
            .append_pair("nodeId", node_id);
        url
    }

    /// Parse a response body and order points by their `order` field.
    /// Points without an order keep their relative position at the end.
    ///
    /// A body that is not a list of points (bare or under `data`) is an
    /// `InvalidResponse`. Within a valid list, a point that does not parse,
    /// such as one with an unknown `level`, is skipped with a warning so the
    /// rest of the node still loads; if every point is skipped the caller
    /// sees an empty list.
    fn parse_points(body: &str) -> Result<Vec<KnowledgePoint>, FetchError> {
        let parsed: PointsResponse = serde_json::from_str(body)
            .map_err(|e| FetchError::InvalidResponse(format!("Failed to parse knowledge points: {}", e)))?;
        let mut points: Vec<KnowledgePoint> = parsed
            .into_points()
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(point) => Some(point),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed knowledge point");
                    None
                }
            })
            .collect();
        points.sort_by_key(|p| (p.order.is_none(), p.order));
        Ok(points)
    }

    /// Fetch the knowledge points for a node, retrying on rate limits.
    pub async fn get_points(
        &self,
        module: &str,
        node_id: &str,
    ) -> Result<Vec<KnowledgePoint>, FetchError> {
        let url = self.points_url(module, node_id);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url.clone())
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let body = response.text().await?;
                let points = Self::parse_points(&body)?;
                if points.is_empty() {
                    return Err(FetchError::NotFound(format!("{}/{}", module, node_id)));
                }
                debug!(module = module, node_id = node_id, count = points.len(), "Fetched knowledge points");
                return Ok(points);
            }

            if status.as_u16() != 429 {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::from_status(status, &body));
            }

            // Rate limited
            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(FetchError::RateLimited);
            }
            warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2; // Exponential backoff
        }
    }
}

impl KnowledgeSource for KnowledgeApiClient {
    fn fetch_knowledge_points<'a>(
        &'a self,
        module: &'a str,
        node_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<KnowledgePoint>, FetchError>> {
        Box::pin(self.get_points(module, node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::models::Level;

    const POINTS_BODY: &str = r#"[{"id":"kp1","name":"Variables","level":"easy","order":1}]"#;

    /// Read one request head and return it.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.expect("read request");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&request).into_owned()
    }

    /// Local HTTP server answering each connection with the next canned
    /// `(status, body)`. Returns the API base URL, the number of requests
    /// served, and the last request line.
    async fn serve(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, Arc<AtomicUsize>, Arc<std::sync::Mutex<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let last_request = Arc::new(std::sync::Mutex::new(String::new()));

        let (served, seen) = (hits.clone(), last_request.clone());
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.expect("accept");
                let request = read_request(&mut socket).await;
                *seen.lock().unwrap() = request.lines().next().unwrap_or_default().to_string();
                served.fetch_add(1, Ordering::SeqCst);

                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown");
                let reply = format!(
                    "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.expect("write response");
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/api", addr), hits, last_request)
    }

    fn client(base: &str) -> KnowledgeApiClient {
        KnowledgeApiClient::new(base, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .expect("Failed to build test client")
    }

    #[test]
    fn test_points_url() {
        let url = client("https://learn.example.com/api").points_url("html-css", "12");
        assert_eq!(
            url.as_str(),
            "https://learn.example.com/api/knowledge-points?module=html-css&nodeId=12"
        );

        let url = client("https://learn.example.com/api/").points_url("c++", "1");
        assert_eq!(
            url.as_str(),
            "https://learn.example.com/api/knowledge-points?module=c%2B%2B&nodeId=1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(KnowledgeApiClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_parse_wrapped_response_sorted_by_order() {
        let body = r#"{"data":[
            {"id":"kp3","name":"Closures","level":"hard","description":"","order":3},
            {"id":"kpx","name":"Extra","level":"easy","description":""},
            {"id":"kp1","name":"Variables","level":"easy","description":"","order":1}
        ]}"#;

        let points = KnowledgeApiClient::parse_points(body).expect("parse");
        let ids: Vec<&str> = points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["kp1", "kp3", "kpx"]);
        assert_eq!(points[1].level, Level::Hard);
    }

    #[test]
    fn test_parse_bare_response() {
        let body = r#"[{"id":"hc1","name":"Box model","level":"easy","description":"","accuracy":72}]"#;
        let points = KnowledgeApiClient::parse_points(body).expect("parse");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].accuracy, Some(72));
    }

    #[test]
    fn test_parse_garbage_is_invalid_response() {
        let err = KnowledgeApiClient::parse_points("<html>").unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));

        let err = KnowledgeApiClient::parse_points(r#"{"data":{"id":"kp1"}}"#).unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_skips_malformed_points() {
        let body = r#"{"data":[
            {"id":"kp2","name":"Types","level":"expert","order":2},
            {"id":"kp1","name":"Variables","level":"easy","order":1,"accuracy":72.6},
            {"name":"No id","level":"easy"}
        ]}"#;

        let points = KnowledgeApiClient::parse_points(body).expect("parse");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, "kp1");
        assert_eq!(points[0].accuracy, Some(73));
    }

    #[tokio::test]
    async fn test_get_points_success() {
        let (base, hits, last_request) = serve(vec![(200, POINTS_BODY)]).await;

        let points = client(&base).get_points("javascript", "3").await.expect("fetch");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, "kp1");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            *last_request.lock().unwrap(),
            "GET /api/knowledge-points?module=javascript&nodeId=3 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_get_points_retries_after_rate_limit() {
        let (base, hits, _) = serve(vec![(429, ""), (200, POINTS_BODY)]).await;

        let points = client(&base).get_points("javascript", "3").await.expect("fetch");
        assert_eq!(points[0].id, "kp1");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_points_empty_result_is_not_found() {
        let (base, _, _) = serve(vec![(200, "[]")]).await;

        let err = client(&base).get_points("javascript", "3").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(ref what) if what == "javascript/3"));
    }

    #[tokio::test]
    async fn test_get_points_maps_error_status() {
        let (base, hits, _) = serve(vec![(503, "maintenance")]).await;

        let err = client(&base).get_points("javascript", "3").await.unwrap_err();
        assert!(matches!(err, FetchError::ServerError(ref body) if body == "maintenance"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_points_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            // Accept and never answer.
            let (_socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = KnowledgeApiClient::new(&format!("http://{}/api", addr), Duration::from_millis(100))
            .expect("Failed to build test client");
        let err = client.get_points("javascript", "3").await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {:?}", err);
    }
}

//! Minimal HTTP/1.1 framing over tokio.
//!
//! Just enough HTTP for the reference endpoints: one request per
//! connection, JSON bodies, no keep-alive. Production deployments put
//! their own gateway in front; the engine does not care about the
//! transport.

use crate::error::{ServerError, ServerResult};
use crate::handler::{
    ApiEnvelope, RequestHandler, ReviewAppealRequest, ReviewIssueRequest, ReviewRequest,
    SubmitAppealRequest,
};
use chrono::{DateTime, Utc};
use fieldsync_engine::EntityStore;
use fieldsync_model::SyncBatch;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// Accept loop: one spawned task per connection.
pub(crate) async fn serve<S: EntityStore + 'static>(
    listener: TcpListener,
    handler: Arc<RequestHandler<S>>,
) -> ServerResult<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let handler = Arc::clone(&handler);
        let timeout = handler.config().request_timeout;
        tokio::spawn(async move {
            let served = tokio::time::timeout(timeout, handle_connection(stream, handler)).await;
            match served {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(%peer, error = %e, "connection failed"),
                Err(_) => debug!(%peer, "connection timed out"),
            }
        });
    }
}

async fn handle_connection<S: EntityStore>(
    stream: TcpStream,
    handler: Arc<RequestHandler<S>>,
) -> ServerResult<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let (status, body) = if content_length > handler.config().max_body_bytes {
        error_response(413, "request body too large")
    } else {
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).await?;
        route(&handler, &method, &target, &headers, &body)
    };

    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        503 => "Service Unavailable",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    write_half.write_all(response.as_bytes()).await?;
    write_half.shutdown().await?;

    info!(%method, %target, status, "request served");
    Ok(())
}

/// Routes one parsed request into the typed handlers.
pub(crate) fn route<S: EntityStore>(
    handler: &RequestHandler<S>,
    method: &str,
    target: &str,
    headers: &HashMap<String, String>,
    body: &[u8],
) -> (u16, String) {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        ("POST", ["sync", "batch"]) => respond(worker_id(headers).and_then(|worker| {
            let batch: SyncBatch = serde_json::from_slice(body)?;
            handler.handle_batch(worker, &batch)
        })),
        ("GET", ["sync", "changes"]) => respond(worker_id(headers).and_then(|worker| {
            let since = since_param(query)?;
            handler.handle_changes(worker, since)
        })),
        ("POST", ["appeals"]) => respond(worker_id(headers).and_then(|worker| {
            let request: SubmitAppealRequest = serde_json::from_slice(body)?;
            handler.handle_appeal_submit(worker, request)
        })),
        ("POST", ["appeals", id, "review"]) => respond(path_id(id).and_then(|id| {
            let request: ReviewAppealRequest = serde_json::from_slice(body)?;
            handler.handle_appeal_review(id, request)
        })),
        ("POST", ["tasks", id, "review"]) => respond(path_id(id).and_then(|id| {
            let request: ReviewRequest = serde_json::from_slice(body)?;
            handler.handle_task_review(id, request)
        })),
        ("POST", ["attendance", id, "review"]) => respond(path_id(id).and_then(|id| {
            let request: ReviewRequest = serde_json::from_slice(body)?;
            handler.handle_attendance_review(id, request)
        })),
        ("POST", ["issues", id, "review"]) => respond(path_id(id).and_then(|id| {
            let request: ReviewIssueRequest = serde_json::from_slice(body)?;
            handler.handle_issue_review(id, request)
        })),
        _ => error_response(404, "no such endpoint"),
    }
}

fn respond<T: Serialize>(result: ServerResult<T>) -> (u16, String) {
    match result {
        Ok(data) => {
            let body = serde_json::to_string(&ApiEnvelope::ok(data))
                .unwrap_or_else(|e| fallback_error(&e.to_string()));
            (200, body)
        }
        Err(e) => error_response(e.status_code(), &e.to_string()),
    }
}

fn error_response(status: u16, message: &str) -> (u16, String) {
    let body = serde_json::to_string(&ApiEnvelope::<()>::err(message))
        .unwrap_or_else(|_| fallback_error(message));
    (status, body)
}

fn fallback_error(message: &str) -> String {
    format!("{{\"success\":false,\"error\":\"{}\"}}", message.replace('"', "'"))
}

/// Worker identity set by the fronting auth layer.
fn worker_id(headers: &HashMap<String, String>) -> ServerResult<u64> {
    headers
        .get("x-worker-id")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ServerError::InvalidRequest("missing or invalid x-worker-id header".into()))
}

fn path_id(segment: &str) -> ServerResult<u64> {
    segment
        .parse()
        .map_err(|_| ServerError::InvalidRequest(format!("invalid id: {segment}")))
}

fn since_param(query: Option<&str>) -> ServerResult<DateTime<Utc>> {
    let raw = query
        .and_then(|q| {
            q.split('&')
                .find_map(|pair| pair.strip_prefix("since="))
        })
        .ok_or_else(|| ServerError::InvalidRequest("missing since parameter".into()))?;
    let decoded = percent_decode(raw);
    DateTime::parse_from_rfc3339(&decoded)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| ServerError::InvalidRequest(format!("invalid since timestamp: {e}")))
}

/// Decodes `%XX` escapes and `+` spaces; invalid escapes pass through.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = &raw[i + 1..i + 3];
                if let Ok(value) = u8::from_str_radix(hex, 16) {
                    out.push(value);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            b'+' => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use fieldsync_engine::MemoryStore;
    use fieldsync_testkit::prelude::*;

    fn make_handler() -> RequestHandler<MemoryStore> {
        let harness = TestHarness::new();
        RequestHandler::new(ServerConfig::default(), harness.coordinator, harness.appeals)
    }

    fn worker_headers() -> HashMap<String, String> {
        HashMap::from([("x-worker-id".to_string(), "7".to_string())])
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(
            percent_decode("2026-03-01T08%3A00%3A00%2B00%3A00"),
            "2026-03-01T08:00:00+00:00"
        );
        assert_eq!(percent_decode("a+b"), "a b");
        assert_eq!(percent_decode("100%"), "100%");
    }

    #[test]
    fn batch_endpoint_round_trip() {
        let handler = make_handler();
        let upload = batch(vec![issue_report("dev1-issue-1", "Pothole")]);
        let body = serde_json::to_vec(&upload).unwrap();

        let (status, response) = route(&handler, "POST", "/sync/batch", &worker_headers(), &body);
        assert_eq!(status, 200);
        assert!(response.contains("\"success_count\":1"));
    }

    #[test]
    fn missing_worker_header_is_rejected() {
        let handler = make_handler();
        let upload = batch(vec![issue_report("dev1-issue-1", "Pothole")]);
        let body = serde_json::to_vec(&upload).unwrap();

        let (status, _) = route(&handler, "POST", "/sync/batch", &HashMap::new(), &body);
        assert_eq!(status, 400);
    }

    #[test]
    fn changes_endpoint_parses_since() {
        let handler = make_handler();
        let (status, _) = route(
            &handler,
            "GET",
            "/sync/changes?since=2026-03-01T00%3A00%3A00Z",
            &worker_headers(),
            &[],
        );
        assert_eq!(status, 200);

        let (status, _) = route(
            &handler,
            "GET",
            "/sync/changes",
            &worker_headers(),
            &[],
        );
        assert_eq!(status, 400);
    }

    #[test]
    fn unknown_route_is_404() {
        let handler = make_handler();
        let (status, _) = route(&handler, "GET", "/nope", &HashMap::new(), &[]);
        assert_eq!(status, 404);
    }

    #[test]
    fn review_of_missing_appeal_is_404() {
        let handler = make_handler();
        let body = serde_json::to_vec(&ReviewAppealRequest {
            approved: true,
            notes: None,
        })
        .unwrap();
        let (status, _) = route(&handler, "POST", "/appeals/99/review", &HashMap::new(), &body);
        assert_eq!(status, 404);
    }
}

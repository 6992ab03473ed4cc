//! HTTP layer: request building, signing, status classification.
//!
//! This is the ONLY place for status code handling. The endpoint modules only
//! state which codes they expect.

use std::io::{self, Read};
use std::sync::Arc;

use reqwest::blocking::{Body, Request};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::Endpoint;
use crate::error::{ClientError, ClientResult};
use crate::pager::Query;
use crate::signing::RequestSigner;
use crate::transport::{RawResponse, Transport};

/// Success set used when a call does not name its own.
pub(crate) const SUCCESS_CODES: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];

/// Error document returned with every non-success status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// HTTP backend shared by the endpoint groups of one client.
#[derive(Clone)]
pub(crate) struct HttpBackend {
    pub(crate) endpoint: Endpoint,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) signer: Option<RequestSigner>,
}

impl HttpBackend {
    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        self.endpoint.url(segments)
    }

    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &Query,
        expect: &[StatusCode],
    ) -> ClientResult<T> {
        let response = self.send(Method::GET, with_query(url, query), None)?;
        classify(response, expect)
    }

    pub(crate) fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        input: &B,
        expect: &[StatusCode],
    ) -> ClientResult<T> {
        let response = self.send(Method::POST, url, Some(encode_body(input)?))?;
        classify(response, expect)
    }

    pub(crate) fn post_discard<B: Serialize + ?Sized>(
        &self,
        url: Url,
        input: &B,
        expect: &[StatusCode],
    ) -> ClientResult<()> {
        let response = self.send(Method::POST, url, Some(encode_body(input)?))?;
        classify_discard(response, expect)
    }

    pub(crate) fn put_discard<B: Serialize + ?Sized>(
        &self,
        url: Url,
        input: &B,
        expect: &[StatusCode],
    ) -> ClientResult<()> {
        let response = self.send(Method::PUT, url, Some(encode_body(input)?))?;
        classify_discard(response, expect)
    }

    /// Build, sign and execute one request.
    fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> ClientResult<RawResponse> {
        let mut request = Request::new(method, url);
        if let Some(body) = body {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *request.body_mut() = Some(Body::from(body));
        }

        if let Some(signer) = &self.signer {
            signer.sign(&mut request)?;
        }

        debug!(
            method = %request.method(),
            url = %request.url(),
            signed = self.signer.is_some(),
            "sending request"
        );

        let response = self.transport.execute(request)?;
        debug!(status = response.status.as_u16(), "received response");
        Ok(response)
    }
}

fn with_query(mut url: Url, query: &Query) -> Url {
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }
    url
}

fn encode_body<B: Serialize + ?Sized>(input: &B) -> ClientResult<Vec<u8>> {
    serde_json::to_vec(input).map_err(|e| ClientError::InvalidRequest {
        message: format!("failed to serialize request body: {e}"),
    })
}

/// Decode a response into `T`, or into the error it reports.
///
/// The body is consumed on every path.
pub(crate) fn classify<T: DeserializeOwned>(
    response: RawResponse,
    expect: &[StatusCode],
) -> ClientResult<T> {
    let RawResponse { status, body } = ensure_success(response, expect)?;
    let bytes = read_body(body).map_err(|e| ClientError::BadResponseShape {
        status: status.as_u16(),
        reason: format!("failed to read output: {e}"),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::BadResponseShape {
        status: status.as_u16(),
        reason: format!("failed to load output: {e}"),
    })
}

/// Check the status and drop whatever the server sent back.
pub(crate) fn classify_discard(response: RawResponse, expect: &[StatusCode]) -> ClientResult<()> {
    let RawResponse { status, mut body } = ensure_success(response, expect)?;
    if let Err(e) = io::copy(&mut body, &mut io::sink()) {
        debug!(status = status.as_u16(), error = %e, "failed to drain response body");
    }
    Ok(())
}

fn ensure_success(response: RawResponse, expect: &[StatusCode]) -> ClientResult<RawResponse> {
    let expect = if expect.is_empty() {
        SUCCESS_CODES
    } else {
        expect
    };

    if expect.contains(&response.status) {
        return Ok(response);
    }

    let RawResponse { status, body } = response;
    Err(read_error(status, body))
}

/// Read the body to the end.
fn read_body(mut body: Box<dyn Read + Send>) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn read_error(status: StatusCode, body: Box<dyn Read + Send>) -> ClientError {
    let bytes = match read_body(body) {
        Ok(bytes) => bytes,
        Err(e) => {
            return ClientError::UnreadableErrorBody {
                status: status.as_u16(),
                reason: e.to_string(),
            }
        }
    };

    match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(ErrorBody { error }) => {
            warn!(status = status.as_u16(), message = %error, "request rejected");
            ClientError::Api {
                status: status.as_u16(),
                message: error,
            }
        }
        Err(e) => ClientError::UnreadableErrorBody {
            status: status.as_u16(),
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Created {
        id: i64,
    }

    /// Body that records how often it was read to the end.
    struct TrackedBody {
        inner: io::Cursor<Vec<u8>>,
        drained: Arc<AtomicUsize>,
    }

    impl Read for TrackedBody {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.inner.read(buf)?;
            if n == 0 {
                self.drained.fetch_add(1, Ordering::SeqCst);
            }
            Ok(n)
        }
    }

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse::from_bytes(StatusCode::from_u16(status).unwrap(), body.as_bytes().to_vec())
    }

    #[test]
    fn success_statuses_decode_into_output() {
        for status in [200, 201] {
            let created: Created = classify(response(status, r#"{"id": 42}"#), &[]).unwrap();
            assert_eq!(created, Created { id: 42 });
        }
    }

    #[test]
    fn other_statuses_become_api_errors_with_exact_message() {
        for status in [202, 204, 301, 400, 401, 404, 409, 500, 503] {
            let err = classify::<Created>(response(status, r#"{"error": "boom"}"#), &[]).unwrap_err();
            match err {
                ClientError::Api {
                    status: got,
                    message,
                } => {
                    assert_eq!(got, status);
                    assert_eq!(message, "boom");
                }
                other => panic!("unexpected error for {status}: {other:?}"),
            }
        }
    }

    #[test]
    fn explicit_expect_narrows_success_set() {
        let err = classify::<Created>(
            response(200, r#"{"error": "expected created"}"#),
            &[StatusCode::CREATED],
        )
        .unwrap_err();
        assert_eq!(err.status(), Some(200));
        assert!(matches!(err, ClientError::Api { .. }));
    }

    #[test]
    fn unreadable_error_body_is_distinct() {
        let err = classify::<Created>(response(502, "<html>bad gateway</html>"), &[]).unwrap_err();
        assert!(matches!(err, ClientError::UnreadableErrorBody { status: 502, .. }));
    }

    #[test]
    fn malformed_success_body_is_bad_shape() {
        let err = classify::<Created>(response(200, r#"{"id": "forty-two"}"#), &[]).unwrap_err();
        assert!(matches!(err, ClientError::BadResponseShape { status: 200, .. }));

        let err = classify::<Vec<Created>>(response(200, ""), &[]).unwrap_err();
        assert!(matches!(err, ClientError::BadResponseShape { .. }));
    }

    #[test]
    fn discard_ignores_body_on_success() {
        classify_discard(response(200, "not even json"), &[StatusCode::OK]).unwrap();

        let err = classify_discard(response(404, r#"{"error": "farm not found"}"#), &[StatusCode::OK])
            .unwrap_err();
        assert_eq!(err.to_string(), "api error (status 404): farm not found");
    }

    #[test]
    fn discard_drains_body_once() {
        let drained = Arc::new(AtomicUsize::new(0));
        let body = TrackedBody {
            inner: io::Cursor::new(json!({"ok": true}).to_string().into_bytes()),
            drained: drained.clone(),
        };

        classify_discard(RawResponse::new(StatusCode::OK, body), &[]).unwrap();
        assert_eq!(drained.load(Ordering::SeqCst), 1);
    }

    fn tracked(status: u16, body: String) -> (RawResponse, Arc<AtomicUsize>) {
        let drained = Arc::new(AtomicUsize::new(0));
        let body = TrackedBody {
            inner: io::Cursor::new(body.into_bytes()),
            drained: drained.clone(),
        };
        (RawResponse::new(StatusCode::from_u16(status).unwrap(), body), drained)
    }

    #[test]
    fn failed_decodes_still_drain_body_once() {
        let padding = "x".repeat(64 * 1024);

        let (response, drained) =
            tracked(200, json!({"id": "x", "padding": padding}).to_string());
        let err = classify::<Created>(response, &[]).unwrap_err();
        assert!(matches!(err, ClientError::BadResponseShape { status: 200, .. }));
        assert_eq!(drained.load(Ordering::SeqCst), 1);

        let (response, drained) = tracked(502, format!("<html>{padding}</html>"));
        let err = classify::<Created>(response, &[]).unwrap_err();
        assert!(matches!(err, ClientError::UnreadableErrorBody { status: 502, .. }));
        assert_eq!(drained.load(Ordering::SeqCst), 1);

        let (response, drained) =
            tracked(404, json!({"error": "gone", "padding": padding}).to_string());
        let err = classify_discard(response, &[]).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));
        assert_eq!(drained.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn query_is_appended_in_order() {
        let url = Url::parse("https://explorer.grid.tf/api/v1/farms").unwrap();
        let query: Query = vec![("page", "1".into()), ("name", "free farm".into())];
        assert_eq!(
            with_query(url.clone(), &query).as_str(),
            "https://explorer.grid.tf/api/v1/farms?page=1&name=free+farm"
        );
        assert_eq!(with_query(url, &Query::new()).query(), None);
    }
}

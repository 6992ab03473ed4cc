//! HTTP request signing.
//!
//! Requests are signed with the caller's ed25519 key over a fixed header set:
//!
//! ```text
//! (created): <unix seconds>
//! date: <Date header>
//! threebot-id: <identifier>
//! ```
//!
//! The result travels in the `Authorization` header as
//! `Signature keyId="..",algorithm="ed25519",created=..,headers="..",signature=".."`.
//! The body is not covered.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use ed25519_dalek::Signer;
use reqwest::blocking::Request;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, DATE};

use crate::error::{ClientError, ClientResult};
use crate::identity::{signing_key_from_bytes, Identity};

/// Header carrying the caller identifier.
pub const THREEBOT_ID_HEADER: &str = "threebot-id";

/// Signed header names, in signing order.
pub const SIGNED_HEADERS: [&str; 3] = ["(created)", "date", THREEBOT_ID_HEADER];

/// Signature algorithm advertised in the header.
pub const ALGORITHM: &str = "ed25519";

/// IMF-fixdate, the preferred HTTP date format.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Attaches signatures to outgoing requests on behalf of an identity.
#[derive(Clone)]
pub struct RequestSigner {
    identity: Arc<dyn Identity>,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.identity.identifier())
            .finish()
    }
}

impl RequestSigner {
    pub fn new(identity: Arc<dyn Identity>) -> Self {
        Self { identity }
    }

    /// Identifier the signatures are issued for.
    pub fn key_id(&self) -> String {
        self.identity.identifier()
    }

    /// Sign a request using the current time.
    pub fn sign(&self, request: &mut Request) -> ClientResult<()> {
        self.sign_at(request, Utc::now())
    }

    /// Sign a request as if it was created at `now`.
    ///
    /// Sets `Date` (unless already present) and `Threebot-Id`, then adds the
    /// `Authorization` header. Nothing is modified if the key is unusable.
    pub fn sign_at(&self, request: &mut Request, now: DateTime<Utc>) -> ClientResult<()> {
        let key = signing_key_from_bytes(self.identity.private_key())?;
        let key_id = self.identity.identifier();

        let id_value = HeaderValue::from_str(&key_id)
            .map_err(|e| ClientError::signing(format!("invalid identifier {key_id:?}: {e}")))?;

        let date = match request.headers().get(DATE) {
            Some(value) => value
                .to_str()
                .map_err(|e| ClientError::signing(format!("unreadable date header: {e}")))?
                .to_string(),
            None => format_http_date(now),
        };

        let created = now.timestamp();
        let message = signing_string(created, &date, &key_id);
        let signature = BASE64.encode(key.sign(message.as_bytes()).to_bytes());

        let authorization = format!(
            "Signature keyId=\"{key_id}\",algorithm=\"{ALGORITHM}\",created={created},headers=\"{}\",signature=\"{signature}\"",
            SIGNED_HEADERS.join(" ")
        );
        let authorization = HeaderValue::from_str(&authorization)
            .map_err(|e| ClientError::signing(format!("invalid signature header: {e}")))?;
        let date = HeaderValue::from_str(&date)
            .map_err(|e| ClientError::signing(format!("invalid date header: {e}")))?;

        let headers = request.headers_mut();
        headers.insert(DATE, date);
        headers.insert(HeaderName::from_static(THREEBOT_ID_HEADER), id_value);
        headers.insert(AUTHORIZATION, authorization);
        Ok(())
    }
}

/// The string covered by a request signature.
pub fn signing_string(created: i64, date: &str, key_id: &str) -> String {
    format!("(created): {created}\ndate: {date}\n{THREEBOT_ID_HEADER}: {key_id}")
}

pub(crate) fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UserIdentity;
    use chrono::TimeZone;
    use ed25519_dalek::{Signature, Verifier};
    use reqwest::Method;

    struct RawKeyIdentity(Vec<u8>);

    impl Identity for RawKeyIdentity {
        fn identifier(&self) -> String {
            "13".to_string()
        }

        fn private_key(&self) -> &[u8] {
            &self.0
        }
    }

    fn request() -> Request {
        let url = url::Url::parse("https://explorer.grid.tf/api/v1/users/13").unwrap();
        Request::new(Method::GET, url)
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
    }

    fn param<'a>(header: &'a str, name: &str) -> &'a str {
        let prefix = format!("{name}=");
        header
            .trim_start_matches("Signature ")
            .split(',')
            .find_map(|part| part.strip_prefix(prefix.as_str()))
            .map(|value| value.trim_matches('"'))
            .unwrap()
    }

    #[test]
    fn http_date_is_imf_fixdate() {
        assert_eq!(format_http_date(fixed_time()), "Tue, 14 Nov 2023 22:13:20 GMT");
    }

    #[test]
    fn signing_string_covers_fixed_header_set() {
        assert_eq!(
            signing_string(1700000000, "Tue, 14 Nov 2023 22:13:20 GMT", "42"),
            "(created): 1700000000\ndate: Tue, 14 Nov 2023 22:13:20 GMT\nthreebot-id: 42"
        );
    }

    #[test]
    fn sign_sets_headers_and_verifiable_signature() {
        let identity = Arc::new(UserIdentity::from_seed(&[5u8; 32], 42).unwrap());
        let signer = RequestSigner::new(identity.clone());
        let mut request = request();

        signer.sign_at(&mut request, fixed_time()).unwrap();

        let headers = request.headers();
        assert_eq!(headers.get("threebot-id").unwrap(), "42");
        assert_eq!(headers.get(DATE).unwrap(), "Tue, 14 Nov 2023 22:13:20 GMT");

        let authorization = headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(authorization.starts_with("Signature "));
        assert_eq!(param(authorization, "keyId"), "42");
        assert_eq!(param(authorization, "algorithm"), "ed25519");
        assert_eq!(param(authorization, "created"), "1700000000");
        assert_eq!(param(authorization, "headers"), "(created) date threebot-id");

        let signature = BASE64.decode(param(authorization, "signature")).unwrap();
        let signature = Signature::from_slice(&signature).unwrap();
        let message = signing_string(1700000000, "Tue, 14 Nov 2023 22:13:20 GMT", "42");
        identity
            .verifying_key()
            .verify(message.as_bytes(), &signature)
            .expect("signature must verify");
    }

    #[test]
    fn existing_date_header_is_signed_verbatim() {
        let identity = Arc::new(UserIdentity::from_seed(&[5u8; 32], 42).unwrap());
        let signer = RequestSigner::new(identity);
        let mut request = request();
        request.headers_mut().insert(
            DATE,
            HeaderValue::from_static("Wed, 01 Jan 2020 00:00:00 GMT"),
        );

        signer.sign_at(&mut request, fixed_time()).unwrap();

        assert_eq!(
            request.headers().get(DATE).unwrap(),
            "Wed, 01 Jan 2020 00:00:00 GMT"
        );
    }

    #[test]
    fn signing_is_deterministic_for_fixed_time() {
        let identity = Arc::new(UserIdentity::from_seed(&[8u8; 32], 1).unwrap());
        let signer = RequestSigner::new(identity);

        let mut first = request();
        let mut second = request();
        signer.sign_at(&mut first, fixed_time()).unwrap();
        signer.sign_at(&mut second, fixed_time()).unwrap();

        assert_eq!(
            first.headers().get(AUTHORIZATION),
            second.headers().get(AUTHORIZATION)
        );
    }

    #[test]
    fn invalid_key_fails_without_partial_signing() {
        let signer = RequestSigner::new(Arc::new(RawKeyIdentity(vec![1, 2, 3])));
        let mut request = request();

        let err = signer.sign_at(&mut request, fixed_time()).unwrap_err();

        assert!(matches!(err, ClientError::SigningFailure { .. }));
        assert!(request.headers().is_empty());
    }
}

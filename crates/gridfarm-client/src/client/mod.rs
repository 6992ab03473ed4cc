//! Explorer client: the phonebook and directory behind one connection pool.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::sync::Arc;

use tracing::debug;

use crate::config::ClientConfig;
use crate::directory::{Directory, HttpDirectory};
use crate::error::ClientResult;
use crate::identity::Identity;
use crate::phonebook::{HttpPhonebook, Phonebook};
use crate::signing::RequestSigner;
use crate::transport::{HttpTransport, Transport};

pub(crate) mod http;

use http::HttpBackend;

/// Explorer client.
///
/// With an identity every request is signed; without one requests go out
/// unsigned. Cloning is cheap and clones share the connection pool.
#[derive(Clone)]
pub struct Client {
    phonebook: Arc<dyn Phonebook>,
    directory: Arc<dyn Directory>,
}

impl Client {
    pub fn new(config: &ClientConfig, identity: Option<Arc<dyn Identity>>) -> ClientResult<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(config, identity, Arc::new(transport))
    }

    /// Client over a caller-provided transport.
    pub fn with_transport(
        config: &ClientConfig,
        identity: Option<Arc<dyn Identity>>,
        transport: Arc<dyn Transport>,
    ) -> ClientResult<Self> {
        let endpoint = config.endpoint()?;
        debug!(
            url = %endpoint.base(),
            signed = identity.is_some(),
            "creating explorer client"
        );

        let http = HttpBackend {
            endpoint,
            transport,
            signer: identity.map(RequestSigner::new),
        };

        Ok(Self {
            phonebook: Arc::new(HttpPhonebook::new(http.clone())),
            directory: Arc::new(HttpDirectory::new(http)),
        })
    }

    /// Client over arbitrary endpoint implementations, e.g. test doubles.
    pub fn from_parts(phonebook: Arc<dyn Phonebook>, directory: Arc<dyn Directory>) -> Self {
        Self {
            phonebook,
            directory,
        }
    }

    pub fn phonebook(&self) -> &dyn Phonebook {
        self.phonebook.as_ref()
    }

    pub fn directory(&self) -> &dyn Directory {
        self.directory.as_ref()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::identity::UserIdentity;
    use crate::pager::{FarmFilter, Pager};
    use crate::transport::RawResponse;
    use crate::types::User;
    use reqwest::blocking::Request;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Records requests and answers each with the next canned response.
    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<Request>>,
        responses: Mutex<Vec<(u16, String)>>,
    }

    impl RecordingTransport {
        fn answering(responses: &[(u16, &str)]) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(
                    responses
                        .iter()
                        .rev()
                        .map(|(status, body)| (*status, body.to_string()))
                        .collect(),
                ),
            })
        }
    }

    impl Transport for RecordingTransport {
        fn execute(&self, request: Request) -> ClientResult<RawResponse> {
            self.requests.lock().unwrap().push(request);
            let (status, body) = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .expect("unexpected request");
            Ok(RawResponse::from_bytes(
                StatusCode::from_u16(status).unwrap(),
                body.into_bytes(),
            ))
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::default().with_url("http://explorer.local")
    }

    #[test]
    fn unsigned_client_sends_no_signature_headers() {
        let transport = RecordingTransport::answering(&[(200, "[]")]);
        let client = Client::with_transport(&config(), None, transport.clone()).unwrap();

        let farms = client
            .directory()
            .farm_list(&FarmFilter::default(), Pager::default())
            .unwrap();
        assert!(farms.is_empty());

        let requests = transport.requests.lock().unwrap();
        assert_eq!(
            requests[0].url().as_str(),
            "http://explorer.local/api/v1/farms?page=1&size=10"
        );
        assert!(requests[0].headers().get("authorization").is_none());
        assert!(requests[0].headers().get("threebot-id").is_none());
    }

    #[test]
    fn signed_client_signs_every_request() {
        let transport = RecordingTransport::answering(&[(200, r#"{"id": 7}"#), (200, "[]")]);
        let identity: Arc<dyn Identity> = Arc::new(UserIdentity::from_seed(&[1u8; 32], 7).unwrap());
        let client = Client::with_transport(&config(), Some(identity), transport.clone()).unwrap();

        client.phonebook().get(7).unwrap();
        assert_eq!(client.directory().farms(FarmFilter::default(), 5).count(), 0);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!(request.headers().get("threebot-id").unwrap(), "7");
            assert!(request.headers().get("date").is_some());
            let authorization = request.headers().get("authorization").unwrap();
            assert!(authorization.to_str().unwrap().starts_with("Signature keyId=\"7\""));
        }
    }

    #[test]
    fn signing_failure_stops_request() {
        struct Broken;
        impl Identity for Broken {
            fn identifier(&self) -> String {
                "1".into()
            }
            fn private_key(&self) -> &[u8] {
                &[0u8; 10]
            }
        }

        let transport = RecordingTransport::answering(&[]);
        let client = Client::with_transport(&config(), Some(Arc::new(Broken)), transport.clone())
            .unwrap();

        let err = client.phonebook().get(1).unwrap_err();
        assert!(matches!(err, ClientError::SigningFailure { .. }));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_url_is_a_config_error() {
        let err = Client::new(&ClientConfig::default().with_url("::"), None).unwrap_err();
        assert!(matches!(err, ClientError::Config { .. }));
    }

    #[test]
    fn user_create_without_id_is_bad_shape() {
        let transport = RecordingTransport::answering(&[
            (201, "{}"),
            (201, r#"{"id": 12, "name": "alice.3bot"}"#),
        ]);
        let client = Client::with_transport(&config(), None, transport).unwrap();

        let err = client.phonebook().create(&User::default()).unwrap_err();
        assert!(matches!(err, ClientError::BadResponseShape { status: 201, .. }));

        assert_eq!(client.phonebook().create(&User::default()).unwrap(), 12);
    }
}

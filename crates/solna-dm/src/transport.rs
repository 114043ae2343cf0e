#![forbid(unsafe_code)]

//! HTTPS exchange with the SOAP endpoint.

use reqwest::header::CONTENT_TYPE;
use solna_core::Error;
use solna_keys::Credential;
use std::time::{Duration, Instant};
use url::Url;

pub const CONTENT_TYPE_XML: &str = "text/xml; charset=utf-8";
pub const SOAP_ACTION_HEADER: &str = "SOAPAction";
pub const SOAP_ACTION: &str = "runTransaction";

/// Status and body exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Posts signed envelopes to one endpoint, presenting the credential as
/// the TLS client identity.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    endpoint: Url,
}

impl Transport {
    pub fn new(endpoint: Url, credential: &Credential) -> Result<Self, Error> {
        let pem = credential.tls_identity_pem()?;
        let identity = reqwest::Identity::from_pem(pem.as_bytes())
            .map_err(|e| Error::Credential(format!("unusable TLS identity: {e}")))?;
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .build()
            .map_err(|e| Error::Transport {
                message: format!("cannot build HTTP client: {e}"),
                status: None,
                body: None,
            })?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `envelope` verbatim and read the whole response within `deadline`.
    pub async fn send(&self, envelope: &[u8], deadline: Duration) -> Result<RawResponse, Error> {
        let started = Instant::now();
        let exchange = async {
            let response = self
                .http
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, CONTENT_TYPE_XML)
                .header(SOAP_ACTION_HEADER, SOAP_ACTION)
                .body(envelope.to_vec())
                .send()
                .await
                .map_err(|e| request_error(e, None, deadline))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| request_error(e, Some(status), deadline))?;
            Ok::<_, Error>(RawResponse {
                status,
                body: body.to_vec(),
            })
        };

        let raw = match tokio::time::timeout(deadline, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(endpoint = %self.endpoint, ?deadline, "request deadline expired");
                return Err(Error::Timeout(deadline));
            }
        };
        tracing::info!(
            endpoint = %self.endpoint,
            status = raw.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = raw.body.len(),
            "response received"
        );
        Ok(raw)
    }
}

fn request_error(e: reqwest::Error, status: Option<u16>, deadline: Duration) -> Error {
    if e.is_timeout() {
        return Error::Timeout(deadline);
    }
    Error::Transport {
        message: e.to_string(),
        status: status.or_else(|| e.status().map(|s| s.as_u16())),
        body: None,
    }
}

#![forbid(unsafe_code)]

//! The risk analysis client.

use crate::builder;
use crate::config::Config;
use crate::model::{RiskAnalysisRequest, RiskAnalysisResponse};
use crate::response;
use crate::transport::Transport;
use solna_core::Error;
use solna_dsig::SignedEnvelope;
use solna_keys::{Credential, CredentialStore, KeyData};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use url::Url;

/// Signs requests with one credential and sends them to one endpoint.
///
/// Cheap to clone; clones share the credential and HTTP connection pool.
/// Nothing is mutated after construction, so concurrent calls are safe.
#[derive(Debug, Clone)]
pub struct DecisionClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    merchant_id: String,
    credential: Arc<Credential>,
    transport: Transport,
    timeout: Duration,
}

impl DecisionClient {
    /// Build a client from a validated config and an RSA credential.
    pub fn new(config: Config, credential: impl Into<Arc<Credential>>) -> Result<Self, Error> {
        config.validate()?;
        let credential = credential.into();
        match credential.key() {
            Some(KeyData::Rsa {
                private: Some(_), ..
            }) => {}
            Some(KeyData::Unsupported { algorithm }) => {
                return Err(Error::Credential(format!(
                    "{algorithm} key cannot sign, RSA required"
                )));
            }
            Some(KeyData::Rsa { private: None, .. }) | None => {
                return Err(Error::Credential("credential holds no private key".into()));
            }
        }

        let endpoint = config.endpoint()?;
        let transport = Transport::new(endpoint, &credential)?;
        tracing::debug!(
            merchant_id = %config.merchant_id,
            endpoint = %transport.endpoint(),
            environment = ?config.environment,
            "decision client ready"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                merchant_id: config.merchant_id,
                credential,
                transport,
                timeout: config.timeout,
            }),
        })
    }

    /// Load the credential named by `config` from its PEM bundle or
    /// PKCS#12 container.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let store = config.credential_store()?;
        Self::from_store(config, store.as_ref())
    }

    /// Load the credential through any [`CredentialStore`].
    pub fn from_store(config: Config, store: &dyn CredentialStore) -> Result<Self, Error> {
        let credential = store.load()?;
        Self::new(config, credential)
    }

    pub fn endpoint(&self) -> &Url {
        self.inner.transport.endpoint()
    }

    pub fn merchant_id(&self) -> &str {
        &self.inner.merchant_id
    }

    /// Build and sign a request without sending it.
    pub fn sign_request(&self, request: &RiskAnalysisRequest) -> Result<SignedEnvelope, Error> {
        let document = builder::build(request, &self.inner.merchant_id)?;
        solna_dsig::sign(document, &self.inner.credential)
    }

    /// Run a risk analysis with the configured timeout as deadline.
    pub async fn analyze_risk(
        &self,
        request: &RiskAnalysisRequest,
    ) -> Result<RiskAnalysisResponse, Error> {
        self.analyze_risk_with_deadline(request, self.inner.timeout)
            .await
    }

    /// Run a risk analysis that must finish within `deadline`.
    ///
    /// Building and signing happen first; any failure there returns before
    /// a connection is opened.
    pub async fn analyze_risk_with_deadline(
        &self,
        request: &RiskAnalysisRequest,
        deadline: Duration,
    ) -> Result<RiskAnalysisResponse, Error> {
        let span = tracing::info_span!(
            "analyze_risk",
            merchant_reference_code = %request.merchant_reference_code
        );
        async {
            let signed = self.sign_request(request)?;
            let raw = self.inner.transport.send(signed.as_bytes(), deadline).await?;
            response::interpret(raw.status, raw.body)
        }
        .instrument(span)
        .await
    }
}
